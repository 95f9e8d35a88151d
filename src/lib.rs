//! statspush Library
//!
//! Periodic stats pusher for InfluxDB.
//!
//! Each push cycle reads every metric of a host-owned [`MetricRegistry`],
//! encodes it as a JSON point or a line-protocol record and POSTs it to the
//! configured endpoint. A failed metric is logged and skipped; nothing is
//! buffered or retried across cycles.

pub mod config;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod pusher;
pub mod shutdown;
pub mod transport;

pub use config::{Config, ExporterConfig};
pub use encoder::{MetricEncoder, WireFormat};
pub use error::PushError;
pub use metrics::{MetricRegistry, MetricSample};
pub use pusher::{InfluxPusher, PushScheduler, PusherRegistry, StatsPusher};
pub use shutdown::ShutdownCoordinator;

/// Common error type for host-level operations
pub type Result<T> = anyhow::Result<T>;
