//! Metrics Module
//! 
//! Host-owned metric registry and the snapshot reader pushers consume.

pub mod registry;
pub mod types;

pub use registry::{MetricRegistry, SampledMetric, Snapshot};
pub use types::{MetricDescriptor, MetricSample, RegistryError};
