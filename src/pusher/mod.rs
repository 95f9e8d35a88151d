//! Pusher Module
//! 
//! Stats pushers, their registration by name, and the push scheduler.

pub mod influxdb;
pub mod registry;
pub mod scheduler;
pub mod types;

pub use influxdb::InfluxPusher;
pub use registry::{PusherFactory, PusherRegistry, PusherSettings};
pub use scheduler::{register_self_metrics, PushScheduler};
pub use types::{PushContext, PushReport, PushTarget, TargetError};

/// A destination that receives the registry contents once per cycle
///
/// Pushers that consume the generic JSON snapshot the host builds advertise
/// it through [`StatsPusher::uses_host_snapshot`]; the host only builds that
/// snapshot when at least one pusher asks for it. Pushers that read the
/// registry directly leave it off and ignore `PushContext::host_snapshot`.
pub trait StatsPusher: Send + Sync {
    /// Instance name used in logs, e.g. `influxdb`
    fn name(&self) -> &str;

    fn uses_host_snapshot(&self) -> bool {
        false
    }

    /// Run one push cycle. Never fails as a whole; per-metric failures are
    /// collected in the report.
    fn push(&self, ctx: &PushContext<'_>) -> PushReport;
}
