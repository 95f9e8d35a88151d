//! Push Scheduler
//!
//! Runs one push cycle per interval for every configured pusher. Cycles are
//! blocking work (one synchronous POST per metric), so they run on tokio's
//! blocking pool and each one is awaited before the next tick.

use super::{PushContext, PushReport, StatsPusher};
use crate::metrics::{MetricDescriptor, MetricRegistry, RegistryError};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Incremented once per cycle
pub const CYCLES_METRIC: &str = "statspush.cycles";
/// Metrics delivered, summed over all targets, since startup
pub const SENT_METRIC: &str = "statspush.sent";
/// Metrics that failed, summed over all targets, since startup
pub const FAILED_METRIC: &str = "statspush.failed";

/// Register the exporter's own counters
///
/// All three are cumulative. They are bumped once at the end of a cycle, so
/// every target of the next cycle reads the same totals.
pub fn register_self_metrics(registry: &MetricRegistry) -> Result<(), RegistryError> {
    registry.register(MetricDescriptor::new(CYCLES_METRIC))?;
    registry.register(MetricDescriptor::new(SENT_METRIC))?;
    registry.register(MetricDescriptor::new(FAILED_METRIC))?;
    Ok(())
}

/// Drives push cycles on a fixed interval
pub struct PushScheduler {
    pushers: Arc<Vec<Box<dyn StatsPusher>>>,
    registry: Arc<MetricRegistry>,
    interval: Duration,
}

impl PushScheduler {
    pub fn new(pushers: Vec<Box<dyn StatsPusher>>, registry: Arc<MetricRegistry>, interval: Duration) -> Self {
        Self {
            pushers: Arc::new(pushers),
            registry,
            interval,
        }
    }

    pub fn pusher_count(&self) -> usize {
        self.pushers.len()
    }

    /// Run a single cycle for all pushers and wait for it to finish
    pub async fn run_cycle(&self) -> Vec<PushReport> {
        let pushers = Arc::clone(&self.pushers);
        let registry = Arc::clone(&self.registry);

        match tokio::task::spawn_blocking(move || run_cycle_blocking(&pushers, &registry)).await {
            Ok(reports) => reports,
            Err(e) => {
                error!(error = %e, "Push cycle task failed");
                Vec::new()
            }
        }
    }

    /// Push on every tick until a shutdown signal arrives
    ///
    /// Shutdown is observed between cycles; a running cycle completes first.
    /// A shutdown that arrived during a cycle wins over a tick that became
    /// due meanwhile.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval = ?self.interval,
            pushers = self.pushers.len(),
            "Push scheduler started"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!("Push scheduler received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        info!("Push scheduler stopped");
    }
}

fn run_cycle_blocking(pushers: &[Box<dyn StatsPusher>], registry: &MetricRegistry) -> Vec<PushReport> {
    let started = Instant::now();
    bump(registry, CYCLES_METRIC, 1);

    let host_snapshot = if pushers.iter().any(|pusher| pusher.uses_host_snapshot()) {
        match registry.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(error = %e, "Failed to build host JSON snapshot");
                None
            }
        }
    } else {
        None
    };

    let ctx = PushContext {
        now: SystemTime::now(),
        host_snapshot: host_snapshot.as_deref(),
    };

    let mut reports = Vec::with_capacity(pushers.len());
    for pusher in pushers {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("push_cycle", pusher = %pusher.name(), cycle_id = %cycle_id);
        let _enter = span.enter();

        reports.push(pusher.push(&ctx));
    }

    // Bumped after every target has pushed, so no target sees another's counts
    let sent: usize = reports.iter().map(|report| report.sent).sum();
    let failed: usize = reports.iter().map(PushReport::failed).sum();
    bump(registry, SENT_METRIC, sent);
    bump(registry, FAILED_METRIC, failed);

    debug!(elapsed = ?started.elapsed(), sent, failed, "Push cycle finished");
    reports
}

// Self metrics are optional; a host that did not register them just skips the update
fn bump(registry: &MetricRegistry, name: &str, delta: usize) {
    if delta == 0 {
        return;
    }
    let delta = i64::try_from(delta).unwrap_or(i64::MAX);
    if let Err(e) = registry.inc(name, delta) {
        debug!(metric = name, error = %e, "Self metric not updated");
    }
}
