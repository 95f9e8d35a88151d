//! InfluxDB Pusher
//!
//! Pushes every registry metric to InfluxDB, one POST per metric:
//!
//! ```text
//! influxdb:http://<host>:<port>/db/<dbname>/series?u=<user>&p=<pass>[,tag=value,...]
//! ```

use super::{PushContext, PushReport, StatsPusher};
use crate::config::ExporterConfig;
use crate::encoder::WireFormat;
use crate::error::PushError;
use crate::metrics::MetricRegistry;
use crate::transport::{MetricSender, Transport};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

/// Reads the registry directly and ignores the host JSON snapshot
pub struct InfluxPusher {
    name: String,
    arg: String,
    registry: Arc<MetricRegistry>,
    sender: MetricSender,
    clock: fn() -> SystemTime,
}

impl InfluxPusher {
    /// Create a pusher for the configuration string `arg`
    pub fn new(
        name: impl Into<String>,
        arg: impl Into<String>,
        registry: Arc<MetricRegistry>,
        wire_format: WireFormat,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            name: name.into(),
            arg: arg.into(),
            registry,
            sender: MetricSender::new(wire_format.encoder(), transport),
            clock: SystemTime::now,
        }
    }

    /// Replace the wall clock used to timestamp records
    pub fn with_clock(mut self, clock: fn() -> SystemTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn wire_format(&self) -> WireFormat {
        self.sender.encoder().wire_format()
    }

    fn log_failure(&self, err: &PushError) {
        match err {
            PushError::UnexpectedStatus { status, expected, .. } => {
                warn!(
                    pusher = %self.name,
                    metric = %err.metric(),
                    status,
                    expected,
                    "HTTP api returned unexpected response code"
                );
            }
            _ => {
                error!(
                    pusher = %self.name,
                    metric = %err.metric(),
                    kind = err.kind(),
                    error = %err,
                    "Failed to push metric"
                );
            }
        }
    }
}

impl StatsPusher for InfluxPusher {
    fn name(&self) -> &str {
        &self.name
    }

    fn push(&self, _ctx: &PushContext<'_>) -> PushReport {
        // Parsed every cycle; the string is owned by the host and never cached here
        let config = ExporterConfig::parse(&self.arg);
        debug!(
            pusher = %self.name,
            endpoint = %config.endpoint,
            tags = %config.tags,
            wire_format = %self.wire_format(),
            "Starting push"
        );

        let mut report = PushReport::new(self.name.as_str());
        for metric in self.registry.snapshot() {
            let outcome = self.sender.send(&config, metric.sample(), (self.clock)());
            match &outcome {
                Ok(()) => debug!(
                    metric = %metric.sample().name,
                    value = metric.sample().value,
                    "Pushed metric"
                ),
                Err(e) => self.log_failure(e),
            }

            // Reset regardless of how the send went
            metric.finish();
            report.record(outcome);
        }

        if report.is_clean() {
            debug!(pusher = %self.name, sent = report.sent, "Push complete");
        } else {
            info!(
                pusher = %self.name,
                attempted = report.attempted,
                sent = report.sent,
                failed = report.failed(),
                "Push complete with failures"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricDescriptor;
    use crate::transport::{PostRequest, TransportError};
    use std::sync::Mutex;
    use std::time::{Duration, UNIX_EPOCH};

    /// Answers with a fixed status, except for bodies containing `fail_on`
    struct ScriptedTransport {
        status: u16,
        fail_on: Option<&'static str>,
        bodies: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(status: u16, fail_on: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                status,
                fail_on,
                bodies: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for ScriptedTransport {
        fn post(&self, request: &PostRequest<'_>) -> Result<u16, TransportError> {
            let body = String::from_utf8_lossy(request.body).into_owned();
            self.bodies.lock().unwrap().push(body.clone());
            match self.fail_on {
                Some(marker) if body.contains(marker) => {
                    Err(TransportError::Connect("connection refused".to_string()))
                }
                _ => Ok(self.status),
            }
        }
    }

    fn fixed_clock() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1000)
    }

    fn registry() -> Arc<MetricRegistry> {
        let registry = Arc::new(MetricRegistry::new());
        registry
            .register(MetricDescriptor::new("first").reset_after_push())
            .unwrap();
        registry
            .register(MetricDescriptor::new("second").with_initial_value(5))
            .unwrap();
        registry
            .register(MetricDescriptor::new("third").with_initial_value(-1).reset_after_push())
            .unwrap();
        registry.set("first", 10).unwrap();
        registry.set("second", 20).unwrap();
        registry.set("third", 30).unwrap();
        registry
    }

    #[test]
    fn test_pushes_every_metric_in_order() {
        let registry = registry();
        let transport = ScriptedTransport::new(204, None);
        let pusher = InfluxPusher::new(
            "influxdb",
            "http://h:8086/write?db=x,region=us",
            registry.clone(),
            WireFormat::LineProtocol,
            Box::new(transport.clone()),
        )
        .with_clock(fixed_clock);

        let report = pusher.push(&PushContext::new(fixed_clock()));

        assert_eq!(report.pusher, "influxdb");
        assert_eq!(report.attempted, 3);
        assert_eq!(report.sent, 3);
        assert!(report.is_clean());
        assert_eq!(
            *transport.bodies.lock().unwrap(),
            vec![
                "uwsgi,region=us first=10 1000000000000",
                "uwsgi,region=us second=20 1000000000000",
                "uwsgi,region=us third=30 1000000000000",
            ]
        );
    }

    #[test]
    fn test_resets_only_flagged_metrics() {
        let registry = registry();
        let pusher = InfluxPusher::new(
            "influxdb",
            "http://h:8086/db/x/series",
            registry.clone(),
            WireFormat::Json,
            Box::new(ScriptedTransport::new(200, None)),
        );

        pusher.push(&PushContext::new(SystemTime::now()));

        assert_eq!(registry.get("first").unwrap(), 0);
        assert_eq!(registry.get("second").unwrap(), 20);
        assert_eq!(registry.get("third").unwrap(), -1);
    }

    #[test]
    fn test_resets_even_when_sends_fail() {
        let registry = registry();
        let pusher = InfluxPusher::new(
            "influxdb",
            "http://h:8086/db/x/series",
            registry.clone(),
            WireFormat::Json,
            Box::new(ScriptedTransport::new(500, None)),
        );

        let report = pusher.push(&PushContext::new(SystemTime::now()));

        assert_eq!(report.failed(), 3);
        assert_eq!(registry.get("first").unwrap(), 0);
        assert_eq!(registry.get("second").unwrap(), 20);
        assert_eq!(registry.get("third").unwrap(), -1);
    }

    #[test]
    fn test_one_transport_failure_does_not_skip_the_rest() {
        let registry = registry();
        let transport = ScriptedTransport::new(200, Some("\"second\""));
        let pusher = InfluxPusher::new(
            "influxdb",
            "http://h:8086/db/x/series",
            registry.clone(),
            WireFormat::Json,
            Box::new(transport.clone()),
        );

        let report = pusher.push(&PushContext::new(SystemTime::now()));

        assert_eq!(transport.bodies.lock().unwrap().len(), 3);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].metric(), "second");
        assert!(matches!(report.failures[0], PushError::Transport { .. }));
    }

    #[test]
    fn test_host_snapshot_is_ignored() {
        let registry = registry();
        let transport = ScriptedTransport::new(200, None);
        let pusher = InfluxPusher::new(
            "influxdb",
            "http://h:8086/db/x/series",
            registry,
            WireFormat::Json,
            Box::new(transport.clone()),
        );
        assert!(!pusher.uses_host_snapshot());

        let ctx = PushContext {
            now: SystemTime::now(),
            host_snapshot: Some(&br#"{"metrics":[]}"#[..]),
        };
        let report = pusher.push(&ctx);

        assert_eq!(report.sent, 3);
    }

    #[test]
    fn test_empty_registry() {
        let pusher = InfluxPusher::new(
            "influxdb",
            "http://h:8086/db/x/series",
            Arc::new(MetricRegistry::new()),
            WireFormat::Json,
            Box::new(ScriptedTransport::new(200, None)),
        );

        let report = pusher.push(&PushContext::new(SystemTime::now()));

        assert_eq!(report.attempted, 0);
        assert!(report.is_clean());
    }
}
