//! Pusher Registry
//!
//! Maps pusher names used in push targets to factories.

use super::{InfluxPusher, PushTarget, StatsPusher, TargetError};
use crate::config::Config;
use crate::encoder::WireFormat;
use crate::metrics::MetricRegistry;
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Host settings every pusher is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PusherSettings {
    pub socket_timeout: Duration,
    pub wire_format: WireFormat,
}

impl From<&Config> for PusherSettings {
    fn from(config: &Config) -> Self {
        Self {
            socket_timeout: config.push.socket_timeout,
            wire_format: config.push.wire_format,
        }
    }
}

/// Builds a pusher instance for one push target
pub type PusherFactory = fn(&PushTarget, &PusherSettings, Arc<MetricRegistry>) -> Box<dyn StatsPusher>;

/// Registered pushers, in registration order
#[derive(Default)]
pub struct PusherRegistry {
    factories: Vec<(String, PusherFactory)>,
}

impl PusherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in pushers
    ///
    /// - `influxdb`: wire format from `push.wire_format`
    /// - `influxdb-json`: always JSON points
    /// - `influxdb-line`: always line protocol
    pub fn with_defaults() -> Self {
        let builtins: [(&str, PusherFactory); 3] = [
            ("influxdb", influxdb_configured),
            ("influxdb-json", influxdb_json),
            ("influxdb-line", influxdb_line),
        ];
        Self {
            factories: builtins
                .into_iter()
                .map(|(name, factory)| (name.to_string(), factory))
                .collect(),
        }
    }

    pub fn register(&mut self, name: &str, factory: PusherFactory) -> Result<(), TargetError> {
        if self.factories.iter().any(|(existing, _)| existing == name) {
            return Err(TargetError::DuplicatePusher(name.to_string()));
        }
        self.factories.push((name.to_string(), factory));
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Instantiate the pusher named by `target`
    pub fn build(
        &self,
        target: &PushTarget,
        settings: &PusherSettings,
        registry: Arc<MetricRegistry>,
    ) -> Result<Box<dyn StatsPusher>, TargetError> {
        let factory = self
            .factories
            .iter()
            .find(|(name, _)| *name == target.pusher)
            .map(|(_, factory)| *factory)
            .ok_or_else(|| TargetError::UnknownPusher(target.pusher.clone()))?;

        let pusher = factory(target, settings, registry);
        info!(
            pusher = %target.pusher,
            socket_timeout = ?settings.socket_timeout,
            "Registered stats pusher"
        );
        Ok(pusher)
    }
}

fn influxdb_with(
    target: &PushTarget,
    settings: &PusherSettings,
    registry: Arc<MetricRegistry>,
    wire_format: WireFormat,
) -> Box<dyn StatsPusher> {
    Box::new(InfluxPusher::new(
        target.pusher.as_str(),
        target.arg.as_str(),
        registry,
        wire_format,
        Box::new(HttpTransport::new(settings.socket_timeout)),
    ))
}

fn influxdb_configured(
    target: &PushTarget,
    settings: &PusherSettings,
    registry: Arc<MetricRegistry>,
) -> Box<dyn StatsPusher> {
    influxdb_with(target, settings, registry, settings.wire_format)
}

fn influxdb_json(target: &PushTarget, settings: &PusherSettings, registry: Arc<MetricRegistry>) -> Box<dyn StatsPusher> {
    influxdb_with(target, settings, registry, WireFormat::Json)
}

fn influxdb_line(target: &PushTarget, settings: &PusherSettings, registry: Arc<MetricRegistry>) -> Box<dyn StatsPusher> {
    influxdb_with(target, settings, registry, WireFormat::LineProtocol)
}
