//! Configuration Types

use crate::encoder::WireFormat;
use crate::metrics::MetricDescriptor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub push: PushConfig,
    pub logging: LoggingConfig,
    pub metrics: Vec<MetricDescriptor>,
}

/// Push cycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PushConfig {
    /// `<pusher>:<arg>` entries, e.g. `influxdb:http://host:8086/db/x/series,region=eu`
    pub targets: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Used as both the connect timeout and the total request timeout
    #[serde(with = "humantime_serde")]
    pub socket_timeout: Duration,
    pub wire_format: WireFormat,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            targets: vec![],
            interval: Duration::from_secs(3),
            socket_timeout: Duration::from_secs(4),
            wire_format: WireFormat::Json,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
