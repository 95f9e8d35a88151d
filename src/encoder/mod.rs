//! Wire Encoders
//! 
//! Turn one metric sample into the body of an InfluxDB write request.
//! The two wire formats are interchangeable strategies behind
//! [`MetricEncoder`], chosen per deployment through [`WireFormat`].

pub mod json;
pub mod line;

pub use json::JsonPointEncoder;
pub use line::LineProtocolEncoder;

use crate::metrics::MetricSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Supported request body formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// `[{"name":...,"columns":["value"],"points":[[N]]}]`, acknowledged with 200
    #[default]
    Json,
    /// `uwsgi[,tags] name=N <ns timestamp>`, acknowledged with 204
    LineProtocol,
}

impl WireFormat {
    /// Build the encoder for this format
    pub fn encoder(self) -> Box<dyn MetricEncoder> {
        match self {
            WireFormat::Json => Box::new(JsonPointEncoder),
            WireFormat::LineProtocol => Box::new(LineProtocolEncoder),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WireFormat::Json => "json",
            WireFormat::LineProtocol => "line_protocol",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireFormat {
    type Err = UnknownWireFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(WireFormat::Json),
            "line_protocol" | "line-protocol" | "line" => Ok(WireFormat::LineProtocol),
            _ => Err(UnknownWireFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown wire format '{0}' (expected 'json' or 'line_protocol')")]
pub struct UnknownWireFormat(pub String);

/// Failure to build the body for a single metric
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to serialize JSON point: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to format line protocol record: {0}")]
    Format(#[from] fmt::Error),
}

/// Encodes a metric sample for one wire format
pub trait MetricEncoder: Send + Sync {
    /// Encode one sample
    ///
    /// `tags` is the raw tag string from the push target (may be empty) and
    /// `now` is the wall-clock time at encode time.
    fn encode(&self, sample: &MetricSample, tags: &str, now: SystemTime) -> Result<Vec<u8>, EncodeError>;

    /// `Content-Type` header to send, if any
    fn content_type(&self) -> Option<&'static str>;

    /// The only HTTP status the destination uses to acknowledge a write
    fn success_status(&self) -> u16;

    fn wire_format(&self) -> WireFormat;

    fn is_success(&self, status: u16) -> bool {
        status == self.success_status()
    }
}

/// Whole seconds since the Unix epoch, clamped to zero for earlier times
pub fn unix_seconds(now: SystemTime) -> u64 {
    now.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
