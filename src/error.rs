//! Per-metric push failures
//!
//! Every variant is local to one metric in one cycle. None of them stops
//! the cycle or the host.

use crate::encoder::EncodeError;
use crate::transport::TransportError;

/// Why a single metric did not reach the destination
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("unable to encode metric {metric}: {source}")]
    Encode {
        metric: String,
        #[source]
        source: EncodeError,
    },

    #[error("error sending metric {metric}: {source}")]
    Transport {
        metric: String,
        #[source]
        source: TransportError,
    },

    #[error("HTTP api returned {status} for metric {metric} (expected {expected})")]
    UnexpectedStatus {
        metric: String,
        status: u16,
        expected: u16,
    },
}

impl PushError {
    /// Name of the metric that failed
    pub fn metric(&self) -> &str {
        match self {
            PushError::Encode { metric, .. }
            | PushError::Transport { metric, .. }
            | PushError::UnexpectedStatus { metric, .. } => metric,
        }
    }

    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            PushError::Encode { .. } => "encode",
            PushError::Transport { .. } => "transport",
            PushError::UnexpectedStatus { .. } => "unexpected_status",
        }
    }
}
