//! Metric Sender
//!
//! Encodes one sample, POSTs it and classifies the outcome.

use super::{PostRequest, Transport};
use crate::config::ExporterConfig;
use crate::encoder::MetricEncoder;
use crate::error::PushError;
use crate::metrics::MetricSample;
use std::time::SystemTime;

/// Encoder and transport pair used for every metric of a pusher
pub struct MetricSender {
    encoder: Box<dyn MetricEncoder>,
    transport: Box<dyn Transport>,
}

impl MetricSender {
    pub fn new(encoder: Box<dyn MetricEncoder>, transport: Box<dyn Transport>) -> Self {
        Self { encoder, transport }
    }

    pub fn encoder(&self) -> &dyn MetricEncoder {
        self.encoder.as_ref()
    }

    /// Deliver one sample with exactly one POST
    ///
    /// Only the encoder's acknowledgment status counts as success.
    pub fn send(&self, config: &ExporterConfig, sample: &MetricSample, now: SystemTime) -> Result<(), PushError> {
        let body = self
            .encoder
            .encode(sample, &config.tags, now)
            .map_err(|source| PushError::Encode {
                metric: sample.name.clone(),
                source,
            })?;

        let status = self
            .transport
            .post(&PostRequest {
                endpoint: &config.endpoint,
                body: &body,
                content_type: self.encoder.content_type(),
            })
            .map_err(|source| PushError::Transport {
                metric: sample.name.clone(),
                source,
            })?;

        if self.encoder.is_success(status) {
            Ok(())
        } else {
            Err(PushError::UnexpectedStatus {
                metric: sample.name.clone(),
                status,
                expected: self.encoder.success_status(),
            })
        }
    }
}
