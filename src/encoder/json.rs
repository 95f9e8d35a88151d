//! JSON point encoder

use super::{EncodeError, MetricEncoder, WireFormat};
use crate::metrics::MetricSample;
use serde::Serialize;
use std::time::SystemTime;

#[derive(Serialize)]
struct Point<'a> {
    name: &'a str,
    columns: [&'static str; 1],
    points: [[i64; 1]; 1],
}

/// Encodes a sample as a single-series JSON point document
///
/// Output is exactly `[{"name":"<name>","columns":["value"],"points":[[<value>]]}]`
/// with no trailing newline. The name goes through JSON string escaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPointEncoder;

impl MetricEncoder for JsonPointEncoder {
    fn encode(&self, sample: &MetricSample, _tags: &str, _now: SystemTime) -> Result<Vec<u8>, EncodeError> {
        let document = [Point {
            name: &sample.name,
            columns: ["value"],
            points: [[sample.value]],
        }];
        Ok(serde_json::to_vec(&document)?)
    }

    fn content_type(&self) -> Option<&'static str> {
        Some("application/json")
    }

    fn success_status(&self) -> u16 {
        200
    }

    fn wire_format(&self) -> WireFormat {
        WireFormat::Json
    }
}
