//! Line protocol encoder

use super::{unix_seconds, EncodeError, MetricEncoder, WireFormat};
use crate::metrics::MetricSample;
use std::fmt::Write;
use std::time::SystemTime;

/// Measurement every record is written under
pub const MEASUREMENT: &str = "uwsgi";

/// Encodes a sample as one line-protocol record
///
/// `uwsgi[,<tags>] <name>=<value> <seconds>000000000`
///
/// Tags and names are written verbatim. Spaces, commas or equals signs in
/// either will corrupt the record; callers must supply safe identifiers.
/// The timestamp has second precision padded out to nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineProtocolEncoder;

impl MetricEncoder for LineProtocolEncoder {
    fn encode(&self, sample: &MetricSample, tags: &str, now: SystemTime) -> Result<Vec<u8>, EncodeError> {
        let mut record = String::with_capacity(MEASUREMENT.len() + tags.len() + sample.name.len() + 48);
        record.push_str(MEASUREMENT);
        if !tags.is_empty() {
            record.push(',');
            record.push_str(tags);
        }
        write!(
            record,
            " {}={} {}000000000",
            sample.name,
            sample.value,
            unix_seconds(now)
        )?;
        Ok(record.into_bytes())
    }

    fn content_type(&self) -> Option<&'static str> {
        None
    }

    fn success_status(&self) -> u16 {
        204
    }

    fn wire_format(&self) -> WireFormat {
        WireFormat::LineProtocol
    }
}
