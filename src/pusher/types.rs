//! Pusher Types

use crate::error::PushError;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// What the host hands a pusher for one cycle
#[derive(Debug, Clone, Copy)]
pub struct PushContext<'a> {
    /// Cycle start time
    pub now: SystemTime,
    /// Generic JSON snapshot, present only when some pusher asked for it
    pub host_snapshot: Option<&'a [u8]>,
}

impl PushContext<'_> {
    pub fn new(now: SystemTime) -> Self {
        Self {
            now,
            host_snapshot: None,
        }
    }
}

/// Outcome of one push cycle for one pusher
#[derive(Debug, Default)]
pub struct PushReport {
    pub pusher: String,
    pub attempted: usize,
    pub sent: usize,
    pub failures: Vec<PushError>,
}

impl PushReport {
    pub fn new(pusher: impl Into<String>) -> Self {
        Self {
            pusher: pusher.into(),
            ..Default::default()
        }
    }

    /// Count one metric and keep its failure, if any
    pub fn record(&mut self, outcome: Result<(), PushError>) {
        self.attempted += 1;
        match outcome {
            Ok(()) => self.sent += 1,
            Err(e) => self.failures.push(e),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A `<pusher>:<arg>` push target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    pub pusher: String,
    /// Pusher-specific configuration string, passed through untouched
    pub arg: String,
}

/// Errors building a pusher from a push target
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("push target {0:?} is missing the '<pusher>:' prefix")]
    MissingSeparator(String),
    #[error("push target {0:?} has an empty pusher name")]
    EmptyPusherName(String),
    #[error("unknown pusher '{0}'")]
    UnknownPusher(String),
    #[error("pusher '{0}' is already registered")]
    DuplicatePusher(String),
}

impl FromStr for PushTarget {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pusher, arg) = s
            .split_once(':')
            .ok_or_else(|| TargetError::MissingSeparator(s.to_string()))?;

        if pusher.is_empty() {
            return Err(TargetError::EmptyPusherName(s.to_string()));
        }

        Ok(Self {
            pusher: pusher.to_string(),
            arg: arg.to_string(),
        })
    }
}

impl fmt::Display for PushTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pusher, self.arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_splits_at_first_colon() {
        let target: PushTarget = "influxdb:http://h:8086/db/x/series?u=a&p=b,region=eu"
            .parse()
            .unwrap();
        assert_eq!(target.pusher, "influxdb");
        assert_eq!(target.arg, "http://h:8086/db/x/series?u=a&p=b,region=eu");
        assert_eq!(
            target.to_string(),
            "influxdb:http://h:8086/db/x/series?u=a&p=b,region=eu"
        );
    }

    #[test]
    fn test_target_errors() {
        assert_eq!(
            "influxdb".parse::<PushTarget>(),
            Err(TargetError::MissingSeparator("influxdb".to_string()))
        );
        assert_eq!(
            ":http://h".parse::<PushTarget>(),
            Err(TargetError::EmptyPusherName(":http://h".to_string()))
        );
    }

    #[test]
    fn test_report_counts() {
        let mut report = PushReport::new("influxdb");
        report.record(Ok(()));
        report.record(Err(PushError::UnexpectedStatus {
            metric: "m".to_string(),
            status: 500,
            expected: 200,
        }));
        report.record(Ok(()));

        assert_eq!(report.attempted, 3);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());
    }
}
