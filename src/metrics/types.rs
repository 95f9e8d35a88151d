//! Metrics Types

use serde::{Deserialize, Serialize};

/// A metric value read from the registry during one push cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSample {
    pub name: String,
    pub value: i64,
}

impl MetricSample {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Registration-time description of a metric
///
/// This is also the shape of a `[[metrics]]` entry in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricDescriptor {
    pub name: String,
    #[serde(default)]
    pub initial_value: i64,
    #[serde(default)]
    pub reset_after_push: bool,
}

impl MetricDescriptor {
    /// A metric starting at zero that keeps its value across pushes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial_value: 0,
            reset_after_push: false,
        }
    }

    pub fn with_initial_value(mut self, initial_value: i64) -> Self {
        self.initial_value = initial_value;
        self
    }

    /// Reset the value to `initial_value` after every push
    pub fn reset_after_push(mut self) -> Self {
        self.reset_after_push = true;
        self
    }
}

/// Errors raised by registry registration and updates
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("metric name must not be empty")]
    EmptyName,
    #[error("metric {0} is already registered")]
    Duplicate(String),
    #[error("metric {0} is not registered")]
    Unknown(String),
}
