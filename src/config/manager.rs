//! Configuration Manager

use super::Config;
use crate::encoder::WireFormat;
use crate::pusher::PushTarget;
use crate::Result;
use anyhow::{bail, Context};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config = Self::load_from_str(&content)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::warn!("Configuration file not found at {}, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Parse and validate TOML configuration text
    pub fn load_from_str(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();

        // A push target contains commas itself, so only one can come from the environment
        if let Ok(target) = std::env::var("STATSPUSH_TARGET") {
            config.push.targets = vec![target];
        }

        if let Ok(interval) = std::env::var("STATSPUSH_INTERVAL") {
            config.push.interval = humantime::parse_duration(&interval)
                .with_context(|| format!("Invalid STATSPUSH_INTERVAL: {}", interval))?;
        }

        if let Ok(timeout) = std::env::var("STATSPUSH_SOCKET_TIMEOUT") {
            config.push.socket_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid STATSPUSH_SOCKET_TIMEOUT: {}", timeout))?;
        }

        if let Ok(format) = std::env::var("STATSPUSH_WIRE_FORMAT") {
            config.push.wire_format = format
                .parse::<WireFormat>()
                .with_context(|| format!("Invalid STATSPUSH_WIRE_FORMAT: {}", format))?;
        }

        if let Ok(log_level) = std::env::var("STATSPUSH_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_push_config()
            .context("Push configuration validation failed")?;

        self.validate_logging_config()
            .context("Logging configuration validation failed")?;

        self.validate_metrics_config()
            .context("Metrics configuration validation failed")?;

        Ok(())
    }

    /// Validate push configuration
    fn validate_push_config(&self) -> Result<()> {
        if self.push.interval.is_zero() {
            bail!("push.interval must be greater than 0");
        }

        if self.push.socket_timeout.is_zero() {
            bail!("push.socket_timeout must be greater than 0");
        }

        if self.push.socket_timeout > MAX_TIMEOUT {
            bail!("push.socket_timeout cannot exceed 1 hour");
        }

        for (i, target) in self.push.targets.iter().enumerate() {
            target
                .parse::<PushTarget>()
                .with_context(|| format!("Push target {} is invalid", i))?;
        }

        Ok(())
    }

    /// Validate logging configuration
    fn validate_logging_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            bail!("logging.level must be one of: {}", valid_log_levels.join(", "));
        }

        Ok(())
    }

    /// Validate metric declarations
    fn validate_metrics_config(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (i, metric) in self.metrics.iter().enumerate() {
            if metric.name.is_empty() {
                bail!("Metric {} has empty name", i);
            }

            if !seen.insert(metric.name.as_str()) {
                bail!("Metric {} is declared more than once", metric.name);
            }
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        targets: &[String],
        interval: Option<Duration>,
        socket_timeout: Option<Duration>,
        wire_format: Option<WireFormat>,
        log_level: Option<&str>,
    ) {
        // Targets given on the command line replace the configured ones
        if !targets.is_empty() {
            self.push.targets = targets.to_vec();
            tracing::info!("CLI override: {} push target(s)", targets.len());
        }

        if let Some(interval) = interval {
            self.push.interval = interval;
            tracing::info!("CLI override: push interval set to {:?}", interval);
        }

        if let Some(timeout) = socket_timeout {
            self.push.socket_timeout = timeout;
            tracing::info!("CLI override: socket timeout set to {:?}", timeout);
        }

        if let Some(format) = wire_format {
            self.push.wire_format = format;
            tracing::info!("CLI override: wire format set to {}", format);
        }

        if let Some(level) = log_level {
            self.logging.level = level.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.push.interval, Duration::from_secs(3));
        assert_eq!(config.push.socket_timeout, Duration::from_secs(4));
        assert_eq!(config.push.wire_format, WireFormat::Json);
    }

    #[test]
    fn test_rejects_zero_durations() {
        let mut config = Config::default();
        config.push.interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.push.socket_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.push.socket_timeout = Duration::from_secs(7200);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_target_without_pusher_name() {
        let mut config = Config::default();
        config.push.targets = vec!["http://localhost:8086/write".to_string()];
        // "http" parses as a pusher name, the separator is present
        assert!(config.validate().is_ok());

        config.push.targets = vec!["no-separator-here".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_metrics() {
        let config = ConfigManager::load_from_str(
            r#"
            [[metrics]]
            name = "requests"

            [[metrics]]
            name = "requests"
            "#,
        );
        assert!(config.is_err());
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();
        config.push.targets = vec!["influxdb:http://a:8086/db/x/series".to_string()];

        config.merge_with_cli_args(
            &["influxdb:http://b:8086/write".to_string()],
            Some(Duration::from_secs(10)),
            None,
            Some(WireFormat::LineProtocol),
            Some("debug"),
        );

        assert_eq!(config.push.targets, vec!["influxdb:http://b:8086/write"]);
        assert_eq!(config.push.interval, Duration::from_secs(10));
        assert_eq!(config.push.socket_timeout, Duration::from_secs(4));
        assert_eq!(config.push.wire_format, WireFormat::LineProtocol);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_cli_targets_keep_file_targets() {
        let mut config = Config::default();
        config.push.targets = vec!["influxdb:http://a:8086/db/x/series".to_string()];

        config.merge_with_cli_args(&[], None, None, None, None);

        assert_eq!(config.push.targets.len(), 1);
    }
}
