//! statspush - periodic stats pusher for InfluxDB
//!
//! Hosts a metric registry and pushes it to one or more InfluxDB endpoints
//! on a fixed interval.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use statspush::{
    config::{Config, ConfigManager},
    encoder::WireFormat,
    metrics::MetricRegistry,
    pusher::{register_self_metrics, PushScheduler, PushTarget, PusherRegistry, PusherSettings, StatsPusher},
    ShutdownCoordinator,
};

/// CLI arguments for statspush
#[derive(Parser, Debug)]
#[command(name = "statspush")]
#[command(about = "statspush - periodic stats pusher for InfluxDB")]
#[command(version)]
#[command(long_about = "
statspush - periodic stats pusher for InfluxDB

Every push interval each metric in the registry is sent to every push
target with one HTTP POST. Failed metrics are logged and dropped; nothing
is retried or buffered.

Push targets:
  influxdb:http://<host>:<port>/db/<dbname>/series?u=<user>&p=<pass>[,tag=value,...]
  influxdb-json:<same as above>     always JSON points (expects 200)
  influxdb-line:<write url>[,tags]  always line protocol (expects 204)

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  STATSPUSH_TARGET          - A single push target
  STATSPUSH_INTERVAL        - Push interval (e.g., 3s, 1m)
  STATSPUSH_SOCKET_TIMEOUT  - Connect and request timeout (e.g., 4s)
  STATSPUSH_WIRE_FORMAT     - json or line_protocol
  STATSPUSH_LOG_LEVEL       - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "statspush.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Push targets (overrides config file, repeatable)
    #[arg(long = "push", value_name = "PUSHER:ARG", help = "Push target, e.g. influxdb:http://127.0.0.1:8086/db/stats/series")]
    pub push: Vec<String>,

    /// Push interval
    #[arg(short, long, value_parser = humantime::parse_duration, help = "Push interval (e.g., 3s)")]
    pub interval: Option<Duration>,

    /// Connect and request timeout
    #[arg(long, value_parser = humantime::parse_duration, help = "Socket timeout (e.g., 4s)")]
    pub socket_timeout: Option<Duration>,

    /// Wire format for the plain `influxdb` pusher
    #[arg(long, help = "Wire format: json or line_protocol")]
    pub wire_format: Option<WireFormat>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, help = "Log level")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Run a single push cycle and exit
    #[arg(long, help = "Run a single push cycle and exit")]
    pub once: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Load configuration with priority: CLI args > config file > environment > defaults
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        ConfigManager::load_from_env()?
    };

    config.merge_with_cli_args(
        &args.push,
        args.interval,
        args.socket_timeout,
        args.wire_format,
        args.log_level.as_deref(),
    );

    // Initialize tracing
    init_tracing(&args, &config)?;

    info!("Starting statspush v{}", env!("CARGO_PKG_VERSION"));

    // Final validation after all overrides
    config
        .validate()
        .context("Final configuration validation failed")?;

    if args.validate_config {
        info!("Configuration is valid");
        info!("Configuration summary:");
        info!("  Push targets: {}", config.push.targets.len());
        for target in &config.push.targets {
            info!("    {}", target);
        }
        info!("  Push interval: {:?}", config.push.interval);
        info!("  Socket timeout: {:?}", config.push.socket_timeout);
        info!("  Wire format: {}", config.push.wire_format);
        info!("  Declared metrics: {}", config.metrics.len());
        return Ok(());
    }

    let registry = Arc::new(build_registry(&config)?);
    let pushers = build_pushers(&config, &registry)?;
    let scheduler = PushScheduler::new(pushers, Arc::clone(&registry), config.push.interval);

    if args.once {
        let reports = scheduler.run_cycle().await;
        let failed: usize = reports.iter().map(|report| report.failed()).sum();
        for report in &reports {
            info!(
                pusher = %report.pusher,
                attempted = report.attempted,
                sent = report.sent,
                failed = report.failed(),
                "Push cycle summary"
            );
        }
        if failed > 0 {
            warn!(failed, "Some metrics were not delivered");
        }
        return Ok(());
    }

    // A cycle may block for one socket timeout per metric and target
    let metric_count = u32::try_from(registry.len()).unwrap_or(u32::MAX).max(1);
    let target_count = u32::try_from(scheduler.pusher_count()).unwrap_or(u32::MAX).max(1);
    let shutdown_timeout = config
        .push
        .socket_timeout
        .saturating_mul(metric_count.saturating_mul(target_count));
    let shutdown_coordinator = ShutdownCoordinator::new(shutdown_timeout);

    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_coordinator.subscribe()));

    info!("statspush started, press Ctrl+C or send SIGTERM/SIGINT to stop");

    if let Err(e) = shutdown_coordinator.listen_for_signals().await {
        error!("Error setting up signal handlers: {}", e);
        shutdown_coordinator.trigger();
    }

    info!("Initiating graceful shutdown...");
    shutdown_coordinator
        .wait_for_task("Push scheduler", scheduler_handle)
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Register self metrics followed by the metrics declared in the config file
fn build_registry(config: &Config) -> Result<MetricRegistry> {
    let registry = MetricRegistry::new();
    register_self_metrics(&registry).context("Failed to register self metrics")?;

    for descriptor in &config.metrics {
        registry
            .register(descriptor.clone())
            .with_context(|| format!("Failed to register metric {}", descriptor.name))?;
    }

    Ok(registry)
}

fn build_pushers(config: &Config, registry: &Arc<MetricRegistry>) -> Result<Vec<Box<dyn StatsPusher>>> {
    if config.push.targets.is_empty() {
        bail!("No push targets configured (use --push, push.targets or STATSPUSH_TARGET)");
    }

    let factories = PusherRegistry::with_defaults();
    let settings = PusherSettings::from(config);

    config
        .push
        .targets
        .iter()
        .map(|raw| {
            let target = raw
                .parse::<PushTarget>()
                .with_context(|| format!("Invalid push target: {}", raw))?;
            factories
                .build(&target, &settings, Arc::clone(registry))
                .with_context(|| {
                    format!(
                        "Unable to create pusher for {} (available pushers: {})",
                        raw,
                        factories.names().join(", ")
                    )
                })
        })
        .collect()
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs, config: &Config) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
