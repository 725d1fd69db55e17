//! vmpulse Server - Headless runtime metrics sampler
//!
//! This binary samples runtime statistics on a fixed cadence and pushes the
//! resulting measurements through the sample channel. Aggregated gauges are
//! reported via structured JSON logs (or Prometheus text) to stdout.
//!
//! # Usage
//! ```sh
//! VMPULSE_SOURCE=host OBSERVABILITY_INTERVAL=10 cargo run --bin server -- --poll-rate 1000
//! ```
//!
//! # Environment Variables
//! - `VMPULSE_SOURCE` - `host` or `mock` (default: mock)
//! - `VMPULSE_POLL_RATE` - Polling interval in milliseconds (default: 5000)
//! - `VMPULSE_METRIC_PREFIX` - Leading segments of metric names (default: vmpulse.vm)
//! - `VMPULSE_CHANNEL_CAPACITY` - Sample channel capacity (default: 1024)
//! - `OBSERVABILITY_ENABLED` - Enable metrics reporting (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between metric outputs (default: 60)
//! - `OBSERVABILITY_FORMAT` - `json` or `prometheus` (default: json)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, debug, info};
use tracing_subscriber::prelude::*;
use vmpulse::application::poller::Poller;
use vmpulse::application::registration::{self, PluginOptions};
use vmpulse::config::{Config, SourceKind};
use vmpulse::domain::ports::{Emitter, StatSource};
use vmpulse::infrastructure::observability::{MetricsReporter, SampleExporter};
use vmpulse::infrastructure::{ChannelEmitter, HostStatSource, StaticStatSource};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Samples runtime statistics and publishes them as metrics")]
struct Cli {
    /// Polling interval in milliseconds (overrides VMPULSE_POLL_RATE)
    #[arg(long)]
    poll_rate: Option<u64>,

    /// Stat source: host or mock (overrides VMPULSE_SOURCE)
    #[arg(long)]
    source: Option<String>,

    /// TOML file with plugin options (poll_rate, metric_prefix)
    #[arg(long)]
    options: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("vmpulse Server {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    if let Some(source) = cli.source.as_deref() {
        config.source = source.parse()?;
    }

    let mut options = match cli.options.as_ref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file {}", path.display()))?;
            PluginOptions::from_toml_str(&raw)?
        }
        None => config.plugin_options(),
    };
    if let Some(poll_rate) = cli.poll_rate {
        options = options.with_poll_rate(poll_rate);
    }
    if options.poll_rate == 0 {
        anyhow::bail!("poll_rate must be greater than zero");
    }
    info!(
        "Configuration loaded: Source={:?}, PollRate={}ms, Prefix={}",
        config.source, options.poll_rate, options.metric_prefix
    );

    let catalog = Arc::new(registration::build_catalog(&options)?);
    info!(
        "Catalog built: {} groups, {} metrics",
        catalog.groups().len(),
        catalog.metric_count()
    );

    let (emitter, rx) = ChannelEmitter::channel(config.poller.channel_capacity);
    let emitter: Arc<dyn Emitter> = Arc::new(emitter);

    let reporter_task = if config.observability.enabled {
        let exporter = SampleExporter::new(&catalog)?;
        let reporter = MetricsReporter::new(
            rx,
            exporter,
            config.observability.interval_secs,
            config.observability.format,
        );
        info!(
            "Metrics reporter started (interval: {}s)",
            config.observability.interval_secs
        );
        tokio::spawn(reporter.run())
    } else {
        info!("Metrics reporting disabled. Samples are logged at debug level.");
        let mut rx = rx;
        tokio::spawn(async move {
            while let Some(sample) = rx.recv().await {
                debug!(
                    "Sample {} measurements={:?} tags={:?}",
                    sample.publication_key, sample.measurements, sample.tags
                );
            }
        })
    };

    let source: Arc<dyn StatSource> = match config.source {
        SourceKind::Host => Arc::new(HostStatSource::new()),
        SourceKind::Mock => Arc::new(StaticStatSource::healthy()),
    };

    let handle = Poller::new(catalog, source, emitter).start().await;
    info!(
        "Poller running: {} polling groups, {} one-shot samples",
        handle.task_count(),
        handle.manual_samples()
    );

    info!("Server running. Press Ctrl+C to shutdown.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping poller...");

    handle.shutdown().await;
    reporter_task.await?;
    info!("Shutdown complete.");

    Ok(())
}
