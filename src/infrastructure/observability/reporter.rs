//! Push-based metrics reporter for vmpulse
//!
//! Drains the sample channel into the exporter and periodically writes the
//! current values to stdout, either as a structured JSON line or as the
//! Prometheus text exposition.
//!
//! **Security**: This system only SENDS data, never accepts requests.

use crate::domain::sample::Sample;
use crate::infrastructure::observability::metrics::SampleExporter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Output format of a periodic report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Prometheus,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "prometheus" | "text" => Ok(ReportFormat::Prometheus),
            _ => anyhow::bail!(
                "Invalid OBSERVABILITY_FORMAT: {}. Must be 'json' or 'prometheus'",
                s
            ),
        }
    }
}

/// Metrics snapshot for JSON output
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub samples_applied: u64,
    pub series: BTreeMap<String, f64>,
}

pub struct MetricsReporter {
    rx: Receiver<Sample>,
    exporter: SampleExporter,
    interval: Duration,
    format: ReportFormat,
    start_time: Instant,
}

impl MetricsReporter {
    /// Create a new metrics reporter
    ///
    /// # Arguments
    /// * `rx` - Receiving end of the emitter channel
    /// * `exporter` - Gauges fed by the received samples
    /// * `interval_seconds` - How often to output metrics (default: 60)
    /// * `format` - JSON line or Prometheus text
    pub fn new(
        rx: Receiver<Sample>,
        exporter: SampleExporter,
        interval_seconds: u64,
        format: ReportFormat,
    ) -> Self {
        Self {
            rx,
            exporter,
            interval: Duration::from_secs(interval_seconds.max(1)),
            format,
            start_time: Instant::now(),
        }
    }

    /// Runs until every emitter has been dropped, then writes a final report
    pub async fn run(mut self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?}, format: {:?})",
            self.interval, self.format
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                received = self.rx.recv() => match received {
                    Some(sample) => {
                        self.exporter.apply(&sample);
                    }
                    None => {
                        info!("MetricsReporter: Sample channel closed");
                        self.report();
                        break;
                    }
                },
                _ = ticker.tick() => self.report(),
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            samples_applied: self.exporter.samples_applied(),
            series: self.exporter.snapshot(),
        }
    }

    fn report(&self) {
        match self.format {
            ReportFormat::Json => {
                let snapshot = self.snapshot();
                match serde_json::to_string(&snapshot) {
                    Ok(json) => {
                        println!("METRICS_JSON:{}", json);
                        info!(
                            "Samples: {} | Series: {} | Uptime: {}s",
                            snapshot.samples_applied,
                            snapshot.series.len(),
                            snapshot.uptime_seconds
                        );
                    }
                    Err(e) => warn!("Failed to serialize metrics: {}", e),
                }
            }
            ReportFormat::Prometheus => println!("{}", self.exporter.render()),
        }
    }
}
