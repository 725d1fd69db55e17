//! Push-based observability for vmpulse
//!
//! This module turns published samples into Prometheus gauges and pushes them out
//! through **outbound data only** - no HTTP server, no incoming requests:
//!
//! 1. **Structured JSON Logs**: Periodic JSON output to stdout (for Loki, Fluentd, CloudWatch)
//! 2. **Prometheus text**: The text exposition format written to stdout
//!
//! **Security**: This system only SENDS data, it never accepts requests.

pub mod metrics;
pub mod reporter;

pub use metrics::SampleExporter;
pub use reporter::{MetricsReporter, ReportFormat};
