//! Discovery entry points: the declarative groups this subsystem offers.

use crate::application::groups;
use crate::domain::catalog::{MetricCatalog, MetricGroup};
use crate::domain::errors::CatalogError;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_POLL_RATE_MS: u64 = 5000;
pub const DEFAULT_METRIC_PREFIX: &str = "vmpulse.vm";

/// Options recognised by [`polling_metrics`] and [`manual_metrics`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PluginOptions {
    /// Interval for every polling group, in milliseconds
    pub poll_rate: u64,
    /// Leading segments of every metric name
    pub metric_prefix: String,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            poll_rate: DEFAULT_POLL_RATE_MS,
            metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
        }
    }
}

impl PluginOptions {
    pub fn with_poll_rate(mut self, poll_rate: u64) -> Self {
        self.poll_rate = poll_rate;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_rate)
    }

    pub fn metric_name(&self, suffix: &str) -> String {
        if self.metric_prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}.{}", self.metric_prefix, suffix)
        }
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Groups collected on every `poll_rate` tick
pub fn polling_metrics(options: &PluginOptions) -> Vec<MetricGroup> {
    vec![
        groups::internal::group(options),
        groups::memory::group(options),
    ]
}

/// Groups collected once at start-up. `poll_rate` is ignored.
pub fn manual_metrics(options: &PluginOptions) -> Vec<MetricGroup> {
    vec![
        groups::cpu_topology::group(options),
        groups::system_limits::group(options),
        groups::system_info::group(options),
        groups::scheduler_topology::group(options),
    ]
}

/// Builds the validated catalog of every group this subsystem declares
pub fn build_catalog(options: &PluginOptions) -> Result<MetricCatalog, CatalogError> {
    let mut groups = polling_metrics(options);
    groups.extend(manual_metrics(options));
    MetricCatalog::new(groups)
}
