//! Poller configuration parsing from environment variables.

use crate::application::registration::{DEFAULT_METRIC_PREFIX, DEFAULT_POLL_RATE_MS};
use anyhow::{Context, Result};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Poller environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerEnvConfig {
    pub poll_rate_ms: u64,
    pub metric_prefix: String,
    pub channel_capacity: usize,
}

impl Default for PollerEnvConfig {
    fn default() -> Self {
        Self {
            poll_rate_ms: DEFAULT_POLL_RATE_MS,
            metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl PollerEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let poll_rate_ms = lookup("VMPULSE_POLL_RATE")
            .unwrap_or_else(|| DEFAULT_POLL_RATE_MS.to_string())
            .parse::<u64>()
            .context("Failed to parse VMPULSE_POLL_RATE")?;
        if poll_rate_ms == 0 {
            anyhow::bail!("VMPULSE_POLL_RATE must be greater than zero");
        }

        let metric_prefix = lookup("VMPULSE_METRIC_PREFIX")
            .unwrap_or_else(|| DEFAULT_METRIC_PREFIX.to_string());

        let channel_capacity = lookup("VMPULSE_CHANNEL_CAPACITY")
            .unwrap_or_else(|| DEFAULT_CHANNEL_CAPACITY.to_string())
            .parse::<usize>()
            .context("Failed to parse VMPULSE_CHANNEL_CAPACITY")?;

        Ok(Self {
            poll_rate_ms,
            metric_prefix,
            channel_capacity,
        })
    }
}
