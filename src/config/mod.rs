//! Configuration module for vmpulse.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Source, Poller, and Observability.

mod observability_config;
mod poller_config;

pub use observability_config::ObservabilityEnvConfig;
pub use poller_config::{DEFAULT_CHANNEL_CAPACITY, PollerEnvConfig};

use crate::application::registration::PluginOptions;
use anyhow::Result;
use std::env;
use std::str::FromStr;

/// Where runtime readings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The current process and its tokio runtime
    Host,
    /// Fixed readings, for demos and pipeline testing
    Mock,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" => Ok(SourceKind::Host),
            "mock" => Ok(SourceKind::Mock),
            _ => anyhow::bail!("Invalid VMPULSE_SOURCE: {}. Must be 'host' or 'mock'", s),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    pub poller: PollerEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let source_str = lookup("VMPULSE_SOURCE").unwrap_or_else(|| "mock".to_string());
        let source = SourceKind::from_str(&source_str)?;

        Ok(Self {
            source,
            poller: PollerEnvConfig::from_lookup(&lookup)?,
            observability: ObservabilityEnvConfig::from_lookup(&lookup)?,
        })
    }

    /// Options handed to the metric group declarations
    pub fn plugin_options(&self) -> PluginOptions {
        PluginOptions {
            poll_rate: self.poller.poll_rate_ms,
            metric_prefix: self.poller.metric_prefix.clone(),
        }
    }
}
