//! Observability configuration parsing from environment variables.
//!
//! This module handles loading the reporter settings.

use crate::infrastructure::observability::ReportFormat;
use anyhow::Result;
use std::str::FromStr;

/// Observability environment configuration
#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub format: ReportFormat,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            format: ReportFormat::Json,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            enabled: lookup("OBSERVABILITY_ENABLED")
                .unwrap_or_else(|| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
            interval_secs: lookup("OBSERVABILITY_INTERVAL")
                .unwrap_or_else(|| "60".to_string())
                .parse::<u64>()
                .unwrap_or(60),
            format: ReportFormat::from_str(
                &lookup("OBSERVABILITY_FORMAT").unwrap_or_else(|| "json".to_string()),
            )?,
        })
    }
}
