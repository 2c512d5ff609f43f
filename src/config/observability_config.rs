//! Observability configuration parsing from environment variables.
//!
//! This module handles loading the periodic summary reporter settings.

use super::{Lookup, parse_bool, parse_var};
use anyhow::Result;

/// Observability environment configuration
#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 60,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            enabled: parse_bool(lookup, "OBSERVABILITY_ENABLED", true),
            interval_seconds: parse_var(lookup, "OBSERVABILITY_INTERVAL", 60)?,
        })
    }
}
