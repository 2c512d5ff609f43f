//! Configuration module for cyclewatch.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Refresh, Scoring, Sources, and Observability.

mod observability_config;
mod refresh_config;
mod scoring_config;
mod source_config;

pub use observability_config::ObservabilityEnvConfig;
pub use refresh_config::{DEFAULT_SNAPSHOT_PATH, RefreshEnvConfig};
pub use scoring_config::ScoringEnvConfig;
pub use source_config::{DEFAULT_FEAR_GREED_INDICATOR_ID, SourceEnvConfig};

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Variable lookup; `from_env` passes the process environment.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

pub(crate) fn parse_var<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .context(format!("Failed to parse {}", key)),
        None => Ok(default),
    }
}

pub(crate) fn parse_bool(lookup: Lookup<'_>, key: &str, default: bool) -> bool {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<bool>().ok())
        .unwrap_or(default)
}

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub refresh: RefreshEnvConfig,
    pub scoring: ScoringEnvConfig,
    pub sources: SourceEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let config = Self {
            refresh: RefreshEnvConfig::from_lookup(lookup)?,
            scoring: ScoringEnvConfig::from_lookup(lookup)?,
            sources: SourceEnvConfig::from_lookup(lookup)?,
            observability: ObservabilityEnvConfig::from_lookup(lookup)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh.refresh_interval_secs == 0 {
            anyhow::bail!("REFRESH_INTERVAL_SECS must be greater than 0");
        }
        if self.sources.call_timeout_secs == 0 {
            anyhow::bail!("SOURCE_CALL_TIMEOUT_SECS must be greater than 0");
        }
        if self.observability.enabled && self.observability.interval_seconds == 0 {
            anyhow::bail!("OBSERVABILITY_INTERVAL must be greater than 0");
        }
        if !(self.scoring.decay_window.is_finite() && self.scoring.decay_window > 1.0) {
            anyhow::bail!(
                "LOWER_IS_WORSE_DECAY_WINDOW must be greater than 1, got {}",
                self.scoring.decay_window
            );
        }
        if !self.scoring.safety_ceiling.is_finite() {
            anyhow::bail!("BANDED_SAFETY_CEILING must be finite");
        }
        if !self.scoring.to_status_bands().is_ordered() {
            anyhow::bail!(
                "Status bands must be descending: STATUS_HIGH_RISK_MIN ({}) > STATUS_MEDIUM_RISK_MIN ({}) > STATUS_LOW_MEDIUM_MIN ({})",
                self.scoring.high_risk_min,
                self.scoring.medium_risk_min,
                self.scoring.low_medium_min
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(&move |key| map.get(key).cloned())
    }

    #[test]
    fn test_config_from_env_defaults() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.refresh.refresh_interval_secs, 600);
        assert_eq!(config.refresh.staleness_threshold_secs, 1800);
        assert_eq!(config.scoring.decay_window, 2.0);
        assert_eq!(config.scoring.safety_ceiling, 70.0);
        assert!(config.sources.fear_greed_enabled);
        assert!(config.observability.enabled);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = config_with(&[("REFRESH_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("REFRESH_INTERVAL_SECS"));
    }

    #[test]
    fn test_unordered_bands_rejected() {
        let err = config_with(&[("STATUS_MEDIUM_RISK_MIN", "90")]).unwrap_err();
        assert!(err.to_string().contains("descending"));
    }

    #[test]
    fn test_decay_window_must_exceed_one() {
        tokio_test::assert_err!(config_with(&[("LOWER_IS_WORSE_DECAY_WINDOW", "1.0")]));
        tokio_test::assert_ok!(config_with(&[("LOWER_IS_WORSE_DECAY_WINDOW", "1.5")]));
    }
}
