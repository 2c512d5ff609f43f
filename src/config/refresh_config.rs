//! Refresh cycle configuration parsing from environment variables.

use super::{Lookup, parse_var};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SNAPSHOT_PATH: &str = "indicators_data.json";

/// Scheduling, staleness and file locations
#[derive(Debug, Clone)]
pub struct RefreshEnvConfig {
    pub refresh_interval_secs: u64,
    pub staleness_threshold_secs: u64,
    pub catalog_path: Option<PathBuf>,
    /// `None` disables the persisted mirror.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for RefreshEnvConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 600,
            staleness_threshold_secs: 1800,
            catalog_path: None,
            snapshot_path: Some(PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
        }
    }
}

impl RefreshEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let catalog_path = lookup("CATALOG_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let snapshot_path = match lookup("SNAPSHOT_PATH") {
            Some(p) if p.trim().is_empty() => None,
            Some(p) => Some(PathBuf::from(p)),
            None => Some(PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
        };

        Ok(Self {
            refresh_interval_secs: parse_var(lookup, "REFRESH_INTERVAL_SECS", 600)?,
            staleness_threshold_secs: parse_var(lookup, "STALENESS_THRESHOLD_SECS", 1800)?,
            catalog_path,
            snapshot_path,
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.staleness_threshold_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_refresh_config_defaults() {
        let config = RefreshEnvConfig::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(600));
        assert_eq!(config.staleness_threshold(), Duration::from_secs(1800));
        assert!(config.catalog_path.is_none());
        assert_eq!(
            config.snapshot_path,
            Some(PathBuf::from(DEFAULT_SNAPSHOT_PATH))
        );
    }

    #[test]
    fn test_empty_snapshot_path_disables_mirror() {
        let config =
            RefreshEnvConfig::from_lookup(&lookup_from(&[("SNAPSHOT_PATH", "")])).unwrap();
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_invalid_interval_is_an_error() {
        let result =
            RefreshEnvConfig::from_lookup(&lookup_from(&[("REFRESH_INTERVAL_SECS", "ten")]));
        assert!(result.is_err());
    }
}
