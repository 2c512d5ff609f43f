//! Value source configuration parsing from environment variables.

use super::{Lookup, parse_bool, parse_var};
use crate::infrastructure::sentiment::alternative_me;
use anyhow::Result;
use std::time::Duration;

pub const DEFAULT_FEAR_GREED_INDICATOR_ID: &str = "Fear & Greed Index";

/// Live adapters and their call bounds
#[derive(Debug, Clone)]
pub struct SourceEnvConfig {
    pub call_timeout_secs: u64,
    pub fear_greed_enabled: bool,
    pub fear_greed_url: String,
    pub fear_greed_indicator_id: String,
}

impl Default for SourceEnvConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 10,
            fear_greed_enabled: true,
            fear_greed_url: alternative_me::DEFAULT_URL.to_string(),
            fear_greed_indicator_id: DEFAULT_FEAR_GREED_INDICATOR_ID.to_string(),
        }
    }
}

impl SourceEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            call_timeout_secs: parse_var(lookup, "SOURCE_CALL_TIMEOUT_SECS", 10)?,
            fear_greed_enabled: parse_bool(lookup, "FEAR_GREED_ENABLED", true),
            fear_greed_url: lookup("FEAR_GREED_URL")
                .unwrap_or_else(|| alternative_me::DEFAULT_URL.to_string()),
            fear_greed_indicator_id: lookup("FEAR_GREED_INDICATOR_ID")
                .unwrap_or_else(|| DEFAULT_FEAR_GREED_INDICATOR_ID.to_string()),
        })
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}
