//! Proximity scoring and status band configuration parsing.

use super::{Lookup, parse_var};
use crate::domain::proximity::ScoringConfig;
use crate::domain::summary::StatusBands;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct ScoringEnvConfig {
    pub decay_window: f64,
    pub safety_ceiling: f64,
    pub high_risk_min: f64,
    pub medium_risk_min: f64,
    pub low_medium_min: f64,
}

impl Default for ScoringEnvConfig {
    fn default() -> Self {
        let scoring = ScoringConfig::default();
        let bands = StatusBands::default();
        Self {
            decay_window: scoring.decay_window,
            safety_ceiling: scoring.safety_ceiling,
            high_risk_min: bands.high_risk_min,
            medium_risk_min: bands.medium_risk_min,
            low_medium_min: bands.low_medium_min,
        }
    }
}

impl ScoringEnvConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            decay_window: parse_var(lookup, "LOWER_IS_WORSE_DECAY_WINDOW", defaults.decay_window)?,
            safety_ceiling: parse_var(lookup, "BANDED_SAFETY_CEILING", defaults.safety_ceiling)?,
            high_risk_min: parse_var(lookup, "STATUS_HIGH_RISK_MIN", defaults.high_risk_min)?,
            medium_risk_min: parse_var(lookup, "STATUS_MEDIUM_RISK_MIN", defaults.medium_risk_min)?,
            low_medium_min: parse_var(lookup, "STATUS_LOW_MEDIUM_MIN", defaults.low_medium_min)?,
        })
    }

    pub fn to_scoring(&self) -> ScoringConfig {
        ScoringConfig {
            decay_window: self.decay_window,
            safety_ceiling: self.safety_ceiling,
        }
    }

    pub fn to_status_bands(&self) -> StatusBands {
        StatusBands {
            high_risk_min: self.high_risk_min,
            medium_risk_min: self.medium_risk_min,
            low_medium_min: self.low_medium_min,
        }
    }
}
