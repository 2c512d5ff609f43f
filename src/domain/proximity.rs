//! Proximity scoring.
//!
//! Converts a raw indicator value into a bounded `[0, 100]` proximity score and
//! a risk-zone flag. Pure functions only: no I/O, no shared state.

use crate::domain::indicator::{IndicatorDefinition, IndicatorReading, RiskDirection, RiskLevel};
use serde::Serializer;

pub const MIN_PROXIMITY: f64 = 0.0;
pub const MAX_PROXIMITY: f64 = 100.0;

/// Scores are served and persisted with one decimal.
pub fn round_score(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn serialize_score<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_score(*value))
}

pub(crate) fn serialize_opt_score<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round_score(*v)),
        None => serializer.serialize_none(),
    }
}

/// Defaults applied when an indicator does not carry its own decay window
/// or safety ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Multiple of the reference at which a lower-is-worse score reaches 0.
    pub decay_window: f64,
    /// Ceiling above which a banded indicator scores 0.
    pub safety_ceiling: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            decay_window: 2.0,
            safety_ceiling: 70.0,
        }
    }
}

/// Result of scoring one value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityScore {
    pub proximity: Option<f64>,
    pub in_risk_zone: bool,
}

impl ProximityScore {
    const UNKNOWN: Self = Self {
        proximity: None,
        in_risk_zone: false,
    };

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.proximity.map(RiskLevel::from_proximity)
    }
}

fn clamp_proximity(value: f64) -> f64 {
    value.clamp(MIN_PROXIMITY, MAX_PROXIMITY)
}

/// Score `current` against `reference` in the declared `direction`.
///
/// An absent or non-finite `current` yields an undefined proximity and no
/// risk zone. `reference` is assumed non-zero; the catalog rejects zero at load.
pub fn compute_proximity(
    current: Option<f64>,
    reference: f64,
    direction: RiskDirection,
    scoring: &ScoringConfig,
) -> ProximityScore {
    let Some(current) = current.filter(|v| v.is_finite()) else {
        return ProximityScore::UNKNOWN;
    };

    match direction {
        RiskDirection::HigherIsWorse => {
            if current >= reference {
                return ProximityScore {
                    proximity: Some(MAX_PROXIMITY),
                    in_risk_zone: true,
                };
            }
            ProximityScore {
                proximity: Some(clamp_proximity(current / reference * 100.0)),
                in_risk_zone: false,
            }
        }
        RiskDirection::LowerIsWorse { decay_window } => {
            if current <= reference {
                return ProximityScore {
                    proximity: Some(MAX_PROXIMITY),
                    in_risk_zone: true,
                };
            }
            let window = decay_window.unwrap_or(scoring.decay_window);
            let span = (window - 1.0) * reference;
            let raw = if span == 0.0 {
                MIN_PROXIMITY
            } else {
                100.0 - ((current - reference) / span) * 100.0
            };
            ProximityScore {
                proximity: Some(clamp_proximity(raw)),
                in_risk_zone: false,
            }
        }
        RiskDirection::Banded { safety_ceiling } => {
            let ceiling = safety_ceiling.unwrap_or(scoring.safety_ceiling);
            let in_risk_zone = current <= reference;
            let proximity = if in_risk_zone {
                MAX_PROXIMITY
            } else if current >= ceiling || ceiling <= reference {
                MIN_PROXIMITY
            } else {
                clamp_proximity((ceiling - current) / (ceiling - reference) * 100.0)
            };
            ProximityScore {
                proximity: Some(proximity),
                in_risk_zone,
            }
        }
    }
}

/// Build the full reading for one indicator.
pub fn evaluate(
    definition: &IndicatorDefinition,
    current: Option<f64>,
    scoring: &ScoringConfig,
) -> IndicatorReading {
    let score = compute_proximity(
        current,
        definition.reference_threshold,
        definition.direction,
        scoring,
    );

    IndicatorReading {
        definition_id: definition.id.clone(),
        current: current.filter(|v| v.is_finite()),
        reference: definition.reference_threshold,
        proximity: score.proximity,
        risk_level: score.risk_level(),
        in_risk_zone: score.in_risk_zone,
        description: definition.description.clone(),
        unit: definition.unit.clone(),
    }
}
