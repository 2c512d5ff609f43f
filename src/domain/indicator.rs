use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way an indicator moves as risk increases.
///
/// Direction is declared per indicator in the catalog, so scoring never
/// depends on an indicator's name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskDirection {
    /// Risk grows as the value climbs towards the reference.
    #[default]
    HigherIsWorse,
    /// Risk grows as the value falls towards the reference. Proximity decays
    /// linearly to 0 at `decay_window * reference`.
    LowerIsWorse {
        #[serde(default)]
        decay_window: Option<f64>,
    },
    /// Banded inverse mapping between the reference floor and a safety ceiling.
    Banded {
        #[serde(default)]
        safety_ceiling: Option<f64>,
    },
}

impl RiskDirection {
    pub fn lower_is_worse() -> Self {
        Self::LowerIsWorse { decay_window: None }
    }

    pub fn banded(safety_ceiling: f64) -> Self {
        Self::Banded {
            safety_ceiling: Some(safety_ceiling),
        }
    }

    /// True for every variant where crossing means falling to or below the reference.
    pub fn is_inverse(&self) -> bool {
        !matches!(self, Self::HigherIsWorse)
    }
}

impl fmt::Display for RiskDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HigherIsWorse => write!(f, ">="),
            Self::LowerIsWorse { .. } => write!(f, "<="),
            Self::Banded { .. } => write!(f, "<= (banded)"),
        }
    }
}

/// Static description of one market-cycle indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub id: String,
    pub reference_threshold: f64,
    #[serde(default)]
    pub direction: RiskDirection,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
    /// Last-known value served when no live value can be collected.
    #[serde(default)]
    pub fallback_value: Option<f64>,
}

impl IndicatorDefinition {
    pub fn new(id: impl Into<String>, reference_threshold: f64, direction: RiskDirection) -> Self {
        Self {
            id: id.into(),
            reference_threshold,
            direction,
            unit: String::new(),
            description: String::new(),
            fallback_value: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_fallback(mut self, value: f64) -> Self {
        self.fallback_value = Some(value);
        self
    }
}

/// Discrete classification of a proximity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// `< 50` Low, `[50, 70)` Medium, `[70, 90)` High, `>= 90` Critical.
    pub fn from_proximity(proximity: f64) -> Self {
        if proximity >= 90.0 {
            Self::Critical
        } else if proximity >= 70.0 {
            Self::High
        } else if proximity >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluation of one indicator. Only ever lives inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    /// Carried as the map key in serialized snapshots.
    #[serde(skip)]
    pub definition_id: String,
    pub current: Option<f64>,
    pub reference: f64,
    #[serde(serialize_with = "crate::domain::proximity::serialize_opt_score")]
    pub proximity: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    pub in_risk_zone: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: String,
}

impl IndicatorReading {
    pub fn is_valid(&self) -> bool {
        self.proximity.is_some()
    }
}
