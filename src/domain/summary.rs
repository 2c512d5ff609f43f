use crate::domain::indicator::{IndicatorReading, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Qualitative cycle status derived from the average proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    #[serde(rename = "high-risk/possible-cycle-top")]
    HighRisk,
    #[serde(rename = "medium-risk/monitor")]
    MediumRisk,
    #[serde(rename = "low-medium/mid-cycle")]
    LowMedium,
    #[serde(rename = "low-risk/early-cycle")]
    LowRisk,
}

impl OverallStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighRisk => "high-risk/possible-cycle-top",
            Self::MediumRisk => "medium-risk/monitor",
            Self::LowMedium => "low-medium/mid-cycle",
            Self::LowRisk => "low-risk/early-cycle",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds (inclusive) of each status band on the average proximity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusBands {
    pub high_risk_min: f64,
    pub medium_risk_min: f64,
    pub low_medium_min: f64,
}

impl Default for StatusBands {
    fn default() -> Self {
        Self {
            high_risk_min: 80.0,
            medium_risk_min: 60.0,
            low_medium_min: 40.0,
        }
    }
}

impl StatusBands {
    /// Bands must be strictly descending.
    pub fn is_ordered(&self) -> bool {
        self.high_risk_min > self.medium_risk_min && self.medium_risk_min > self.low_medium_min
    }

    pub fn classify(&self, average_proximity: f64) -> OverallStatus {
        if average_proximity >= self.high_risk_min {
            OverallStatus::HighRisk
        } else if average_proximity >= self.medium_risk_min {
            OverallStatus::MediumRisk
        } else if average_proximity >= self.low_medium_min {
            OverallStatus::LowMedium
        } else {
            OverallStatus::LowRisk
        }
    }
}

/// Aggregate statistics over one snapshot's readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_count: usize,
    pub valid_count: usize,
    pub risk_zone_count: usize,
    #[serde(serialize_with = "crate::domain::proximity::serialize_score")]
    pub average_proximity: f64,
    #[serde(serialize_with = "crate::domain::proximity::serialize_score")]
    pub risk_zone_percentage: f64,
    pub risk_level_histogram: BTreeMap<RiskLevel, usize>,
    pub overall_status: OverallStatus,
}

/// Reduce readings into a [`Summary`].
///
/// Readings without a proximity count towards `total_count` only. Averages over
/// zero valid readings are 0.
pub fn aggregate<'a>(
    readings: impl IntoIterator<Item = &'a IndicatorReading>,
    bands: &StatusBands,
) -> Summary {
    let mut histogram: BTreeMap<RiskLevel, usize> =
        RiskLevel::ALL.iter().map(|level| (*level, 0)).collect();
    let mut total_count = 0;
    let mut valid_count = 0;
    let mut risk_zone_count = 0;
    let mut proximity_sum = 0.0;

    for reading in readings {
        total_count += 1;
        if reading.in_risk_zone {
            risk_zone_count += 1;
        }
        if let Some(proximity) = reading.proximity {
            valid_count += 1;
            proximity_sum += proximity;
        }
        if let Some(level) = reading.risk_level {
            *histogram.entry(level).or_insert(0) += 1;
        }
    }

    let (average_proximity, risk_zone_percentage) = if valid_count > 0 {
        (
            proximity_sum / valid_count as f64,
            risk_zone_count as f64 / valid_count as f64 * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    Summary {
        total_count,
        valid_count,
        risk_zone_count,
        average_proximity,
        risk_zone_percentage,
        risk_level_histogram: histogram,
        overall_status: bands.classify(average_proximity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(proximity: Option<f64>, in_risk_zone: bool) -> IndicatorReading {
        IndicatorReading {
            definition_id: "x".to_string(),
            current: proximity,
            reference: 100.0,
            proximity,
            risk_level: proximity.map(RiskLevel::from_proximity),
            in_risk_zone,
            description: String::new(),
            unit: String::new(),
        }
    }

    #[test]
    fn test_average_excludes_undefined_readings() {
        let readings = vec![
            reading(Some(20.0), false),
            reading(Some(100.0), true),
            reading(None, false),
        ];

        let summary = aggregate(&readings, &StatusBands::default());

        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.valid_count, 2);
        assert_eq!(summary.risk_zone_count, 1);
        assert_eq!(summary.average_proximity, 60.0);
        assert_eq!(summary.risk_zone_percentage, 50.0);
        assert_eq!(summary.overall_status, OverallStatus::MediumRisk);
    }

    #[test]
    fn test_empty_and_all_invalid_average_is_zero() {
        let summary = aggregate(std::iter::empty(), &StatusBands::default());
        assert_eq!(summary.average_proximity, 0.0);
        assert_eq!(summary.overall_status, OverallStatus::LowRisk);

        let readings = vec![reading(None, false), reading(None, false)];
        let summary = aggregate(&readings, &StatusBands::default());
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.valid_count, 0);
        assert_eq!(summary.average_proximity, 0.0);
        assert_eq!(summary.risk_zone_percentage, 0.0);
    }

    #[test]
    fn test_histogram_has_every_level() {
        let readings = vec![
            reading(Some(10.0), false),
            reading(Some(55.0), false),
            reading(Some(95.0), false),
            reading(Some(100.0), true),
        ];

        let summary = aggregate(&readings, &StatusBands::default());

        assert_eq!(summary.risk_level_histogram[&RiskLevel::Low], 1);
        assert_eq!(summary.risk_level_histogram[&RiskLevel::Medium], 1);
        assert_eq!(summary.risk_level_histogram[&RiskLevel::High], 0);
        assert_eq!(summary.risk_level_histogram[&RiskLevel::Critical], 2);
    }

    #[test]
    fn test_status_band_edges() {
        let bands = StatusBands::default();
        assert_eq!(bands.classify(80.0), OverallStatus::HighRisk);
        assert_eq!(bands.classify(79.9), OverallStatus::MediumRisk);
        assert_eq!(bands.classify(60.0), OverallStatus::MediumRisk);
        assert_eq!(bands.classify(40.0), OverallStatus::LowMedium);
        assert_eq!(bands.classify(39.9), OverallStatus::LowRisk);
    }

    #[test]
    fn test_custom_bands() {
        let bands = StatusBands {
            high_risk_min: 70.0,
            medium_risk_min: 50.0,
            low_medium_min: 30.0,
        };
        assert!(bands.is_ordered());
        assert_eq!(bands.classify(72.0), OverallStatus::HighRisk);

        let broken = StatusBands {
            high_risk_min: 40.0,
            medium_risk_min: 60.0,
            low_medium_min: 20.0,
        };
        assert!(!broken.is_ordered());
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&OverallStatus::LowMedium).unwrap();
        assert_eq!(json, "\"low-medium/mid-cycle\"");
    }
}
