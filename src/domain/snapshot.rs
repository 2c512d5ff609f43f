use crate::domain::catalog::IndicatorCatalog;
use crate::domain::indicator::IndicatorReading;
use crate::domain::proximity::{ScoringConfig, evaluate};
use crate::domain::summary::{StatusBands, Summary, aggregate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// A fully computed, immutable set of readings plus their summary.
///
/// Serializes to the persisted mirror shape:
/// `{ indicators: { <id>: {...} }, summary: {...}, last_update: <RFC 3339> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    indicators: BTreeMap<String, IndicatorReading>,
    summary: Summary,
    #[serde(rename = "last_update")]
    captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Evaluate every catalog definition against `values`. Ids missing from
    /// `values` are recorded as absent readings.
    pub fn compute(
        catalog: &IndicatorCatalog,
        values: &HashMap<String, Option<f64>>,
        scoring: &ScoringConfig,
        bands: &StatusBands,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let indicators: BTreeMap<String, IndicatorReading> = catalog
            .iter()
            .map(|def| {
                let current = values.get(&def.id).copied().flatten();
                (def.id.clone(), evaluate(def, current, scoring))
            })
            .collect();
        let summary = aggregate(indicators.values(), bands);

        Self {
            indicators,
            summary,
            captured_at,
        }
    }

    pub fn indicators(&self) -> &BTreeMap<String, IndicatorReading> {
        &self.indicators
    }

    pub fn reading(&self, id: &str) -> Option<&IndicatorReading> {
        self.indicators.get(id)
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Age relative to `now`; zero if `captured_at` lies in the future.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or_default()
    }

    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    /// Re-attach map keys to readings after deserialization.
    pub(crate) fn restore_ids(mut self) -> Self {
        for (id, reading) in self.indicators.iter_mut() {
            reading.definition_id = id.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorDefinition, RiskDirection, RiskLevel};

    fn catalog() -> IndicatorCatalog {
        IndicatorCatalog::new(vec![
            IndicatorDefinition::new("Bitcoin Ahr999 Index", 4.0, RiskDirection::HigherIsWorse),
            IndicatorDefinition::new("Puell Multiple", 2.2, RiskDirection::HigherIsWorse),
            IndicatorDefinition::new(
                "Bitcoin Long Term Holder Supply",
                13.5,
                RiskDirection::lower_is_worse(),
            )
            .with_unit("M"),
        ])
        .unwrap()
    }

    #[test]
    fn test_compute_records_missing_values_as_absent() {
        let mut values = HashMap::new();
        values.insert("Bitcoin Ahr999 Index".to_string(), Some(0.98));
        values.insert("Puell Multiple".to_string(), Some(2.2));

        let snapshot = Snapshot::compute(
            &catalog(),
            &values,
            &ScoringConfig::default(),
            &StatusBands::default(),
            Utc::now(),
        );

        assert_eq!(snapshot.indicators().len(), 3);
        let lth = snapshot.reading("Bitcoin Long Term Holder Supply").unwrap();
        assert_eq!(lth.current, None);
        assert_eq!(lth.proximity, None);
        assert_eq!(lth.risk_level, None);

        let puell = snapshot.reading("Puell Multiple").unwrap();
        assert_eq!(puell.risk_level, Some(RiskLevel::Critical));
        assert!(puell.in_risk_zone);

        assert_eq!(snapshot.summary().total_count, 3);
        assert_eq!(snapshot.summary().valid_count, 2);
        assert_eq!(snapshot.summary().risk_zone_count, 1);
    }

    #[test]
    fn test_serialized_shape_uses_last_update() {
        let mut values = HashMap::new();
        values.insert("Puell Multiple".to_string(), Some(1.1));
        let snapshot = Snapshot::compute(
            &catalog(),
            &values,
            &ScoringConfig::default(),
            &StatusBands::default(),
            Utc::now(),
        );

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("last_update").is_some());
        assert!(json.get("summary").is_some());
        let puell = &json["indicators"]["Puell Multiple"];
        assert_eq!(puell["current"], 1.1);
        assert_eq!(puell["reference"], 2.2);
        assert_eq!(puell["risk_level"], "MEDIUM");
        assert_eq!(puell["in_risk_zone"], false);
        assert!(puell.get("definition_id").is_none());
    }

    #[test]
    fn test_scores_serialized_with_one_decimal() {
        let mut values = HashMap::new();
        values.insert("Puell Multiple".to_string(), Some(1.13));
        let snapshot = Snapshot::compute(
            &catalog(),
            &values,
            &ScoringConfig::default(),
            &StatusBands::default(),
            Utc::now(),
        );

        let reading = snapshot.reading("Puell Multiple").unwrap();
        assert!((reading.proximity.unwrap() - 51.363_636).abs() < 1e-4);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["indicators"]["Puell Multiple"]["proximity"], 51.4);
        assert!(json["indicators"]["Bitcoin Ahr999 Index"]["proximity"].is_null());
        assert_eq!(json["summary"]["average_proximity"], 51.4);
        assert_eq!(json["summary"]["risk_zone_percentage"], 0.0);
    }

    #[test]
    fn test_restore_ids_after_deserialize() {
        let snapshot = Snapshot::compute(
            &catalog(),
            &HashMap::new(),
            &ScoringConfig::default(),
            &StatusBands::default(),
            Utc::now(),
        );
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: Snapshot = serde_json::from_str::<Snapshot>(&json).unwrap().restore_ids();

        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_age_never_negative() {
        let future = Utc::now() + chrono::Duration::seconds(60);
        let snapshot = Snapshot::compute(
            &catalog(),
            &HashMap::new(),
            &ScoringConfig::default(),
            &StatusBands::default(),
            future,
        );
        assert_eq!(snapshot.age(), Duration::ZERO);
    }
}
