use crate::domain::catalog::IndicatorCatalog;
use crate::domain::errors::SourceError;
use crate::domain::indicator::IndicatorDefinition;
use crate::domain::ports::ValueSource;
use async_trait::async_trait;
use std::collections::HashMap;

/// Fixed values per indicator id. Backs the bottom layer of `LayeredValueSource`.
#[derive(Debug, Clone, Default)]
pub struct StaticValueSource {
    values: HashMap<String, f64>,
}

impl StaticValueSource {
    pub fn new(values: HashMap<String, f64>) -> Self {
        Self { values }
    }

    /// Serve each definition's `fallback_value`.
    pub fn from_catalog(catalog: &IndicatorCatalog) -> Self {
        let values = catalog
            .iter()
            .filter_map(|def| def.fallback_value.map(|v| (def.id.clone(), v)))
            .collect();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl ValueSource for StaticValueSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_current_value(&self, indicator_id: &str) -> Result<Option<f64>, SourceError> {
        Ok(self.values.get(indicator_id).copied())
    }

    async fn fetch_current_values(
        &self,
        definitions: &[IndicatorDefinition],
    ) -> Result<HashMap<String, Option<f64>>, SourceError> {
        Ok(definitions
            .iter()
            .map(|def| (def.id.clone(), self.values.get(&def.id).copied()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::RiskDirection;

    #[test]
    fn test_from_catalog_serves_fallback_values() {
        let catalog = IndicatorCatalog::new(vec![
            IndicatorDefinition::new("Puell Multiple", 2.2, RiskDirection::HigherIsWorse)
                .with_fallback(1.13),
            IndicatorDefinition::new("Mayer Multiple", 2.2, RiskDirection::HigherIsWorse),
        ])
        .unwrap();

        let source = StaticValueSource::from_catalog(&catalog);
        assert_eq!(source.len(), 1);

        let values =
            tokio_test::block_on(source.fetch_current_values(catalog.definitions())).unwrap();
        assert_eq!(values["Puell Multiple"], Some(1.13));
        assert_eq!(values["Mayer Multiple"], None);
    }
}
