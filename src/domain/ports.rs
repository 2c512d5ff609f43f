use crate::domain::errors::SourceError;
use crate::domain::indicator::IndicatorDefinition;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::warn;

/// Supplies current indicator values to the refresh cycle.
#[async_trait]
pub trait ValueSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Current value for one indicator. `Ok(None)` means the source has nothing
    /// for this id.
    async fn fetch_current_value(&self, indicator_id: &str) -> Result<Option<f64>, SourceError>;

    /// Values for every definition in one pass.
    ///
    /// The default fans out to [`fetch_current_value`](Self::fetch_current_value)
    /// concurrently. Per-indicator errors become absent values; only an `Err`
    /// from this method fails the whole cycle.
    async fn fetch_current_values(
        &self,
        definitions: &[IndicatorDefinition],
    ) -> Result<HashMap<String, Option<f64>>, SourceError> {
        let results = join_all(
            definitions
                .iter()
                .map(|def| async move { (def.id.clone(), self.fetch_current_value(&def.id).await) }),
        )
        .await;

        let values = results
            .into_iter()
            .map(|(id, result)| match result {
                Ok(value) => (id, value),
                Err(e) => {
                    warn!("ValueSource[{}]: {} unavailable: {}", self.name(), id, e);
                    (id, None)
                }
            })
            .collect();

        Ok(values)
    }
}
