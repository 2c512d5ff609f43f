use crate::domain::errors::SourceError;
use crate::domain::ports::ValueSource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolves each indicator through live adapter, then last-known live value,
/// then static fallback.
///
/// Live calls are bounded by `call_timeout`. Live failures never surface as
/// errors; they fall through to the next layer.
pub struct LayeredValueSource {
    live: HashMap<String, Arc<dyn ValueSource>>,
    fallback: Option<Arc<dyn ValueSource>>,
    last_known: RwLock<HashMap<String, f64>>,
    call_timeout: Duration,
}

impl LayeredValueSource {
    pub fn new(call_timeout: Duration) -> Self {
        Self {
            live: HashMap::new(),
            fallback: None,
            last_known: RwLock::new(HashMap::new()),
            call_timeout,
        }
    }

    /// Register a live adapter for one indicator id.
    pub fn with_live(mut self, indicator_id: impl Into<String>, source: Arc<dyn ValueSource>) -> Self {
        self.live.insert(indicator_id.into(), source);
        self
    }

    pub fn with_fallback(mut self, source: Arc<dyn ValueSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    pub fn last_known(&self, indicator_id: &str) -> Option<f64> {
        match self.last_known.read() {
            Ok(guard) => guard.get(indicator_id).copied(),
            Err(poisoned) => poisoned.into_inner().get(indicator_id).copied(),
        }
    }

    fn remember(&self, indicator_id: &str, value: f64) {
        match self.last_known.write() {
            Ok(mut guard) => {
                guard.insert(indicator_id.to_string(), value);
            }
            Err(poisoned) => {
                poisoned
                    .into_inner()
                    .insert(indicator_id.to_string(), value);
            }
        }
    }

    async fn fetch_live(&self, live: &Arc<dyn ValueSource>, indicator_id: &str) -> Option<f64> {
        match tokio::time::timeout(self.call_timeout, live.fetch_current_value(indicator_id)).await {
            Ok(Ok(Some(value))) if value.is_finite() => {
                self.remember(indicator_id, value);
                Some(value)
            }
            Ok(Ok(Some(value))) => {
                warn!(
                    "LayeredValueSource: {} returned non-finite value {} for {}",
                    live.name(),
                    value,
                    indicator_id
                );
                None
            }
            Ok(Ok(None)) => {
                debug!(
                    "LayeredValueSource: {} has no value for {}",
                    live.name(),
                    indicator_id
                );
                None
            }
            Ok(Err(e)) => {
                warn!("LayeredValueSource: Live fetch failed: {}", e);
                None
            }
            Err(_) => {
                let err = SourceError::Timeout {
                    indicator: indicator_id.to_string(),
                    duration_ms: self.call_timeout.as_millis() as u64,
                };
                warn!("LayeredValueSource: {} ({})", err, live.name());
                None
            }
        }
    }
}

#[async_trait]
impl ValueSource for LayeredValueSource {
    fn name(&self) -> &str {
        "layered"
    }

    async fn fetch_current_value(&self, indicator_id: &str) -> Result<Option<f64>, SourceError> {
        if let Some(live) = self.live.get(indicator_id) {
            if let Some(value) = self.fetch_live(live, indicator_id).await {
                return Ok(Some(value));
            }
            if let Some(value) = self.last_known(indicator_id) {
                info!(
                    "LayeredValueSource: Using last-known value {} for {}",
                    value, indicator_id
                );
                return Ok(Some(value));
            }
        }

        match &self.fallback {
            Some(fallback) => fallback.fetch_current_value(indicator_id).await,
            None => Ok(None),
        }
    }
}
