use crate::domain::errors::SourceError;
use crate::domain::ports::ValueSource;
use crate::infrastructure::core::HttpClientFactory;
use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_URL: &str = "https://api.alternative.me/fng/";
const MAX_RETRIES: u32 = 2;

#[derive(Debug, Deserialize)]
struct AlternativeMeResponse {
    data: Vec<AlternativeMeData>,
}

#[derive(Debug, Deserialize)]
struct AlternativeMeData {
    value: String,
    #[serde(default)]
    value_classification: Option<String>,
}

/// Live Crypto Fear & Greed index from Alternative.me.
///
/// Answers only for the indicator id it was registered under. Retries fit
/// inside `call_budget`, the same bound `LayeredValueSource` enforces.
pub struct AlternativeMeSource {
    client: ClientWithMiddleware,
    url: String,
    indicator_id: String,
}

impl AlternativeMeSource {
    pub fn new(
        url: impl Into<String>,
        indicator_id: impl Into<String>,
        call_budget: Duration,
    ) -> Self {
        Self {
            client: HttpClientFactory::create_client(call_budget, MAX_RETRIES),
            url: url.into(),
            indicator_id: indicator_id.into(),
        }
    }

    async fn fetch_index(&self) -> anyhow::Result<f64> {
        info!("Fetching Fear & Greed index from Alternative.me...");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to send request to Alternative.me")?;

        if !response.status().is_success() {
            anyhow::bail!("Alternative.me API returned status: {}", response.status());
        }

        let body: AlternativeMeResponse = response
            .json()
            .await
            .context("Failed to parse Alternative.me response")?;

        parse_index(body)
    }
}

fn parse_index(body: AlternativeMeResponse) -> anyhow::Result<f64> {
    let Some(data) = body.data.first() else {
        anyhow::bail!("No index data found in response");
    };

    let value: f64 = data
        .value
        .trim()
        .parse()
        .context("Failed to parse index value")?;

    info!(
        "Fetched Fear & Greed index: {} ({})",
        value,
        data.value_classification.as_deref().unwrap_or("unclassified")
    );
    Ok(value)
}

#[async_trait]
impl ValueSource for AlternativeMeSource {
    fn name(&self) -> &str {
        "alternative.me"
    }

    async fn fetch_current_value(&self, indicator_id: &str) -> Result<Option<f64>, SourceError> {
        if indicator_id != self.indicator_id {
            return Ok(None);
        }

        self.fetch_index()
            .await
            .map(Some)
            .map_err(|e| SourceError::Unavailable {
                source_name: self.name().to_string(),
                indicator: indicator_id.to_string(),
                reason: format!("{:#}", e),
            })
    }
}
