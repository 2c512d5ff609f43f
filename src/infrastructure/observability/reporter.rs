//! Push-based summary reporter for cyclewatch
//!
//! Periodically outputs cache health and the served summary as structured
//! JSON to stdout.

use crate::application::refresh_cache::{CacheHealth, RefreshCache};
use crate::domain::summary::Summary;
use crate::infrastructure::observability::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Report line for JSON output
#[derive(Serialize)]
pub struct SummaryReport {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub health: CacheHealth,
    pub summary: Option<Summary>,
}

/// Outputs a [`SummaryReport`] on a fixed interval. Outbound only.
pub struct SummaryReporter {
    cache: Arc<RefreshCache>,
    metrics: Option<Metrics>,
    start_time: Instant,
    interval: Duration,
}

impl SummaryReporter {
    pub fn new(cache: Arc<RefreshCache>, metrics: Option<Metrics>, interval_seconds: u64) -> Self {
        Self {
            cache,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter in a loop, outputting a report periodically
    pub async fn run(self) {
        info!(
            "SummaryReporter: Starting push-based reports (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let report = self.collect_report();
            match serde_json::to_string(&report) {
                Ok(json) => {
                    // Prefixed so logs can be filtered
                    println!("SUMMARY_JSON:{}", json);
                    if report.health.is_stale {
                        warn!(
                            "Snapshot is stale: age {:?}s > {}s",
                            report.health.age_seconds, report.health.staleness_threshold_seconds
                        );
                    }
                }
                Err(e) => warn!("Failed to serialize summary report: {}", e),
            }
        }
    }

    pub fn collect_report(&self) -> SummaryReport {
        let health = self.cache.health();

        if let (Some(metrics), Some(age)) = (&self.metrics, health.age_seconds) {
            metrics.snapshot_age_seconds.set(age as f64);
        }

        SummaryReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            summary: self.cache.get_summary().ok(),
            health,
        }
    }
}
