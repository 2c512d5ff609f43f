//! Prometheus metrics definitions for cyclewatch
//!
//! All metrics use the `cyclewatch_` prefix and are read-only.

use crate::domain::snapshot::Snapshot;
use prometheus::{
    CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::sync::Arc;

/// Prometheus metrics for the refresh engine
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Refresh cycles by outcome (success, failure, skipped)
    pub refresh_cycles_total: CounterVec,
    /// Indicators that produced no value in a cycle
    pub source_failures_total: CounterVec,
    /// Average proximity of the served snapshot
    pub average_proximity: GenericGauge<AtomicF64>,
    /// Indicators currently in their risk zone
    pub risk_zone_count: GenericGauge<AtomicF64>,
    /// Indicators with a defined proximity
    pub valid_indicators: GenericGauge<AtomicF64>,
    /// Proximity per indicator
    pub indicator_proximity: GenericGaugeVec<AtomicF64>,
    /// Age of the served snapshot in seconds
    pub snapshot_age_seconds: GenericGauge<AtomicF64>,
    /// Wall time of refresh cycles
    pub refresh_duration_seconds: Histogram,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let refresh_cycles_total = CounterVec::new(
            Opts::new(
                "cyclewatch_refresh_cycles_total",
                "Refresh cycles by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(refresh_cycles_total.clone()))?;

        let source_failures_total = CounterVec::new(
            Opts::new(
                "cyclewatch_source_failures_total",
                "Indicators without a value in a refresh cycle",
            ),
            &["indicator"],
        )?;
        registry.register(Box::new(source_failures_total.clone()))?;

        let average_proximity = Gauge::with_opts(Opts::new(
            "cyclewatch_average_proximity",
            "Average proximity to the risk zone (0-100)",
        ))?;
        registry.register(Box::new(average_proximity.clone()))?;

        let risk_zone_count = Gauge::with_opts(Opts::new(
            "cyclewatch_risk_zone_count",
            "Indicators currently in their risk zone",
        ))?;
        registry.register(Box::new(risk_zone_count.clone()))?;

        let valid_indicators = Gauge::with_opts(Opts::new(
            "cyclewatch_valid_indicators",
            "Indicators with a defined proximity",
        ))?;
        registry.register(Box::new(valid_indicators.clone()))?;

        let indicator_proximity = GaugeVec::new(
            Opts::new(
                "cyclewatch_indicator_proximity",
                "Proximity to the risk zone per indicator (0-100)",
            ),
            &["indicator"],
        )?;
        registry.register(Box::new(indicator_proximity.clone()))?;

        let snapshot_age_seconds = Gauge::with_opts(Opts::new(
            "cyclewatch_snapshot_age_seconds",
            "Age of the served snapshot in seconds",
        ))?;
        registry.register(Box::new(snapshot_age_seconds.clone()))?;

        let refresh_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "cyclewatch_refresh_duration_seconds",
                "Wall time of refresh cycles",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(refresh_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            refresh_cycles_total,
            source_failures_total,
            average_proximity,
            risk_zone_count,
            valid_indicators,
            indicator_proximity,
            snapshot_age_seconds,
            refresh_duration_seconds,
        })
    }

    pub fn record_cycle(&self, outcome: &str) {
        self.refresh_cycles_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_source_failure(&self, indicator: &str) {
        self.source_failures_total
            .with_label_values(&[indicator])
            .inc();
    }

    /// Mirror a freshly published snapshot into the gauges.
    pub fn record_snapshot(&self, snapshot: &Snapshot) {
        let summary = snapshot.summary();
        self.average_proximity.set(summary.average_proximity);
        self.risk_zone_count.set(summary.risk_zone_count as f64);
        self.valid_indicators.set(summary.valid_count as f64);

        self.indicator_proximity.reset();
        for (id, reading) in snapshot.indicators() {
            if let Some(proximity) = reading.proximity {
                self.indicator_proximity
                    .with_label_values(&[id.as_str()])
                    .set(proximity);
            }
        }

        self.snapshot_age_seconds.set(snapshot.age().as_secs_f64());
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }
}
