use async_trait::async_trait;
use cyclewatch::application::{CacheState, RefreshCache, RefreshOutcome};
use cyclewatch::domain::catalog::IndicatorCatalog;
use cyclewatch::domain::errors::{CycleError, SourceError};
use cyclewatch::domain::indicator::IndicatorDefinition;
use cyclewatch::domain::ports::ValueSource;
use cyclewatch::domain::snapshot::Snapshot;
use cyclewatch::domain::summary::{StatusBands, aggregate};
use cyclewatch::infrastructure::observability::Metrics;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

/// Value source whose bulk fetch blocks until the test releases it.
struct GatedSource {
    values: Mutex<HashMap<String, f64>>,
    gate: Semaphore,
    entered: Notify,
    passes: AtomicUsize,
    offline: AtomicBool,
}

impl GatedSource {
    fn new(values: HashMap<String, f64>) -> Self {
        Self {
            values: Mutex::new(values),
            gate: Semaphore::new(0),
            entered: Notify::new(),
            passes: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    fn set_all(&self, value: f64) {
        let mut values = self.values.lock().unwrap();
        for v in values.values_mut() {
            *v = value;
        }
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }

    async fn wait_entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl ValueSource for GatedSource {
    fn name(&self) -> &str {
        "gated"
    }

    async fn fetch_current_value(&self, id: &str) -> Result<Option<f64>, SourceError> {
        Ok(self.values.lock().unwrap().get(id).copied())
    }

    async fn fetch_current_values(
        &self,
        definitions: &[IndicatorDefinition],
    ) -> Result<HashMap<String, Option<f64>>, SourceError> {
        self.passes.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let permit = self.gate.acquire().await.unwrap();
        permit.forget();

        if self.offline.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable {
                source_name: "gated".to_string(),
                indicator: "*".to_string(),
                reason: "upstream offline".to_string(),
            });
        }

        let values = self.values.lock().unwrap();
        Ok(definitions
            .iter()
            .map(|def| (def.id.clone(), values.get(&def.id).copied()))
            .collect())
    }
}

fn builtin() -> Arc<IndicatorCatalog> {
    Arc::new(IndicatorCatalog::builtin().unwrap())
}

fn fallback_values(catalog: &IndicatorCatalog) -> HashMap<String, f64> {
    catalog
        .iter()
        .filter_map(|def| def.fallback_value.map(|v| (def.id.clone(), v)))
        .collect()
}

fn assert_consistent(snapshot: &Snapshot) {
    let recomputed = aggregate(snapshot.indicators().values(), &StatusBands::default());
    assert_eq!(&recomputed, snapshot.summary());
}

/// Test: A second refresh while one is in flight is skipped without fetching
#[tokio::test]
async fn test_concurrent_refresh_is_single_flight() {
    let catalog = builtin();
    let source = Arc::new(GatedSource::new(fallback_values(&catalog)));
    let cache = Arc::new(RefreshCache::new(catalog, source.clone()));

    let first = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.refresh_once().await })
    };
    source.wait_entered().await;

    assert!(cache.is_refreshing());
    assert_eq!(cache.state(), CacheState::Empty);
    assert!(cache.get().is_none());

    let second = cache.refresh_once().await.unwrap();
    assert!(matches!(second, RefreshOutcome::Skipped));

    source.release();
    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, RefreshOutcome::Refreshed(_)));

    assert_eq!(source.passes.load(Ordering::SeqCst), 1);
    assert!(!cache.is_refreshing());
    assert_eq!(cache.state(), CacheState::Ready);
}

/// Test: Readers see the old snapshot in full until the swap, then the new one in full
#[tokio::test]
async fn test_readers_never_observe_partial_snapshot() {
    let catalog = builtin();
    let source = Arc::new(GatedSource::new(fallback_values(&catalog)));
    let cache = Arc::new(RefreshCache::new(catalog, source.clone()));

    source.release();
    let old = cache.force_refresh().await.unwrap();
    source.wait_entered().await;

    source.set_all(1_000_000.0);
    let refresh = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.refresh_once().await })
    };
    source.wait_entered().await;

    assert_eq!(cache.state(), CacheState::Refreshing);
    for _ in 0..10 {
        let seen = cache.get().unwrap();
        assert!(Arc::ptr_eq(&seen, &old));
        assert_consistent(&seen);
        tokio::task::yield_now().await;
    }

    source.release();
    refresh.await.unwrap().unwrap();

    let new = cache.get().unwrap();
    assert!(!Arc::ptr_eq(&new, &old));
    assert_consistent(&new);
    assert!(new.captured_at() >= old.captured_at());
    assert!(
        new.indicators()
            .values()
            .all(|r| r.current == Some(1_000_000.0))
    );
}

/// Test: A forced refresh during a running cycle returns that cycle's snapshot
#[tokio::test]
async fn test_force_refresh_joins_cycle_in_flight() {
    let catalog = builtin();
    let source = Arc::new(GatedSource::new(fallback_values(&catalog)));
    let metrics = Metrics::new().unwrap();
    let cache = Arc::new(RefreshCache::new(catalog, source.clone()).with_metrics(metrics.clone()));

    let running = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.refresh_once().await })
    };
    source.wait_entered().await;

    let forced = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.force_refresh().await })
    };

    let skipped = metrics.refresh_cycles_total.with_label_values(&["skipped"]);
    tokio::time::timeout(Duration::from_secs(5), async {
        while skipped.get() < 1.0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("forced refresh should observe the running cycle");

    source.release();
    let RefreshOutcome::Refreshed(committed) = running.await.unwrap().unwrap() else {
        panic!("first cycle should commit");
    };
    let joined = forced.await.unwrap().unwrap();

    assert!(Arc::ptr_eq(&committed, &joined));
    assert_eq!(source.passes.load(Ordering::SeqCst), 1);
}

/// Test: A forced refresh that joins a failing cycle reports that failure
#[tokio::test]
async fn test_force_refresh_joining_failed_cycle_returns_error() {
    let catalog = builtin();
    let source = Arc::new(GatedSource::new(fallback_values(&catalog)));
    let metrics = Metrics::new().unwrap();
    let cache = Arc::new(RefreshCache::new(catalog, source.clone()).with_metrics(metrics.clone()));

    source.release();
    let previous = cache.force_refresh().await.unwrap();
    source.wait_entered().await;

    source.offline.store(true, Ordering::SeqCst);
    let running = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.refresh_once().await })
    };
    source.wait_entered().await;

    let forced = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.force_refresh().await })
    };

    let skipped = metrics.refresh_cycles_total.with_label_values(&["skipped"]);
    tokio::time::timeout(Duration::from_secs(5), async {
        while skipped.get() < 1.0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("forced refresh should observe the running cycle");

    source.release();
    assert!(running.await.unwrap().is_err());

    let joined = forced.await.unwrap();
    assert!(
        matches!(joined, Err(CycleError::Joined { .. })),
        "joined a failed cycle but got {:?}",
        joined.map(|s| s.captured_at())
    );
    assert!(Arc::ptr_eq(&cache.get().unwrap(), &previous));
    assert_eq!(source.passes.load(Ordering::SeqCst), 2);
}

/// Test: Two absent indicators out of 31 are excluded from the average
#[tokio::test]
async fn test_partial_cycle_publishes_with_reduced_valid_count() {
    let catalog = builtin();
    assert_eq!(catalog.len(), 31);

    let mut values = fallback_values(&catalog);
    values.remove("Pi Cycle Top Indicator");
    values.remove("Bitcoin RHODL Ratio");

    let source = Arc::new(GatedSource::new(fallback_values(&catalog)));
    let cache = Arc::new(RefreshCache::new(catalog.clone(), source.clone()));
    source.release();
    let before = cache.force_refresh().await.unwrap();
    assert_eq!(before.summary().valid_count, 31);

    *source.values.lock().unwrap() = values;
    source.release();
    let after = cache.force_refresh().await.unwrap();

    let summary = after.summary();
    assert_eq!(summary.total_count, 31);
    assert_eq!(summary.valid_count, 29);

    let proximities: Vec<f64> = after
        .indicators()
        .values()
        .filter_map(|r| r.proximity)
        .collect();
    assert_eq!(proximities.len(), 29);
    let mean = proximities.iter().sum::<f64>() / 29.0;
    assert!((summary.average_proximity - mean).abs() < 1e-9);

    let missing = after.reading("Pi Cycle Top Indicator").unwrap();
    assert_eq!(missing.current, None);
    assert_eq!(missing.proximity, None);
    assert!(!missing.in_risk_zone);

    assert!(Arc::ptr_eq(&cache.get().unwrap(), &after));
    assert!(!Arc::ptr_eq(&before, &after));
}
