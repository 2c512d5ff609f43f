use crate::domain::catalog::IndicatorCatalog;
use crate::domain::errors::{CacheError, CycleError};
use crate::domain::ports::ValueSource;
use crate::domain::proximity::ScoringConfig;
use crate::domain::snapshot::Snapshot;
use crate::domain::summary::{StatusBands, Summary};
use crate::infrastructure::observability::{CycleTimer, Metrics};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

/// Lifecycle of the served snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheState {
    /// No snapshot has been published yet.
    Empty,
    /// Serving the last good snapshot.
    Ready,
    /// A cycle is in flight; readers still get the previous snapshot.
    Refreshing,
}

/// What a call to [`RefreshCache::refresh_once`] did.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Refreshed(Arc<Snapshot>),
    /// Another cycle was already running; nothing was fetched.
    Skipped,
}

/// Health view for status endpoints. Staleness is reported, never raised.
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    pub state: CacheState,
    pub captured_at: Option<DateTime<Utc>>,
    pub age_seconds: Option<u64>,
    pub is_stale: bool,
    pub staleness_threshold_seconds: u64,
    pub consecutive_failures: u64,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct CycleLog {
    consecutive_failures: u64,
    last_error: Option<String>,
    last_attempt_at: Option<DateTime<Utc>>,
    /// Id of the most recently admitted cycle.
    started: u64,
    /// Id of the most recently finished cycle.
    finished: u64,
    /// What the `finished` cycle produced.
    last_outcome: Option<Result<Arc<Snapshot>, String>>,
}

fn lock_log(log: &Mutex<CycleLog>) -> MutexGuard<'_, CycleLog> {
    match log.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

enum Admission<'a> {
    Run(RefreshGuard<'a>),
    /// Id of the cycle already in flight.
    InFlight(u64),
}

/// Clears the in-progress flag and wakes waiters when the cycle ends,
/// however it ends. A cycle dropped without recording an outcome is
/// recorded as aborted so joined callers never wait forever.
struct RefreshGuard<'a> {
    cycle: u64,
    flag: &'a AtomicBool,
    done: &'a Notify,
    log: &'a Mutex<CycleLog>,
}

impl<'a> RefreshGuard<'a> {
    /// Flag and cycle id change under the log lock, so an `InFlight` id
    /// always names the cycle holding the flag.
    fn admit(flag: &'a AtomicBool, done: &'a Notify, log: &'a Mutex<CycleLog>) -> Admission<'a> {
        let mut state = lock_log(log);
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Admission::InFlight(state.started);
        }
        state.started += 1;
        Admission::Run(Self {
            cycle: state.started,
            flag,
            done,
            log,
        })
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = lock_log(self.log);
            if state.finished < self.cycle {
                state.finished = self.cycle;
                state.last_outcome = Some(Err("refresh cycle aborted".to_string()));
            }
        }
        self.flag.store(false, Ordering::Release);
        self.done.notify_waiters();
    }
}

/// Process-wide holder of the current [`Snapshot`].
///
/// The refresh cycle is the only writer. Publishing replaces a single
/// `Arc<Snapshot>`, so readers see either the old snapshot or the new one
/// and never wait on a cycle in flight. At most one cycle runs at a time.
///
/// # Example
/// ```ignore
/// let cache = RefreshCache::new(catalog, source)
///     .with_staleness_threshold(Duration::from_secs(1800));
///
/// cache.refresh_once().await?;
/// if let Some(snapshot) = cache.get() {
///     println!("{}", snapshot.summary().overall_status);
/// }
/// ```
pub struct RefreshCache {
    catalog: Arc<IndicatorCatalog>,
    source: Arc<dyn ValueSource>,
    scoring: ScoringConfig,
    bands: StatusBands,
    staleness_threshold: Duration,
    current: RwLock<Option<Arc<Snapshot>>>,
    refreshing: AtomicBool,
    cycle_done: Notify,
    cycle_log: Mutex<CycleLog>,
    metrics: Option<Metrics>,
}

impl RefreshCache {
    pub fn new(catalog: Arc<IndicatorCatalog>, source: Arc<dyn ValueSource>) -> Self {
        Self {
            catalog,
            source,
            scoring: ScoringConfig::default(),
            bands: StatusBands::default(),
            staleness_threshold: Duration::from_secs(30 * 60),
            current: RwLock::new(None),
            refreshing: AtomicBool::new(false),
            cycle_done: Notify::new(),
            cycle_log: Mutex::new(CycleLog::default()),
            metrics: None,
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_status_bands(mut self, bands: StatusBands) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Start `Ready` from a previously persisted snapshot.
    pub fn with_initial_snapshot(self, snapshot: Snapshot) -> Self {
        info!(
            "RefreshCache: Seeded with snapshot captured at {}",
            snapshot.captured_at()
        );
        self.publish(Arc::new(snapshot));
        self
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    /// The currently served snapshot, `None` while empty.
    pub fn get(&self) -> Option<Arc<Snapshot>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn get_snapshot(&self) -> Result<Arc<Snapshot>, CacheError> {
        self.get().ok_or(CacheError::NotAvailable)
    }

    pub fn get_summary(&self) -> Result<Summary, CacheError> {
        self.get_snapshot()
            .map(|snapshot| snapshot.summary().clone())
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn state(&self) -> CacheState {
        if self.get().is_none() {
            CacheState::Empty
        } else if self.is_refreshing() {
            CacheState::Refreshing
        } else {
            CacheState::Ready
        }
    }

    pub fn health(&self) -> CacheHealth {
        let snapshot = self.get();
        let age = snapshot.as_ref().map(|s| s.age());
        let is_stale = age.is_some_and(|age| age > self.staleness_threshold);
        let log = lock_log(&self.cycle_log);

        CacheHealth {
            state: self.state(),
            captured_at: snapshot.as_ref().map(|s| s.captured_at()),
            age_seconds: age.map(|a| a.as_secs()),
            is_stale,
            staleness_threshold_seconds: self.staleness_threshold.as_secs(),
            consecutive_failures: log.consecutive_failures,
            last_error: log.last_error.clone(),
            last_attempt_at: log.last_attempt_at,
        }
    }

    /// Run one refresh cycle unless one is already running.
    ///
    /// On failure the previously served snapshot is left untouched.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome, CycleError> {
        match self.admit() {
            Admission::Run(guard) => self.run_admitted(guard).await.map(RefreshOutcome::Refreshed),
            Admission::InFlight(cycle) => {
                debug!("RefreshCache: Cycle {} already in progress, skipping", cycle);
                self.record_skip();
                Ok(RefreshOutcome::Skipped)
            }
        }
    }

    /// Refresh now and return the resulting snapshot.
    ///
    /// If a cycle is already running, waits for it and returns what that
    /// cycle committed, or its error if it failed.
    pub async fn force_refresh(&self) -> Result<Arc<Snapshot>, CycleError> {
        match self.admit() {
            Admission::Run(guard) => self.run_admitted(guard).await,
            Admission::InFlight(cycle) => {
                info!("RefreshCache: Forced refresh joined cycle {} in flight", cycle);
                self.record_skip();
                self.wait_for(cycle).await
            }
        }
    }

    fn admit(&self) -> Admission<'_> {
        RefreshGuard::admit(&self.refreshing, &self.cycle_done, &self.cycle_log)
    }

    fn record_skip(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cycle("skipped");
        }
    }

    async fn run_admitted(&self, guard: RefreshGuard<'_>) -> Result<Arc<Snapshot>, CycleError> {
        let timer = CycleTimer::start(
            self.metrics
                .as_ref()
                .map(|m| m.refresh_duration_seconds.clone()),
        );
        let result = self.run_cycle().await;
        let elapsed = timer.finish();
        self.record_attempt(guard.cycle, &result);

        match &result {
            Ok(snapshot) => {
                let summary = snapshot.summary();
                info!(
                    "RefreshCache: Published snapshot in {:?} ({}/{} valid, avg proximity {:.1}%, {} in risk zone, status: {})",
                    elapsed,
                    summary.valid_count,
                    summary.total_count,
                    summary.average_proximity,
                    summary.risk_zone_count,
                    summary.overall_status
                );
            }
            Err(e) => {
                error!(
                    "RefreshCache: Refresh cycle failed after {:?}, keeping previous snapshot: {}",
                    elapsed, e
                );
            }
        }

        drop(guard);
        result
    }

    async fn wait_for(&self, cycle: u64) -> Result<Arc<Snapshot>, CycleError> {
        loop {
            let notified = self.cycle_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(outcome) = self.outcome_of(cycle) {
                return outcome;
            }
            notified.await;
        }
    }

    /// Outcome of `cycle` once it (or a later cycle) has finished.
    fn outcome_of(&self, cycle: u64) -> Option<Result<Arc<Snapshot>, CycleError>> {
        let log = lock_log(&self.cycle_log);
        if log.finished < cycle {
            return None;
        }
        Some(match &log.last_outcome {
            Some(Ok(snapshot)) => Ok(snapshot.clone()),
            Some(Err(reason)) => Err(CycleError::Joined {
                reason: reason.clone(),
            }),
            None => Err(CycleError::NothingPublished),
        })
    }

    async fn run_cycle(&self) -> Result<Arc<Snapshot>, CycleError> {
        let definitions = self.catalog.definitions();
        let values = self.source.fetch_current_values(definitions).await?;

        let mut present = 0;
        for def in definitions {
            match values.get(&def.id).copied().flatten() {
                Some(value) => {
                    present += 1;
                    debug!("RefreshCache: {} = {}", def.id, value);
                }
                None => {
                    warn!("RefreshCache: No value for {} this cycle", def.id);
                    if let Some(metrics) = &self.metrics {
                        metrics.record_source_failure(&def.id);
                    }
                }
            }
        }

        if present == 0 && !definitions.is_empty() {
            return Err(CycleError::NoValues {
                total: definitions.len(),
            });
        }

        let snapshot = Arc::new(Snapshot::compute(
            &self.catalog,
            &values,
            &self.scoring,
            &self.bands,
            Utc::now(),
        ));
        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    fn publish(&self, snapshot: Arc<Snapshot>) {
        if let Some(metrics) = &self.metrics {
            metrics.record_snapshot(&snapshot);
        }

        match self.current.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => {
                error!("RefreshCache: Lock poisoned during publish, recovering");
                *poisoned.into_inner() = Some(snapshot);
            }
        }
    }

    fn record_attempt(&self, cycle: u64, result: &Result<Arc<Snapshot>, CycleError>) {
        let mut log = lock_log(&self.cycle_log);
        log.last_attempt_at = Some(Utc::now());
        log.finished = cycle;

        match result {
            Ok(snapshot) => {
                log.consecutive_failures = 0;
                log.last_error = None;
                log.last_outcome = Some(Ok(snapshot.clone()));
            }
            Err(e) => {
                log.consecutive_failures += 1;
                log.last_error = Some(e.to_string());
                log.last_outcome = Some(Err(e.to_string()));
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(if result.is_ok() { "success" } else { "failure" });
        }
    }
}
