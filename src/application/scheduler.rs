use crate::application::refresh_cache::{RefreshCache, RefreshOutcome};
use crate::infrastructure::persistence::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Drives [`RefreshCache::refresh_once`] on a fixed interval and mirrors each
/// published snapshot to disk.
///
/// Ticks that land while a cycle is still running are dropped, not queued.
pub struct RefreshScheduler {
    cache: Arc<RefreshCache>,
    interval: Duration,
    store: Option<SnapshotStore>,
}

impl RefreshScheduler {
    pub fn new(cache: Arc<RefreshCache>, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            store: None,
        }
    }

    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first tick fires after one full interval; callers perform the
    /// startup refresh themselves.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "RefreshScheduler started (interval: {}s)",
            self.interval.as_secs_f64()
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("RefreshScheduler: Shutdown requested, stopping");
                        break;
                    }
                }
            }
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn tick(&self) {
        match self.cache.refresh_once().await {
            Ok(RefreshOutcome::Refreshed(snapshot)) => {
                if let Some(store) = &self.store
                    && let Err(e) = store.save(&snapshot)
                {
                    // The in-memory snapshot is authoritative; the mirror catches up next cycle.
                    error!("RefreshScheduler: Failed to persist snapshot: {:#}", e);
                }
            }
            Ok(RefreshOutcome::Skipped) => {
                debug!("RefreshScheduler: Tick skipped, previous cycle still running");
            }
            Err(e) => {
                warn!("RefreshScheduler: Scheduled refresh failed: {}", e);
            }
        }
    }
}
