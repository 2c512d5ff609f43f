// Snapshot holder with single-flight refresh
pub mod refresh_cache;

// Periodic refresh driver
pub mod scheduler;

pub use refresh_cache::{CacheHealth, CacheState, RefreshCache, RefreshOutcome};
pub use scheduler::RefreshScheduler;
