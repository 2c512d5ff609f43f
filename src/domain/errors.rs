use thiserror::Error;

/// Fatal problems found while loading the indicator catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Indicator id must not be empty")]
    EmptyId,

    #[error("Duplicate indicator id: {id}")]
    DuplicateId { id: String },

    #[error("Invalid reference threshold for {id}: {value} (must be finite and non-zero)")]
    InvalidReference { id: String, value: f64 },

    #[error("Invalid safety ceiling for {id}: {ceiling} must be finite and above reference {reference}")]
    InvalidSafetyCeiling {
        id: String,
        ceiling: f64,
        reference: f64,
    },

    #[error("Invalid decay window for {id}: {window} (must be finite and > 1)")]
    InvalidDecayWindow { id: String, window: f64 },

    #[error("Failed to parse catalog: {reason}")]
    Parse { reason: String },

    #[error("Failed to read catalog file {path}: {reason}")]
    Io { path: String, reason: String },
}

/// A value source could not produce a value for one indicator, or failed a bulk call.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source {source_name} unavailable for {indicator}: {reason}")]
    Unavailable {
        source_name: String,
        indicator: String,
        reason: String,
    },

    #[error("Source call for {indicator} timed out after {duration_ms}ms")]
    Timeout { indicator: String, duration_ms: u64 },
}

/// A whole refresh cycle failed before anything was published.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Value source failed for the whole cycle: {0}")]
    Source(#[from] SourceError),

    #[error("No indicator produced a value ({total} requested)")]
    NoValues { total: usize },

    #[error("Refresh finished without publishing a snapshot")]
    NothingPublished,

    #[error("Joined refresh cycle failed: {reason}")]
    Joined { reason: String },
}

/// Read-side errors exposed to the serving layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Snapshot not yet available")]
    NotAvailable,
}
