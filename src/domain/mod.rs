// Indicator definitions and readings
pub mod indicator;

// Validated indicator catalog
pub mod catalog;

// Proximity scoring
pub mod proximity;

// Aggregation of readings into a summary
pub mod summary;

// Immutable published snapshot
pub mod snapshot;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
