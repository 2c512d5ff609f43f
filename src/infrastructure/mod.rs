pub mod core;
pub mod observability;
pub mod persistence;

// Value adapters
pub mod sentiment;
pub mod sources;
