//! Push-based observability for cyclewatch
//!
//! Outbound data only, no HTTP server:
//!
//! 1. **Structured JSON Logs**: periodic summary/health lines on stdout
//! 2. **Prometheus registry**: rendered on demand for an external serving layer

pub mod cycle_timer;
pub mod metrics;
pub mod reporter;

pub use cycle_timer::CycleTimer;
pub use metrics::Metrics;
pub use reporter::SummaryReporter;
