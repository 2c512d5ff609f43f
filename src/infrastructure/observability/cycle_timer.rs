use prometheus::Histogram;
use std::time::{Duration, Instant};

/// Times one refresh cycle into a histogram.
///
/// Observes on [`CycleTimer::finish`] or, if the cycle unwinds early, on drop.
pub struct CycleTimer {
    start: Instant,
    histogram: Option<Histogram>,
}

impl CycleTimer {
    pub fn start(histogram: Option<Histogram>) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the cycle and return its duration.
    pub fn finish(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if let Some(histogram) = self.histogram.take() {
            histogram.observe(elapsed.as_secs_f64());
        }
        elapsed
    }
}

impl Drop for CycleTimer {
    fn drop(&mut self) {
        if let Some(histogram) = self.histogram.take() {
            histogram.observe(self.start.elapsed().as_secs_f64());
        }
    }
}
