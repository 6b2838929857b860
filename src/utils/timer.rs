// file: src/utils/timer.rs
// description: phase timing for pipeline steps

use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Logs how long one pipeline phase (write, embed, build, save, query) took.
pub struct OperationTimer {
    phase: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!(phase = self.phase, "done in {:.2}s", elapsed.as_secs_f64());
        elapsed
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 { count as f64 / secs } else { 0.0 };
        info!(
            phase = self.phase,
            "{} item(s) in {:.2}s ({:.1}/s)",
            count,
            secs,
            rate
        );
        elapsed
    }

    pub fn warn_if_slow(&self, threshold: Duration) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                phase = self.phase,
                "slow: {:.2}s (threshold {:.2}s)",
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}
