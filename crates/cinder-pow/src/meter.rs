//! Hashrate metering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Aggregate attempt counter shared by all search workers.
///
/// Workers batch their updates (one `mark` per 2^15 attempts) so the
/// atomic add stays off the hot path. Updates are fire-and-forget; a
/// missed batch only skews the reading.
pub struct HashrateMeter {
    hashes: AtomicU64,
    started: Instant,
}

impl HashrateMeter {
    /// Meter starting now.
    pub fn new() -> Self {
        Self {
            hashes: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record a batch of attempts.
    pub fn mark(&self, attempts: u64) {
        self.hashes.fetch_add(attempts, Ordering::Relaxed);
    }

    /// Total attempts recorded.
    pub fn total(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    /// Average attempts per second since construction.
    pub fn rate(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }
        self.total() as f64 / elapsed
    }
}

impl Default for HashrateMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_accumulate() {
        let meter = HashrateMeter::new();
        meter.mark(1 << 15);
        meter.mark(1 << 15);
        assert_eq!(meter.total(), 2 << 15);
        assert!(meter.rate() > 0.0);
    }
}
