//! Crawl statistics
//!
//! Counters are owned by the frontier and only mutated from the coordinator
//! task, so plain integers are enough.

use serde::{Deserialize, Serialize};

/// Aggregate crawl counters
///
/// Invariant: `total == successful + failed + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Pages fetched and extracted
    pub successful: u64,

    /// Pages that failed with a network, timeout or HTTP error
    pub failed: u64,

    /// Non-HTML responses and robots.txt refusals
    #[serde(default)]
    pub skipped: u64,

    /// All dispatched URLs that reported back
    pub total: u64,
}

impl CrawlStats {
    /// Creates zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
        self.total += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
        self.total += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
        self.total += 1;
    }

    /// Returns the success rate as a percentage of all attempts
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.successful as f64 / self.total as f64) * 100.0
    }
}

/// Writes a one-line statistics summary to the log
pub fn log_statistics(stats: &CrawlStats) {
    tracing::info!(
        "Crawl statistics: {} successful, {} failed, {} skipped, {} total ({:.1}% success)",
        stats.successful,
        stats.failed,
        stats.skipped,
        stats.total,
        stats.success_rate()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_keep_total_consistent() {
        let mut stats = CrawlStats::new();
        stats.record_success();
        stats.record_success();
        stats.record_failure();
        stats.record_skip();

        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.total, 4);
        assert_eq!(
            stats.total,
            stats.successful + stats.failed + stats.skipped
        );
    }

    #[test]
    fn test_success_rate() {
        let mut stats = CrawlStats::new();
        for _ in 0..4 {
            stats.record_success();
        }
        stats.record_failure();

        assert!((stats.success_rate() - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_pages() {
        assert_eq!(CrawlStats::new().success_rate(), 0.0);
    }

    #[test]
    fn test_serialized_shape() {
        let mut stats = CrawlStats::new();
        stats.record_success();
        let value = serde_json::to_value(stats).unwrap();

        assert_eq!(value["successful"], 1);
        assert_eq!(value["failed"], 0);
        assert_eq!(value["total"], 1);
    }
}
