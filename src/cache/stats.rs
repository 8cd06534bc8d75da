//! Cache Statistics Module
//!
//! Tracks hit, miss and housekeeping counters for the in-process store and
//! the multi-level orchestrator.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of in-process store metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of failed retrievals (key not found or expired)
    pub misses: u64,
    /// Number of expired entries removed by the background sweep
    pub expired_reaped: u64,
    /// Entries physically held, including expired ones not yet swept
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        hit_rate(self.hits, self.misses)
    }
}

/// Live counters behind [`CacheStats`], shared with the sweep task.
#[derive(Debug, Default)]
pub(crate) struct StoreCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    reaped: AtomicU64,
}

impl StoreCounters {
    pub(crate) fn record_hits(&self, n: u64) {
        self.hits.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_misses(&self, n: u64) {
        self.misses.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_reaped(&self, n: u64) {
        self.reaped.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_reaped: self.reaped.load(Ordering::Relaxed),
            total_entries,
        }
    }
}

// == Multi-Level Stats ==
/// Snapshot of orchestrator metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MultiLevelStats {
    /// Reads satisfied by each level, index 0 = nearest
    pub level_hits: Vec<u64>,
    /// Reads that missed every level
    pub misses: u64,
    /// Successful writes of a deep hit into a shallower level
    pub backfills: u64,
    /// Backfill or set-nx replication writes that failed and were swallowed
    pub backfill_failures: u64,
    /// Per-level failures during fan-out writes
    pub fanout_failures: u64,
}

impl MultiLevelStats {
    /// Fraction of reads satisfied by any level.
    pub fn hit_rate(&self) -> f64 {
        hit_rate(self.level_hits.iter().sum(), self.misses)
    }
}

#[derive(Debug)]
pub(crate) struct LevelCounters {
    level_hits: Vec<AtomicU64>,
    misses: AtomicU64,
    backfills: AtomicU64,
    backfill_failures: AtomicU64,
    fanout_failures: AtomicU64,
}

impl LevelCounters {
    pub(crate) fn new(levels: usize) -> Self {
        Self {
            level_hits: (0..levels).map(|_| AtomicU64::new(0)).collect(),
            misses: AtomicU64::new(0),
            backfills: AtomicU64::new(0),
            backfill_failures: AtomicU64::new(0),
            fanout_failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_hit(&self, level: usize) {
        if let Some(counter) = self.level_hits.get(level) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_backfill(&self) {
        self.backfills.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_backfill_failure(&self) {
        self.backfill_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fanout_failure(&self) {
        self.fanout_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MultiLevelStats {
        MultiLevelStats {
            level_hits: self
                .level_hits
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            misses: self.misses.load(Ordering::Relaxed),
            backfills: self.backfills.load(Ordering::Relaxed),
            backfill_failures: self.backfill_failures.load(Ordering::Relaxed),
            fanout_failures: self.fanout_failures.load(Ordering::Relaxed),
        }
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        assert_eq!(MultiLevelStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_store_counters_snapshot() {
        let counters = StoreCounters::default();
        counters.record_hits(3);
        counters.record_misses(1);
        counters.record_reaped(2);

        let stats = counters.snapshot(7);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired_reaped, 2);
        assert_eq!(stats.total_entries, 7);
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_level_counters_snapshot() {
        let counters = LevelCounters::new(2);
        counters.record_hit(0);
        counters.record_hit(1);
        counters.record_hit(1);
        counters.record_hit(5); // out of range, ignored
        counters.record_miss();
        counters.record_backfill();
        counters.record_fanout_failure();

        let stats = counters.snapshot();
        assert_eq!(stats.level_hits, vec![1, 2]);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.backfills, 1);
        assert_eq!(stats.backfill_failures, 0);
        assert_eq!(stats.fanout_failures, 1);
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
