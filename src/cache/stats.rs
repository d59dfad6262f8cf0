//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, expirations, evictions and refreshes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads served from a fresh resident entry
    pub hits: u64,
    /// Reads that found no resident entry (including expired ones)
    pub misses: u64,
    /// Entries purged lazily because they went stale
    pub expirations: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Values updated in place by the refresh cycle
    pub refreshes: u64,
    /// Backing store failures hit during refresh cycles
    pub refresh_failures: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// An expiration is also a miss for the reader that found it.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_refresh(&mut self) {
        self.refreshes += 1;
    }

    pub fn record_refresh_failure(&mut self) {
        self.refresh_failures += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
