//! Profile cache statistics
//!
//! Counters are plain atomics so recording never contends with cache access.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of profile cache activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileCacheStats {
    /// Current number of cached profiles
    pub entries: usize,

    /// Fetches currently outstanding
    pub in_flight: usize,

    /// Reads served from the cache
    pub hits: u64,

    /// Reads that started a remote fetch
    pub misses: u64,

    /// Reads that joined a fetch already in flight
    pub coalesced: u64,

    /// Remote fetches that produced a profile
    pub fetches: u64,

    /// Remote fetches that failed
    pub failures: u64,

    /// Entries dropped because they outlived the configured TTL
    pub expirations: u64,
}

impl ProfileCacheStats {
    /// Fraction of reads answered without a new remote fetch.
    ///
    /// Coalesced reads count as hits: they did not cause a remote call.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.coalesced;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }

    /// Total number of `get` calls observed
    pub fn total_reads(&self) -> u64 {
        self.hits + self.misses + self.coalesced
    }
}

#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
    expirations: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize, in_flight: usize) -> ProfileCacheStats {
        ProfileCacheStats {
            entries,
            in_flight,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}
