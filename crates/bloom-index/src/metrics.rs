//! Metrics and tracing hooks for bloom index operations
//!
//! Provides instrumentation points for monitoring the index's size,
//! membership-test outcomes, and rebuild cost.
//!
//! ## Usage
//!
//! ```ignore
//! use qc_07_bloom_filters::metrics::{Metrics, MetricsRecorder};
//!
//! let metrics = Metrics::new();
//! metrics.record_index_initialized(4096);
//!
//! let start = std::time::Instant::now();
//! let maybe_present = service.test(&query);
//! metrics.record_test(start.elapsed(), maybe_present);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collector for bloom index operations.
///
/// Thread-safe counters and gauges for monitoring index performance.
#[derive(Default)]
pub struct Metrics {
    /// Total keys inserted
    pub keys_inserted: AtomicU64,
    /// Total keys removed
    pub keys_removed: AtomicU64,
    /// Total membership tests performed
    pub tests_performed: AtomicU64,
    /// Total tests that returned "maybe"
    pub tests_positive: AtomicU64,
    /// Total rebuilds performed
    pub rebuilds_performed: AtomicU64,
    /// Bytes allocated for the index (fixed once set)
    pub bytes_allocated: AtomicU64,
    /// Cumulative test time in nanoseconds
    pub test_time_ns: AtomicU64,
    /// Cumulative rebuild time in nanoseconds
    pub rebuild_time_ns: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the index's fixed byte allocation once it's sized.
    pub fn record_index_initialized(&self, size_bytes: usize) {
        self.bytes_allocated.store(size_bytes as u64, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.keys_inserted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remove(&self) {
        self.keys_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a `test()` call.
    ///
    /// `maybe_present` is the filter's own answer, not ground truth — this
    /// tracks hit rate, not accuracy.
    pub fn record_test(&self, duration: Duration, maybe_present: bool) {
        self.tests_performed.fetch_add(1, Ordering::Relaxed);
        self.test_time_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if maybe_present {
            self.tests_positive.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rebuild(&self, duration: Duration, entry_count: usize) {
        self.rebuilds_performed.fetch_add(1, Ordering::Relaxed);
        self.rebuild_time_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        let _ = entry_count;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            keys_inserted: self.keys_inserted.load(Ordering::Relaxed),
            keys_removed: self.keys_removed.load(Ordering::Relaxed),
            tests_performed: self.tests_performed.load(Ordering::Relaxed),
            tests_positive: self.tests_positive.load(Ordering::Relaxed),
            rebuilds_performed: self.rebuilds_performed.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            avg_test_ns: self.avg_test_time_ns(),
        }
    }

    pub fn avg_test_time_ns(&self) -> u64 {
        let total = self.test_time_ns.load(Ordering::Relaxed);
        let count = self.tests_performed.load(Ordering::Relaxed);
        if count > 0 { total / count } else { 0 }
    }

    /// Fraction of tests that came back "maybe" — includes both true hits
    /// and false positives, so it trends toward the configured target FPR
    /// as the fraction of genuinely-stored queries tested drops to zero.
    pub fn observed_positive_rate(&self) -> f64 {
        let total = self.tests_performed.load(Ordering::Relaxed);
        let positive = self.tests_positive.load(Ordering::Relaxed);
        if total > 0 { positive as f64 / total as f64 } else { 0.0 }
    }

    pub fn reset(&self) {
        self.keys_inserted.store(0, Ordering::Relaxed);
        self.keys_removed.store(0, Ordering::Relaxed);
        self.tests_performed.store(0, Ordering::Relaxed);
        self.tests_positive.store(0, Ordering::Relaxed);
        self.rebuilds_performed.store(0, Ordering::Relaxed);
        self.test_time_ns.store(0, Ordering::Relaxed);
        self.rebuild_time_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default)]
pub struct MetricsSnapshot {
    pub keys_inserted: u64,
    pub keys_removed: u64,
    pub tests_performed: u64,
    pub tests_positive: u64,
    pub rebuilds_performed: u64,
    pub bytes_allocated: u64,
    pub avg_test_ns: u64,
}

/// Trait for custom metrics recording implementations.
///
/// Implement this to integrate with an external metrics system
/// (Prometheus, StatsD, OpenTelemetry).
pub trait MetricsRecorder: Send + Sync {
    fn record_index_initialized(&self, size_bytes: usize);
    fn record_insert(&self);
    fn record_remove(&self);
    fn record_test(&self, duration: Duration, maybe_present: bool);
    fn record_rebuild(&self, duration: Duration, entry_count: usize);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_index_initialized(&self, _: usize) {}
    fn record_insert(&self) {}
    fn record_remove(&self) {}
    fn record_test(&self, _: Duration, _: bool) {}
    fn record_rebuild(&self, _: Duration, _: usize) {}
}

impl MetricsRecorder for Metrics {
    fn record_index_initialized(&self, size_bytes: usize) {
        Metrics::record_index_initialized(self, size_bytes);
    }

    fn record_insert(&self) {
        Metrics::record_insert(self);
    }

    fn record_remove(&self) {
        Metrics::record_remove(self);
    }

    fn record_test(&self, duration: Duration, maybe_present: bool) {
        Metrics::record_test(self, duration, maybe_present);
    }

    fn record_rebuild(&self, duration: Duration, entry_count: usize) {
        Metrics::record_rebuild(self, duration, entry_count);
    }
}
