//! Metrics hooks for block ingestion
//!
//! Counts outcomes per attempt and accumulates time spent inside the
//! executor.
//!
//! ## Usage
//!
//! ```ignore
//! use sqlblock::metrics::Metrics;
//!
//! let metrics = Arc::new(Metrics::new());
//! let service = BlockIngestService::with_metrics(executor, config, metrics.clone());
//!
//! service.submit(block).await?;
//! assert_eq!(metrics.snapshot().fresh, 1);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// Metrics collector for ingestion attempts
#[derive(Default)]
pub struct Metrics {
    /// Blocks written by this process
    pub fresh: AtomicU64,
    /// Submissions of blocks that were already stored
    pub duplicate: AtomicU64,
    /// Blocks rejected by a storage constraint
    pub rejected: AtomicU64,
    /// Blocks that could not be encoded
    pub encoding_failures: AtomicU64,
    /// Attempts that failed in transport, timed out or were cancelled
    pub execution_failures: AtomicU64,
    /// Rows inserted across all relations
    pub rows_inserted: AtomicU64,
    /// Cumulative executor time in nanoseconds
    pub execution_time_ns: AtomicU64,
    /// Attempts that reached the executor
    pub executions: AtomicU64,
    /// Rejections keyed by constraint name
    rejected_by_constraint: Mutex<BTreeMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_execution(&self, duration: Duration) {
        self.executions.fetch_add(1, Ordering::Relaxed);
        self.execution_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a block whose rows were all created
    pub fn record_fresh(&self, rows: u64, duration: Duration) {
        self.fresh.fetch_add(1, Ordering::Relaxed);
        self.rows_inserted.fetch_add(rows, Ordering::Relaxed);
        self.record_execution(duration);
    }

    pub fn record_duplicate(&self, duration: Duration) {
        self.duplicate.fetch_add(1, Ordering::Relaxed);
        self.record_execution(duration);
    }

    /// Record a rejection, counted in total and per constraint
    pub fn record_rejected(&self, constraint: &str, duration: Duration) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        *self
            .rejected_by_constraint
            .lock()
            .entry(constraint.to_string())
            .or_insert(0) += 1;
        self.record_execution(duration);
    }

    pub fn record_encoding_failure(&self) {
        self.encoding_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_execution_failure(&self, duration: Duration) {
        self.execution_failures.fetch_add(1, Ordering::Relaxed);
        self.record_execution(duration);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fresh: self.fresh.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            encoding_failures: self.encoding_failures.load(Ordering::Relaxed),
            execution_failures: self.execution_failures.load(Ordering::Relaxed),
            rows_inserted: self.rows_inserted.load(Ordering::Relaxed),
            avg_execution_ns: self.avg_execution_time_ns(),
            rejected_by_constraint: self.rejected_by_constraint.lock().clone(),
        }
    }

    /// Average executor time in nanoseconds
    pub fn avg_execution_time_ns(&self) -> u64 {
        let total = self.execution_time_ns.load(Ordering::Relaxed);
        let count = self.executions.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.fresh.store(0, Ordering::Relaxed);
        self.duplicate.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.encoding_failures.store(0, Ordering::Relaxed);
        self.execution_failures.store(0, Ordering::Relaxed);
        self.rows_inserted.store(0, Ordering::Relaxed);
        self.execution_time_ns.store(0, Ordering::Relaxed);
        self.executions.store(0, Ordering::Relaxed);
        self.rejected_by_constraint.lock().clear();
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub fresh: u64,
    pub duplicate: u64,
    pub rejected: u64,
    pub encoding_failures: u64,
    pub execution_failures: u64,
    pub rows_inserted: u64,
    pub avg_execution_ns: u64,
    pub rejected_by_constraint: BTreeMap<String, u64>,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to export ingestion metrics to an external system.
pub trait MetricsRecorder: Send + Sync {
    /// Block written; `rows` across all relations.
    fn record_fresh(&self, rows: u64, duration: Duration);

    /// Block was already stored.
    fn record_duplicate(&self, duration: Duration);

    /// Block rejected by the named constraint.
    fn record_rejected(&self, constraint: &str, duration: Duration);

    /// Block could not be encoded; the executor was not called.
    fn record_encoding_failure(&self);

    /// Transport failure, timeout, cancellation or unexpected count.
    fn record_execution_failure(&self, duration: Duration);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_fresh(&self, _: u64, _: Duration) {}
    fn record_duplicate(&self, _: Duration) {}
    fn record_rejected(&self, _: &str, _: Duration) {}
    fn record_encoding_failure(&self) {}
    fn record_execution_failure(&self, _: Duration) {}
}

impl MetricsRecorder for Metrics {
    fn record_fresh(&self, rows: u64, duration: Duration) {
        Metrics::record_fresh(self, rows, duration);
    }

    fn record_duplicate(&self, duration: Duration) {
        Metrics::record_duplicate(self, duration);
    }

    fn record_rejected(&self, constraint: &str, duration: Duration) {
        Metrics::record_rejected(self, constraint, duration);
    }

    fn record_encoding_failure(&self) {
        Metrics::record_encoding_failure(self);
    }

    fn record_execution_failure(&self, duration: Duration) {
        Metrics::record_execution_failure(self, duration);
    }
}
