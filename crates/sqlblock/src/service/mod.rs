//! # Block Ingest Service
//!
//! The application service implementing `BlockIngestApi`.
//!
//! ## Pipeline
//!
//! ```text
//! Block ─→ build_statement ─→ Executor::execute ─→ classify ─→ caller
//!              │                 (timeout, cancel)
//!              └─→ Encoding error (executor never called)
//! ```
//!
//! The service keeps no per-block state. Two attempts for the same height may
//! run concurrently; the engine's unique key decides which one creates rows.

mod ingest;

use std::sync::Arc;

use crate::domain::value_objects::IngestConfig;
use crate::metrics::{Metrics, MetricsRecorder};
use crate::ports::outbound::Executor;

/// The Block Ingest Service.
pub struct BlockIngestService<E, M = Metrics>
where
    E: Executor,
    M: MetricsRecorder,
{
    /// Storage engine (driven port).
    pub(crate) executor: Arc<E>,
    /// Timeouts and pool limits.
    pub(crate) config: IngestConfig,
    /// Outcome counters.
    pub(crate) metrics: Arc<M>,
}

impl<E: Executor> BlockIngestService<E, Metrics> {
    /// Create a service with a fresh in-process `Metrics` collector.
    pub fn new(executor: Arc<E>, config: IngestConfig) -> Self {
        Self::with_metrics(executor, config, Arc::new(Metrics::new()))
    }
}

impl<E, M> BlockIngestService<E, M>
where
    E: Executor,
    M: MetricsRecorder,
{
    /// Create a service reporting to a custom metrics recorder.
    pub fn with_metrics(executor: Arc<E>, config: IngestConfig, metrics: Arc<M>) -> Self {
        Self {
            executor,
            config,
            metrics,
        }
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<M> {
        &self.metrics
    }
}
