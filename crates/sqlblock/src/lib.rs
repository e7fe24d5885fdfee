//! # sqlblock
//!
//! Atomic, idempotent ingestion of decoded blocks into a relational store.
//!
//! A block, its transactions and their event logs become ONE statement that
//! inserts every row or none. Re-submitting a stored height is a no-op, and
//! domain invariants are enforced by the engine's constraints, not in
//! process.
//!
//! ## Outcomes
//!
//! | Outcome              | Rows written | Retry?                    |
//! |----------------------|--------------|---------------------------|
//! | `Ingested::Fresh`    | all          | -                         |
//! | `Ingested::Duplicate`| none         | -                         |
//! | `Rejected`           | none         | no, fix the data          |
//! | `ExecutionFailure`   | unknown      | yes, idempotent           |
//! | `Encoding`           | none         | no, never sent            |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Schema, value encoding, statement builder, classifier
//! - `ports/` - `BlockIngestApi` (inbound), `Executor` (outbound)
//! - `service/` - `BlockIngestService`, the application service
//! - `adapters/` - In-memory and PostgreSQL executors
//! - `metrics` - Outcome counters
//!
//! ## Usage
//!
//! ```ignore
//! use sqlblock::{BlockIngestApi, BlockIngestService, IngestConfig, PostgresExecutor};
//!
//! let config = IngestConfig::from_env()?;
//! let executor = PostgresExecutor::connect(&config).await?;
//! executor.ensure_schema().await?;
//!
//! let service = BlockIngestService::new(Arc::new(executor), config);
//! match service.submit(block).await? {
//!     Ingested::Fresh { rows, .. } => println!("stored {} rows", rows),
//!     Ingested::Duplicate { .. } => println!("already stored"),
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export key types for convenience
pub use adapters::memory::{InMemoryExecutor, StoredRow};
#[cfg(feature = "postgres")]
pub use adapters::postgres::{PostgresExecutor, PostgresSetupError};
pub use domain::builder::build_statement;
pub use domain::classifier::{classify, Ingested};
pub use domain::encoding::{SqlType, SqlValue};
pub use domain::errors::{EncodingError, ExecutorError, IngestError};
pub use domain::schema::{Check, Table, MAX_TOPICS, SCHEMA_SQL};
pub use domain::statement::{OnConflict, RowInsert, Statement};
pub use domain::value_objects::{ConfigError, IngestConfig};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::inbound::BlockIngestApi;
pub use ports::outbound::{ExecutionReport, Executor};
pub use service::BlockIngestService;

pub use shared_types::{Block, EventLog, Transaction};
