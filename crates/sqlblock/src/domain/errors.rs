//! # Domain Errors
//!
//! Error types for the ingestion pipeline.
//!
//! ## Layers
//!
//! - `EncodingError`: the builder could not render a field. Fatal for the
//!   attempt, not retryable without fixing the input.
//! - `ExecutorError`: what an `Executor` reports back from the engine.
//! - `IngestError`: the caller-facing classification of a failed attempt.

use std::time::Duration;
use thiserror::Error;

/// A field value that cannot be rendered into a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Integer does not fit into a signed 64-bit column.
    #[error("{field}: {value} is out of range for BIGINT")]
    OutOfRange { field: &'static str, value: u64 },

    /// Big-number field is not a plain decimal string.
    #[error("{field}: {value:?} is not a decimal number")]
    InvalidDecimal { field: &'static str, value: String },

    /// Text contains a NUL byte, which the engine cannot store.
    #[error("{field}: text contains a NUL byte")]
    NulInText { field: &'static str },
}

/// Failure reported by an `Executor`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The engine rejected the statement on a uniqueness, foreign-key or
    /// check constraint. Nothing from the statement was persisted.
    #[error("constraint `{constraint}` violated: {message}")]
    ConstraintViolation { constraint: String, message: String },

    /// Could not reach the engine.
    #[error("connection error: {0}")]
    Connection(String),

    /// Statement did not complete within the allotted time.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the attempt.
    #[error("execution cancelled")]
    Cancelled,

    /// Any other engine-side failure (serialization failure, deadlock, ...).
    #[error("database error: {0}")]
    Database(String),

    /// The engine reported an affected-row count that matches neither a
    /// fresh insert nor a duplicate.
    #[error("unexpected affected row count {actual} (expected 0 or {expected})")]
    UnexpectedRowCount { expected: u64, actual: u64 },
}

impl ExecutorError {
    /// Whether the engine rejected the data itself.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, ExecutorError::ConstraintViolation { .. })
    }
}

/// Caller-facing failure of one ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The block could not be encoded into a statement.
    #[error("block {height}: cannot encode statement: {source}")]
    Encoding {
        height: u64,
        #[source]
        source: EncodingError,
    },

    /// The engine rejected the block's data; every row was rolled back.
    #[error("block {height} rejected by `{constraint}`: {reason}")]
    Rejected {
        height: u64,
        constraint: String,
        reason: String,
    },

    /// Transport-level failure; persistence state unknown to the caller.
    #[error("block {height}: execution failed: {source}")]
    ExecutionFailure {
        height: u64,
        #[source]
        source: ExecutorError,
    },
}

impl IngestError {
    /// Height of the block this failure belongs to.
    pub fn height(&self) -> u64 {
        match self {
            IngestError::Encoding { height, .. }
            | IngestError::Rejected { height, .. }
            | IngestError::ExecutionFailure { height, .. } => *height,
        }
    }

    /// Only execution failures may be retried as-is.
    ///
    /// Retrying is safe: an attempt that did not commit left zero rows, and
    /// one that did commit makes the retry a duplicate no-op.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::ExecutionFailure { .. })
    }
}
