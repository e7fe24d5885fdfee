//! # Outbound Ports (Driven Ports)
//!
//! The storage engine seen from the ingestion core.

use async_trait::async_trait;

use crate::domain::errors::ExecutorError;
use crate::domain::statement::Statement;

/// What the engine reports for a committed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionReport {
    /// Rows the statement inserted across all relations.
    pub rows_affected: u64,
}

/// Runs one `Statement` as a single atomic unit.
///
/// ## Contract
///
/// - `Ok(report)`: the unit committed. `rows_affected` is either the
///   statement's full row count or zero (block already present).
/// - `Err(ConstraintViolation)`: the engine rejected the data and rolled the
///   whole unit back.
/// - Any other `Err`: persistence state is unknown to the caller.
///
/// Implementations must not hold a connection or lock beyond one call.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<ExecutionReport, ExecutorError>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for std::sync::Arc<E> {
    async fn execute(&self, statement: &Statement) -> Result<ExecutionReport, ExecutorError> {
        (**self).execute(statement).await
    }
}
