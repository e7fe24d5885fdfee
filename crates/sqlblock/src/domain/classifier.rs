//! # Outcome Classifier
//!
//! Maps what the engine reported for a statement onto ingestion semantics.
//!
//! | Engine result                         | Outcome                        |
//! |---------------------------------------|--------------------------------|
//! | committed, `rows == row_count()`      | `Ingested::Fresh`              |
//! | committed, `rows == 0`                | `Ingested::Duplicate`          |
//! | committed, any other count            | `ExecutionFailure`             |
//! | constraint violation                  | `Rejected` (not retryable)     |
//! | any other executor error              | `ExecutionFailure` (retryable) |

use crate::domain::errors::{ExecutorError, IngestError};
use crate::domain::statement::Statement;
use crate::ports::outbound::ExecutionReport;

/// Successful outcome of one ingestion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Every row of the block was created by this attempt.
    Fresh { height: u64, rows: u64 },
    /// The block already existed; nothing was written.
    Duplicate { height: u64 },
}

impl Ingested {
    pub fn height(&self) -> u64 {
        match self {
            Ingested::Fresh { height, .. } | Ingested::Duplicate { height } => *height,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Ingested::Duplicate { .. })
    }

    /// Rows this attempt inserted.
    pub fn rows_inserted(&self) -> u64 {
        match self {
            Ingested::Fresh { rows, .. } => *rows,
            Ingested::Duplicate { .. } => 0,
        }
    }
}

/// Classify the executor's result for `statement`.
pub fn classify(
    statement: &Statement,
    result: Result<ExecutionReport, ExecutorError>,
) -> Result<Ingested, IngestError> {
    let height = statement.height();
    match result {
        Ok(report) => {
            let expected = statement.row_count();
            match report.rows_affected {
                0 => Ok(Ingested::Duplicate { height }),
                rows if rows == expected => Ok(Ingested::Fresh { height, rows }),
                actual => Err(IngestError::ExecutionFailure {
                    height,
                    source: ExecutorError::UnexpectedRowCount { expected, actual },
                }),
            }
        }
        Err(ExecutorError::ConstraintViolation {
            constraint,
            message,
        }) => Err(IngestError::Rejected {
            height,
            constraint,
            reason: message,
        }),
        Err(source) => Err(IngestError::ExecutionFailure { height, source }),
    }
}
