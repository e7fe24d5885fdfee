//! # Executor Parity
//!
//! Submissions whose outcome depends on the order in which the engine
//! resolves conflicts and constraints. Every executor must agree on them:
//! the in-memory engine runs them here, PostgreSQL in `postgres.rs`.

#[cfg(test)]
use sqlblock::{BlockIngestApi, BlockIngestService, Executor, IngestError, Ingested};

/// Stores `fixture_block()`, then resubmits its height once per violation
/// fixture. Returns each resubmission's outcome, labelled by the constraint
/// the payload breaks.
#[cfg(test)]
pub(crate) async fn resubmit_violations<E: Executor + 'static>(
    service: &BlockIngestService<E>,
) -> Vec<(&'static str, Result<Ingested, IngestError>)> {
    use sqlblock::test_utils::*;

    let first = service.submit(fixture_block()).await;
    assert!(
        matches!(first, Ok(Ingested::Fresh { rows: 21, .. })),
        "initial submission: {:?}",
        first
    );

    let mut outcomes = Vec::new();
    for (constraint, block) in [
        ("block_check", gas_exceeded_block()),
        ("transaction_from_check", empty_sender_block()),
        ("event_topics_check", topic_overflow_block()),
    ] {
        outcomes.push((constraint, service.submit(block).await));
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlblock::test_utils::FIXTURE_HEIGHT;
    use sqlblock::{BlockIngestService, InMemoryExecutor, IngestConfig, Ingested, Table};

    use super::resubmit_violations;

    #[tokio::test]
    async fn test_in_memory_resubmissions_are_duplicates() {
        let executor = Arc::new(InMemoryExecutor::new());
        let service = BlockIngestService::new(Arc::clone(&executor), IngestConfig::default());

        for (constraint, outcome) in resubmit_violations(&service).await {
            assert_eq!(
                outcome,
                Ok(Ingested::Duplicate {
                    height: FIXTURE_HEIGHT
                }),
                "payload breaking {}",
                constraint
            );
        }

        assert_eq!(executor.row_count(Table::Block), 1);
        assert_eq!(executor.row_count(Table::Transaction), 3);
        assert_eq!(executor.row_count(Table::Event), 17);
        assert_eq!(service.metrics().snapshot().duplicate, 3);
        assert_eq!(service.metrics().snapshot().rejected, 0);
    }
}
