//! # PostgreSQL Scenarios
//!
//! The same ingestion scenarios against a live database. Skipped unless
//! `SQLBLOCK_DATABASE_URL` is set.
//!
//! All scenarios share one database and truncate it between steps, so they
//! run sequentially inside a single test.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use sqlblock::test_utils::*;
    use sqlblock::{
        BlockIngestApi, BlockIngestService, IngestConfig, IngestError, Ingested, PostgresExecutor,
        Table,
    };

    use crate::integration::parity::resubmit_violations;

    async fn connect() -> Option<PostgresExecutor> {
        let url = std::env::var("SQLBLOCK_DATABASE_URL").ok()?;
        let config = IngestConfig::default().with_database_url(url);
        let executor = PostgresExecutor::connect(&config).await.unwrap();
        executor.ensure_schema().await.unwrap();
        Some(executor)
    }

    async fn counts(executor: &PostgresExecutor) -> (u64, u64, u64) {
        (
            executor.row_count(Table::Block).await.unwrap(),
            executor.row_count(Table::Transaction).await.unwrap(),
            executor.row_count(Table::Event).await.unwrap(),
        )
    }

    async fn expect_rejected(
        service: &BlockIngestService<PostgresExecutor>,
        block: sqlblock::Block,
        expected_constraint: &str,
    ) {
        service.executor().truncate().await.unwrap();
        match service.submit(block).await {
            Err(IngestError::Rejected { constraint, .. }) => {
                assert_eq!(constraint, expected_constraint)
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(counts(service.executor()).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_postgres_scenarios() {
        let Some(executor) = connect().await else {
            eprintln!("SQLBLOCK_DATABASE_URL not set; skipping PostgreSQL scenarios");
            return;
        };
        let config = IngestConfig::default().with_statement_timeout(Duration::from_secs(60));
        let service = BlockIngestService::new(Arc::new(executor), config);
        let executor = Arc::clone(service.executor());

        // Fresh
        executor.truncate().await.unwrap();
        let outcome = service.submit(fixture_block()).await.unwrap();
        assert_eq!(
            outcome,
            Ingested::Fresh {
                height: 60034225,
                rows: 21
            }
        );
        assert_eq!(counts(&executor).await, (1, 3, 17));

        // Duplicate
        let outcome = service.submit(fixture_block()).await.unwrap();
        assert_eq!(outcome, Ingested::Duplicate { height: 60034225 });
        assert_eq!(counts(&executor).await, (1, 3, 17));

        // Stored height wins over any constraint the resubmission breaks
        executor.truncate().await.unwrap();
        for (constraint, outcome) in resubmit_violations(&service).await {
            assert_eq!(
                outcome,
                Ok(Ingested::Duplicate { height: 60034225 }),
                "payload breaking {}",
                constraint
            );
        }
        assert_eq!(counts(&executor).await, (1, 3, 17));

        // Rollback
        expect_rejected(&service, gas_exceeded_block(), "block_check").await;
        expect_rejected(&service, empty_sender_block(), "transaction_from_check").await;
        expect_rejected(&service, topic_overflow_block(), "event_topics_check").await;

        // Duplicate transaction index within one block
        let mut block = make_block(5, 0, 0);
        block.transactions = vec![make_transaction(0, 0), make_transaction(0, 0)];
        expect_rejected(&service, block, "transaction_block_height_index_key").await;

        // Ordering: generated ids follow index order
        executor.truncate().await.unwrap();
        let mut block = make_block(900, 0, 0);
        block.transactions = (0..8).rev().map(|i| make_transaction(i, 0)).collect();
        service.submit(block).await.unwrap();
        let indexes: Vec<i64> = sqlx::query_scalar(
            r#"SELECT "index" FROM "transaction" WHERE "block_height" = 900 ORDER BY "id""#,
        )
        .fetch_all(executor.pool())
        .await
        .unwrap();
        assert_eq!(indexes, (0..8).collect::<Vec<i64>>());

        // Large payload
        executor.truncate().await.unwrap();
        service.submit(huge_fixture_block()).await.unwrap();
        assert_eq!(counts(&executor).await.1, 2);
        assert_eq!(
            executor
                .input_length(HUGE_FIXTURE_HEIGHT, 0)
                .await
                .unwrap(),
            Some(HUGE_INPUT_LEN as u64)
        );

        // Concurrent submissions of one height
        executor.truncate().await.unwrap();
        let service = Arc::new(service);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.submit(fixture_block()).await })
            })
            .collect();
        let mut fresh = 0;
        for handle in handles {
            if !handle.await.unwrap().unwrap().is_duplicate() {
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
        assert_eq!(counts(&executor).await, (1, 3, 17));

        executor.truncate().await.unwrap();
    }
}
