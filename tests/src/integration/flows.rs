//! # Ingestion Flows
//!
//! Drives `BlockIngestService` end to end against the in-memory engine, with
//! the Prometheus recorder from `ingest-telemetry` collecting outcomes.
//!
//! ## Flows Tested:
//!
//! 1. **Fresh / duplicate**: 1/3/17 rows, then unchanged on resubmission
//! 2. **Rollback**: gas, empty sender and topic overflow leave 0/0/0
//! 3. **Ordering**: storage order follows `index`, not submission order
//! 4. **Large payloads**: 1,126,340 bytes of call data stored whole
//! 5. **Concurrency and retry**

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ingest_telemetry::PrometheusRecorder;
    use rand::seq::SliceRandom;
    use sqlblock::test_utils::*;
    use sqlblock::{
        BlockIngestApi, BlockIngestService, ExecutorError, InMemoryExecutor, IngestConfig,
        IngestError, Ingested, SqlValue, Table,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        executor: Arc<InMemoryExecutor>,
        recorder: Arc<PrometheusRecorder>,
        service: BlockIngestService<InMemoryExecutor, PrometheusRecorder>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_executor(InMemoryExecutor::new(), IngestConfig::default())
        }

        fn with_executor(executor: InMemoryExecutor, config: IngestConfig) -> Self {
            let executor = Arc::new(executor);
            let recorder = Arc::new(PrometheusRecorder::new("sqlblock").unwrap());
            let service =
                BlockIngestService::with_metrics(Arc::clone(&executor), config, Arc::clone(&recorder));
            Self {
                executor,
                recorder,
                service,
            }
        }

        fn counts(&self) -> (u64, u64, u64) {
            (
                self.executor.row_count(Table::Block),
                self.executor.row_count(Table::Transaction),
                self.executor.row_count(Table::Event),
            )
        }
    }

    // =============================================================================
    // FRESH AND DUPLICATE
    // =============================================================================

    #[tokio::test]
    async fn test_fresh_ingestion_creates_all_rows() {
        let harness = Harness::new();

        let outcome = harness.service.submit(fixture_block()).await.unwrap();

        assert_eq!(outcome.height(), 60034225);
        assert_eq!(outcome.rows_inserted(), 21);
        assert_eq!(harness.counts(), (1, 3, 17));
        assert_eq!(harness.recorder.outcome_count("fresh"), 1);
    }

    #[tokio::test]
    async fn test_duplicate_ingestion_leaves_counts_unchanged() {
        let harness = Harness::new();

        harness.service.submit(fixture_block()).await.unwrap();
        let second = harness.service.submit(fixture_block()).await.unwrap();

        assert_eq!(second, Ingested::Duplicate { height: 60034225 });
        assert_eq!(harness.counts(), (1, 3, 17));
        assert_eq!(harness.recorder.outcome_count("duplicate"), 1);
    }

    #[tokio::test]
    async fn test_sequence_is_stored() {
        let harness = Harness::new();

        harness
            .service
            .submit(make_block(500, 1, 0).with_sequence(7))
            .await
            .unwrap();

        let blocks = harness.executor.rows(Table::Block);
        assert_eq!(blocks[0].get("sequence"), Some(&SqlValue::BigInt(7)));
    }

    // =============================================================================
    // ROLLBACK
    // =============================================================================

    async fn assert_rejected(block: sqlblock::Block, expected_constraint: &str) {
        let harness = Harness::new();

        let err = harness.service.submit(block).await.unwrap_err();

        match &err {
            IngestError::Rejected {
                height, constraint, ..
            } => {
                assert_eq!(*height, 60034225);
                assert_eq!(constraint, expected_constraint);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(harness.counts(), (0, 0, 0));
        assert_eq!(harness.recorder.outcome_count("rejected"), 1);
    }

    #[tokio::test]
    async fn test_gas_violation_rolls_back() {
        assert_rejected(gas_exceeded_block(), "block_check").await;
    }

    #[tokio::test]
    async fn test_empty_sender_rolls_back() {
        assert_rejected(empty_sender_block(), "transaction_from_check").await;
    }

    #[tokio::test]
    async fn test_topic_overflow_rolls_back() {
        assert_rejected(topic_overflow_block(), "event_topics_check").await;
    }

    #[tokio::test]
    async fn test_violation_in_last_row_rolls_back_earlier_rows() {
        let mut block = fixture_block();
        let last = block.transactions[2].logs.len() - 1;
        block.transactions[2].logs[last].topics = vec![vec![0xff; 32]; 5];

        assert_rejected(block, "event_topics_check").await;
    }

    #[tokio::test]
    async fn test_rejection_does_not_block_other_heights() {
        let harness = Harness::new();

        harness.service.submit(make_block(1, 2, 2)).await.unwrap();
        harness
            .service
            .submit(gas_exceeded_block())
            .await
            .unwrap_err();
        harness.service.submit(make_block(2, 1, 1)).await.unwrap();

        assert_eq!(harness.counts(), (2, 3, 5));
    }

    // =============================================================================
    // ORDERING
    // =============================================================================

    #[tokio::test]
    async fn test_storage_order_follows_index() {
        let harness = Harness::new();
        let mut block = make_block(900, 12, 0);
        for tx in &mut block.transactions {
            tx.logs = (0..6).map(|i| make_event(i, 1)).collect();
        }

        let mut rng = rand::thread_rng();
        block.transactions.shuffle(&mut rng);
        for tx in &mut block.transactions {
            tx.logs.shuffle(&mut rng);
        }

        harness.service.submit(block).await.unwrap();

        // Rows are returned ordered by key; generated ids must follow the same order.
        let transactions = harness.executor.rows(Table::Transaction);
        let ids: Vec<i64> = transactions.iter().map(|tx| tx.id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids {:?}", ids);

        for tx in &transactions {
            let event_ids: Vec<i64> = harness
                .executor
                .rows(Table::Event)
                .into_iter()
                .filter(|event| event.parent() == Some(tx.id()))
                .map(|event| event.id())
                .collect();
            assert_eq!(event_ids.len(), 6);
            assert!(event_ids.windows(2).all(|w| w[0] < w[1]));
        }
    }

    // =============================================================================
    // LARGE PAYLOADS
    // =============================================================================

    #[tokio::test]
    async fn test_huge_input_is_stored_without_truncation() {
        let harness = Harness::new();
        let block = huge_fixture_block();
        let expected = block.transactions[0].input.clone();

        harness.service.submit(block).await.unwrap();

        assert_eq!(harness.counts().1, 2);
        let transactions = harness.executor.rows(Table::Transaction);
        assert_eq!(
            transactions[0].get("input"),
            Some(&SqlValue::Bytes(expected))
        );
    }

    // =============================================================================
    // CONCURRENCY AND RETRY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_heights_and_duplicates() {
        let harness = Arc::new(Harness::new());

        let handles: Vec<_> = (0..40u64)
            .map(|i| {
                let harness = Arc::clone(&harness);
                // Each height submitted four times.
                tokio::spawn(async move { harness.service.submit(make_block(i % 10, 2, 1)).await })
            })
            .collect();

        let mut fresh = 0;
        for handle in handles {
            if !handle.await.unwrap().unwrap().is_duplicate() {
                fresh += 1;
            }
        }

        assert_eq!(fresh, 10);
        assert_eq!(harness.counts(), (10, 20, 20));
        assert_eq!(harness.recorder.outcome_count("duplicate"), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_timeout_is_safe() {
        let executor = InMemoryExecutor::new().with_latency(Duration::from_millis(200));
        let config = IngestConfig::default().with_statement_timeout(Duration::from_millis(50));
        let harness = Harness::with_executor(executor, config);

        let err = harness
            .service
            .submit_with_retry(fixture_block(), 3, Duration::from_millis(10))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::ExecutionFailure {
                source: ExecutorError::Timeout(_),
                ..
            }
        ));
        assert_eq!(harness.counts(), (0, 0, 0));
        assert_eq!(harness.recorder.outcome_count("execution_failure"), 3);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_connection_loss() {
        let harness = Harness::new();
        harness
            .executor
            .inject_failure(ExecutorError::Connection("connection reset".to_string()));

        let outcome = harness
            .service
            .submit_with_retry(fixture_block(), 2, Duration::from_millis(1))
            .await
            .unwrap();

        assert!(!outcome.is_duplicate());
        assert_eq!(harness.counts(), (1, 3, 17));
    }

    #[tokio::test]
    async fn test_metrics_render_after_mixed_outcomes() {
        let harness = Harness::new();

        harness.service.submit(fixture_block()).await.unwrap();
        harness.service.submit(fixture_block()).await.unwrap();
        harness
            .service
            .submit(topic_overflow_block().with_sequence(1))
            .await
            .unwrap_or_else(|e| panic!("duplicate height must win over constraints: {}", e));

        let text = harness.recorder.render().unwrap();
        assert!(text.contains("sqlblock_blocks_total{outcome=\"fresh\"} 1"));
        assert!(text.contains("sqlblock_blocks_total{outcome=\"duplicate\"} 2"));
        assert!(text.contains("sqlblock_rows_inserted_total 21"));
    }
}
