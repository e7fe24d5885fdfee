//! Ingestion pipeline: build, execute under deadline, classify.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use shared_types::Block;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::BlockIngestService;
use crate::domain::builder::build_statement;
use crate::domain::classifier::{classify, Ingested};
use crate::domain::errors::{ExecutorError, IngestError};
use crate::domain::statement::Statement;
use crate::metrics::MetricsRecorder;
use crate::ports::inbound::BlockIngestApi;
use crate::ports::outbound::{ExecutionReport, Executor};

impl<E, M> BlockIngestService<E, M>
where
    E: Executor,
    M: MetricsRecorder,
{
    #[instrument(skip(self, block, cancel), fields(height = block.ingestion_key()))]
    pub(crate) async fn ingest(
        &self,
        block: &Block,
        cancel: Option<&CancellationToken>,
    ) -> Result<Ingested, IngestError> {
        let height = block.ingestion_key();

        let statement = match build_statement(block) {
            Ok(statement) => statement,
            Err(source) => {
                self.metrics.record_encoding_failure();
                warn!(error = %source, "block cannot be encoded");
                return Err(IngestError::Encoding { height, source });
            }
        };

        debug!(
            rows = statement.row_count(),
            sql_bytes = statement.sql().len(),
            "statement built"
        );

        let started = Instant::now();
        let result = self.execute(&statement, cancel).await;
        let elapsed = started.elapsed();

        let outcome = classify(&statement, result);
        self.observe(&outcome, elapsed);
        outcome
    }

    /// Run the statement under the configured deadline, racing `cancel`.
    async fn execute(
        &self,
        statement: &Statement,
        cancel: Option<&CancellationToken>,
    ) -> Result<ExecutionReport, ExecutorError> {
        let deadline = self.config.statement_timeout;
        let execution = tokio::time::timeout(deadline, self.executor.execute(statement));

        let timed = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(ExecutorError::Cancelled),
                    timed = execution => timed,
                }
            }
            None => execution.await,
        };

        timed.unwrap_or_else(|_| Err(ExecutorError::Timeout(deadline)))
    }

    fn observe(&self, outcome: &Result<Ingested, IngestError>, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        match outcome {
            Ok(Ingested::Fresh { rows, .. }) => {
                self.metrics.record_fresh(*rows, elapsed);
                info!(rows, elapsed_ms, "block ingested");
            }
            Ok(Ingested::Duplicate { .. }) => {
                self.metrics.record_duplicate(elapsed);
                info!(elapsed_ms, "block already ingested");
            }
            Err(IngestError::Rejected {
                constraint, reason, ..
            }) => {
                self.metrics.record_rejected(constraint, elapsed);
                warn!(%constraint, %reason, elapsed_ms, "block rejected");
            }
            Err(err) => {
                self.metrics.record_execution_failure(elapsed);
                error!(error = %err, elapsed_ms, "block ingestion failed");
            }
        }
    }

    /// Submit `block`, retrying execution failures up to `attempts` times in
    /// total with `backoff` between tries.
    ///
    /// An attempt that timed out after committing turns the retry into a
    /// `Duplicate`. Encoding errors and rejections are returned at once.
    pub async fn submit_with_retry(
        &self,
        block: Block,
        attempts: u32,
        backoff: Duration,
    ) -> Result<Ingested, IngestError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.ingest(&block, None).await {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(
                        height = block.ingestion_key(),
                        attempt,
                        attempts,
                        error = %err,
                        "retrying block ingestion"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

#[async_trait]
impl<E, M> BlockIngestApi for BlockIngestService<E, M>
where
    E: Executor + 'static,
    M: MetricsRecorder + 'static,
{
    async fn submit(&self, block: Block) -> Result<Ingested, IngestError> {
        self.ingest(&block, None).await
    }

    async fn submit_with_cancel(
        &self,
        block: Block,
        cancel: CancellationToken,
    ) -> Result<Ingested, IngestError> {
        self.ingest(&block, Some(&cancel)).await
    }
}
