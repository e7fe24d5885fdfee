//! # Inbound Ports (Driving Ports)
//!
//! The API through which decoded blocks enter storage.

use async_trait::async_trait;
use shared_types::Block;
use tokio_util::sync::CancellationToken;

use crate::domain::classifier::Ingested;
use crate::domain::errors::IngestError;

/// Primary ingestion API.
///
/// Each call produces exactly one outcome for the block: `Fresh`,
/// `Duplicate`, or one `IngestError`. Re-submitting a block that is already
/// stored is never an error.
#[async_trait]
pub trait BlockIngestApi: Send + Sync {
    /// Ingest one block atomically.
    ///
    /// ## Errors
    ///
    /// - `Encoding`: a field cannot be represented (nothing was sent)
    /// - `Rejected`: a storage constraint failed; zero rows were written
    /// - `ExecutionFailure`: transport failure, timeout or unexpected count;
    ///   safe to retry
    async fn submit(&self, block: Block) -> Result<Ingested, IngestError>;

    /// Like [`BlockIngestApi::submit`], abandoning the attempt when `cancel`
    /// fires. A cancelled attempt reports `ExecutionFailure(Cancelled)`.
    async fn submit_with_cancel(
        &self,
        block: Block,
        cancel: CancellationToken,
    ) -> Result<Ingested, IngestError>;
}
