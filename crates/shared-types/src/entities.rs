//! # Core Domain Entities
//!
//! The block entity graph as produced by the block decoder.
//!
//! ## Ownership
//!
//! - A `Block` exclusively owns its ordered `Transaction`s.
//! - A `Transaction` exclusively owns its ordered `EventLog`s.
//!
//! Byte fields serialize as lowercase hex. Gas and value amounts are carried
//! as decimal strings so that arbitrarily large figures are never narrowed to
//! a fixed-width integer.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// Arbitrary-length byte string (hashes, call data, topics).
pub type Bytes = Vec<u8>;

/// Decimal-string amount with arbitrary precision (e.g. `"30000000"`).
pub type DecimalString = String;

/// One chain height's worth of data: header fields plus ordered transactions.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// Chain height. The authoritative ingestion key.
    pub height: u64,
    /// Block hash.
    #[serde_as(as = "Hex")]
    pub hash: Bytes,
    /// Hash of the parent block.
    #[serde_as(as = "Hex")]
    pub parent_hash: Bytes,
    /// Unix timestamp of the block.
    pub timestamp: u64,
    /// Block gas limit.
    pub gas_limit: DecimalString,
    /// Gas consumed by all transactions in the block.
    pub gas_used: DecimalString,
    /// Ingestion ordering key assigned by the caller (usually the height).
    #[serde(default)]
    pub sequence: u64,
    /// Transactions in block order.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Key used to decide whether two submissions are "the same block".
    ///
    /// Only the height participates; content is ignored.
    pub fn ingestion_key(&self) -> u64 {
        self.height
    }

    /// Assign the ingestion sequence, consuming the block.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Number of event logs across every transaction.
    pub fn event_count(&self) -> usize {
        self.transactions.iter().map(|tx| tx.logs.len()).sum()
    }
}

/// One chain operation within a block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Transaction {
    /// Position within the block. Defines storage order.
    pub index: u64,
    /// Transaction hash.
    #[serde_as(as = "Hex")]
    pub hash: Bytes,
    /// Sender address.
    pub from: String,
    /// Recipient address (`None` for contract creation).
    #[serde(default)]
    pub to: Option<String>,
    /// Transferred value.
    pub value: DecimalString,
    /// Gas consumed by this transaction.
    pub gas_used: DecimalString,
    /// Call data. Unbounded.
    #[serde_as(as = "Hex")]
    #[serde(default)]
    pub input: Bytes,
    /// Execution status code.
    pub status: u64,
    /// Emitted event logs in emission order.
    #[serde(default)]
    pub logs: Vec<EventLog>,
}

/// One emitted event within a transaction.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventLog {
    /// Position within the transaction.
    pub index: u64,
    /// Emitting contract address.
    pub address: String,
    /// Indexed topics.
    #[serde_as(as = "Vec<Hex>")]
    #[serde(default)]
    pub topics: Vec<Bytes>,
    /// Non-indexed payload.
    #[serde_as(as = "Hex")]
    #[serde(default)]
    pub data: Bytes,
}
