//! Deterministic block fixtures for tests and benchmarks.

use shared_types::{Block, EventLog, Transaction};

/// Height of the standard fixture block.
pub const FIXTURE_HEIGHT: u64 = 60034225;
/// Log count of each transaction in the standard fixture (17 in total).
pub const FIXTURE_LOGS_PER_TX: [usize; 3] = [5, 0, 12];

/// Height of the fixture carrying a very large call data payload.
pub const HUGE_FIXTURE_HEIGHT: u64 = 73097407;
/// Length of the large call data payload in bytes.
pub const HUGE_INPUT_LEN: usize = 1_126_340;

fn address(seed: u64) -> String {
    format!("0x{:040x}", seed)
}

fn hash(seed: u64) -> Vec<u8> {
    let mut out = vec![0u8; 32];
    out[24..].copy_from_slice(&seed.to_be_bytes());
    out
}

/// Event log with `topic_count` 32-byte topics.
pub fn make_event(index: u64, topic_count: usize) -> EventLog {
    EventLog {
        index,
        address: address(0xe0 + index),
        topics: (0..topic_count as u64).map(|t| hash(0x7000 + t)).collect(),
        data: index.to_be_bytes().to_vec(),
    }
}

/// Transaction with `log_count` logs, each carrying two topics.
pub fn make_transaction(index: u64, log_count: usize) -> Transaction {
    Transaction {
        index,
        hash: hash(0x1000 + index),
        from: address(0xa0 + index),
        to: Some(address(0xb0 + index)),
        value: "1000000000000000000".to_string(),
        gas_used: "21000".to_string(),
        input: vec![0xa9, 0x05, 0x9c, 0xbb],
        status: 1,
        logs: (0..log_count as u64).map(|i| make_event(i, 2)).collect(),
    }
}

/// Valid block with `tx_count` transactions of `logs_per_tx` logs each.
pub fn make_block(height: u64, tx_count: usize, logs_per_tx: usize) -> Block {
    Block {
        height,
        hash: hash(height),
        parent_hash: hash(height.saturating_sub(1)),
        timestamp: 1_640_000_000 + height,
        gas_limit: "30000000".to_string(),
        gas_used: "8000000".to_string(),
        sequence: height,
        transactions: (0..tx_count as u64)
            .map(|i| make_transaction(i, logs_per_tx))
            .collect(),
    }
}

/// Block 60034225: 3 transactions, 17 event logs.
pub fn fixture_block() -> Block {
    let mut block = make_block(FIXTURE_HEIGHT, 0, 0);
    block.gas_limit = "20000000".to_string();
    block.gas_used = "1873412".to_string();
    block.transactions = FIXTURE_LOGS_PER_TX
        .iter()
        .enumerate()
        .map(|(i, logs)| make_transaction(i as u64, *logs))
        .collect();
    // A contract creation.
    block.transactions[1].to = None;
    block
}

/// Block 73097407: 2 transactions, the first with 1,126,340 bytes of input.
pub fn huge_fixture_block() -> Block {
    let mut block = make_block(HUGE_FIXTURE_HEIGHT, 2, 1);
    block.transactions[0].input = (0..HUGE_INPUT_LEN).map(|i| (i % 251) as u8).collect();
    block
}

/// Fixture block whose gas used (150000) exceeds its gas limit (100000).
pub fn gas_exceeded_block() -> Block {
    let mut block = fixture_block();
    block.gas_limit = "100000".to_string();
    block.gas_used = "150000".to_string();
    block
}

/// Fixture block whose first transaction has an empty sender.
pub fn empty_sender_block() -> Block {
    let mut block = fixture_block();
    block.transactions[0].from = String::new();
    block
}

/// Fixture block whose first log carries five topics.
pub fn topic_overflow_block() -> Block {
    let mut block = fixture_block();
    block.transactions[0].logs[0].topics = (0..5).map(|t| hash(0x9000 + t)).collect();
    block
}
