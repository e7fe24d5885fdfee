//! # Decoded Payloads
//!
//! Blocks arrive as JSON from the decoder. These tests take such payloads
//! through `serde_json` into the entity graph and on into storage.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlblock::{
        build_statement, Block, BlockIngestApi, BlockIngestService, InMemoryExecutor, IngestConfig,
        IngestError, SqlValue, Table,
    };

    const PAYLOAD: &str = r#"{
        "height": 1200,
        "hash": "8f5bab218b6bb34476f51ca588e9f4553a3a7ce5e13a66c660a5283e97e9a85a",
        "parent_hash": "d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3",
        "timestamp": 1640995200,
        "gas_limit": "30000000",
        "gas_used": "63000",
        "transactions": [
            {
                "index": 1,
                "hash": "02",
                "from": "0x00000000000000000000000000000000000000a1",
                "to": null,
                "value": "0",
                "gas_used": "42000",
                "input": "60806040",
                "status": 1,
                "logs": []
            },
            {
                "index": 0,
                "hash": "01",
                "from": "0x00000000000000000000000000000000000000a0",
                "to": "0x00000000000000000000000000000000000000b0",
                "value": "115792089237316195423570985008687907853269984665640564039457584007913129639935",
                "gas_used": "21000",
                "input": "",
                "status": 1,
                "logs": [
                    {
                        "index": 0,
                        "address": "0x00000000000000000000000000000000000000c0",
                        "topics": [
                            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
                        ],
                        "data": "00ff"
                    }
                ]
            }
        ]
    }"#;

    fn decode() -> Block {
        serde_json::from_str(PAYLOAD).unwrap()
    }

    #[test]
    fn test_payload_decodes() {
        let block = decode();
        assert_eq!(block.height, 1200);
        assert_eq!(block.sequence, 0);
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.event_count(), 1);
        assert_eq!(block.transactions[0].input, vec![0x60, 0x80, 0x60, 0x40]);
    }

    #[test]
    fn test_statement_from_payload_is_single_statement() {
        let block = decode();
        let statement = build_statement(&block).unwrap();

        assert_eq!(statement.row_count(), 4);
        assert!(statement.sql().starts_with("WITH "));
        assert!(statement
            .sql()
            .contains("'115792089237316195423570985008687907853269984665640564039457584007913129639935'::numeric"));
        assert!(statement.sql().contains("NULL::text"));
    }

    #[tokio::test]
    async fn test_payload_ingests_in_index_order() {
        let executor = Arc::new(InMemoryExecutor::new());
        let service = BlockIngestService::new(Arc::clone(&executor), IngestConfig::default());
        let block = decode();
        let sequence = block.height;

        service.submit(block.with_sequence(sequence)).await.unwrap();

        let transactions = executor.rows(Table::Transaction);
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].get("hash"), Some(&SqlValue::Bytes(vec![0x01])));
        assert_eq!(transactions[1].get("to_address"), Some(&SqlValue::Null(sqlblock::SqlType::Text)));
        assert!(transactions[0].id() < transactions[1].id());

        let events = executor.rows(Table::Event);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].parent(), Some(transactions[0].id()));
    }

    #[tokio::test]
    async fn test_hostile_text_is_stored_verbatim() {
        let executor = Arc::new(InMemoryExecutor::new());
        let service = BlockIngestService::new(Arc::clone(&executor), IngestConfig::default());
        let mut block = decode();
        let hostile = "0xa0'); DELETE FROM \"block\"; --\\";
        block.transactions[0].from = hostile.to_string();

        service.submit(block.clone()).await.unwrap();

        let statement = build_statement(&block).unwrap();
        assert!(statement.sql().contains("E'0xa0''); DELETE FROM \"block\"; --\\\\'::text"));
        let transactions = executor.rows(Table::Transaction);
        assert_eq!(
            transactions[1].get("from_address"),
            Some(&SqlValue::Text(hostile.to_string()))
        );
    }

    #[tokio::test]
    async fn test_nul_in_text_is_encoding_error() {
        let executor = Arc::new(InMemoryExecutor::new());
        let service = BlockIngestService::new(Arc::clone(&executor), IngestConfig::default());
        let mut block = decode();
        block.transactions[1].logs[0].address = "0xc0\u{0}".to_string();

        let err = service.submit(block).await.unwrap_err();

        assert!(matches!(err, IngestError::Encoding { height: 1200, .. }));
        assert!(!err.is_retryable());
        assert_eq!(executor.execution_count(), 0);
    }
}
