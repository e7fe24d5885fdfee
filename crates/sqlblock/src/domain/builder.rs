//! # Statement Builder
//!
//! Turns one `Block` entity graph into one `Statement`.
//!
//! ## Shape of the generated SQL
//!
//! ```text
//! WITH "block_0" AS (
//!     INSERT INTO "block" (...) SELECT ...
//!     WHERE NOT EXISTS (SELECT 1 FROM "block" WHERE "height" = ...)
//!     ON CONFLICT ("height") DO NOTHING RETURNING "height"
//! ), "transaction_1" AS (
//!     INSERT INTO "transaction" ("block_height", ...)
//!     SELECT "block_0"."height", ... FROM "block_0" RETURNING "id"
//! ), "event_2" AS (
//!     INSERT INTO "event" ("transaction_id", ...)
//!     SELECT "transaction_1"."id", ... FROM "transaction_1" RETURNING "id"
//! )
//! SELECT count(*) FROM (SELECT 1 FROM "block_0" UNION ALL ...) AS "inserted"
//! ```
//!
//! A child selects its foreign key from its parent's CTE, so when the block
//! insert is skipped as a duplicate every child selects zero rows. Being one
//! statement, a constraint failure anywhere aborts all of it.
//!
//! PostgreSQL evaluates check constraints on a candidate row before it looks
//! for an `ON CONFLICT` match. The `NOT EXISTS` guard keeps a stored height
//! from producing a candidate row at all, so a resubmission is a duplicate
//! whatever its other fields hold. `ON CONFLICT` still covers a concurrent
//! insert of the same height that the guard's snapshot cannot see.
//!
//! The builder is pure: no I/O, no shared state. It never evaluates domain
//! invariants; it only fails on values it cannot encode.

use shared_types::{Block, EventLog, Transaction};

use crate::domain::encoding::{write_ident, SqlValue};
use crate::domain::errors::EncodingError;
use crate::domain::schema::Table;
use crate::domain::statement::{OnConflict, RowInsert, Statement};

/// Build the ingestion statement for `block`.
///
/// Transactions are emitted in ascending `index` order and each
/// transaction's logs in ascending `index` order, whatever order the decoder
/// produced them in. Ties keep their input order and are left for the
/// engine's unique key to reject.
pub fn build_statement(block: &Block) -> Result<Statement, EncodingError> {
    let mut operations = Vec::with_capacity(1 + block.transactions.len() + block.event_count());
    operations.push(block_row(block)?);

    let mut transactions: Vec<&Transaction> = block.transactions.iter().collect();
    transactions.sort_by_key(|tx| tx.index);

    for tx in transactions {
        let tx_position = operations.len();
        operations.push(transaction_row(tx)?);

        let mut logs: Vec<&EventLog> = tx.logs.iter().collect();
        logs.sort_by_key(|log| log.index);

        for log in logs {
            operations.push(event_row(log, tx_position)?);
        }
    }

    let sql = render_sql(&operations);
    Ok(Statement::new(block.height, sql, operations))
}

fn block_row(block: &Block) -> Result<RowInsert, EncodingError> {
    let values = vec![
        SqlValue::bigint("block.height", block.height)?,
        SqlValue::bytes(&block.hash),
        SqlValue::bytes(&block.parent_hash),
        SqlValue::bigint("block.timestamp", block.timestamp)?,
        SqlValue::numeric("block.gas_limit", &block.gas_limit)?,
        SqlValue::numeric("block.gas_used", &block.gas_used)?,
        SqlValue::bigint("block.sequence", block.sequence)?,
    ];
    Ok(RowInsert::new(Table::Block, values, None, OnConflict::DoNothing))
}

fn transaction_row(tx: &Transaction) -> Result<RowInsert, EncodingError> {
    let values = vec![
        SqlValue::bigint("transaction.index", tx.index)?,
        SqlValue::bytes(&tx.hash),
        SqlValue::text("transaction.from", &tx.from)?,
        SqlValue::nullable_text("transaction.to", tx.to.as_deref())?,
        SqlValue::numeric("transaction.value", &tx.value)?,
        SqlValue::numeric("transaction.gas_used", &tx.gas_used)?,
        SqlValue::bytes(&tx.input),
        SqlValue::bigint("transaction.status", tx.status)?,
    ];
    // Block row is always operation 0.
    Ok(RowInsert::new(
        Table::Transaction,
        values,
        Some(0),
        OnConflict::Fail,
    ))
}

fn event_row(log: &EventLog, tx_position: usize) -> Result<RowInsert, EncodingError> {
    let values = vec![
        SqlValue::bigint("event.index", log.index)?,
        SqlValue::text("event.address", &log.address)?,
        SqlValue::bytea_array(&log.topics),
        SqlValue::bytes(&log.data),
    ];
    Ok(RowInsert::new(
        Table::Event,
        values,
        Some(tx_position),
        OnConflict::Fail,
    ))
}

fn cte_name(operations: &[RowInsert], position: usize) -> String {
    format!("{}_{}", operations[position].table().name(), position)
}

fn render_sql(operations: &[RowInsert]) -> String {
    let capacity = operations
        .iter()
        .map(|op| {
            op.values()
                .iter()
                .map(|v| v.literal_len_hint() + 2)
                .sum::<usize>()
                + 256
        })
        .sum::<usize>()
        + 64;
    let mut sql = String::with_capacity(capacity);

    sql.push_str("WITH ");
    for (position, op) in operations.iter().enumerate() {
        if position > 0 {
            sql.push_str(", ");
        }
        write_cte(operations, position, op, &mut sql);
    }

    sql.push_str(" SELECT count(*) FROM (");
    for position in 0..operations.len() {
        if position > 0 {
            sql.push_str(" UNION ALL ");
        }
        sql.push_str("SELECT 1 FROM ");
        write_ident(&cte_name(operations, position), &mut sql);
    }
    sql.push_str(") AS \"inserted\"");
    sql
}

fn write_cte(operations: &[RowInsert], position: usize, op: &RowInsert, sql: &mut String) {
    let table = op.table();
    let parent = table.parent().zip(op.parent());

    write_ident(&cte_name(operations, position), sql);
    sql.push_str(" AS (INSERT INTO ");
    write_ident(table.name(), sql);
    sql.push_str(" (");
    let mut first = true;
    if let Some(((_, fk_column), _)) = parent {
        write_ident(fk_column, sql);
        first = false;
    }
    for column in table.columns() {
        if !first {
            sql.push_str(", ");
        }
        write_ident(column, sql);
        first = false;
    }
    sql.push(')');

    match parent {
        Some(((parent_table, _), parent_position)) => {
            let parent_cte = cte_name(operations, parent_position);
            sql.push_str(" SELECT ");
            write_ident(&parent_cte, sql);
            sql.push('.');
            write_ident(parent_table.identity_column(), sql);
            for value in op.values() {
                sql.push_str(", ");
                value.write_literal(sql);
            }
            sql.push_str(" FROM ");
            write_ident(&parent_cte, sql);
        }
        None => {
            sql.push_str(" SELECT ");
            for (i, value) in op.values().iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                value.write_literal(sql);
            }
            if op.on_conflict() == OnConflict::DoNothing {
                write_absent_guard(table, op, sql);
            }
        }
    }

    if op.on_conflict() == OnConflict::DoNothing {
        sql.push_str(" ON CONFLICT (");
        if let Some((_, fk_column)) = table.parent() {
            write_ident(fk_column, sql);
            sql.push_str(", ");
        }
        write_ident(table.key_column(), sql);
        sql.push_str(") DO NOTHING");
    }

    sql.push_str(" RETURNING ");
    write_ident(table.identity_column(), sql);
    sql.push(')');
}

/// ` WHERE NOT EXISTS (SELECT 1 FROM "t" WHERE "key" = <key>)`
fn write_absent_guard(table: Table, op: &RowInsert, sql: &mut String) {
    let Some(key) = op.value(table.key_column()) else {
        return;
    };
    sql.push_str(" WHERE NOT EXISTS (SELECT 1 FROM ");
    write_ident(table.name(), sql);
    sql.push_str(" WHERE ");
    write_ident(table.key_column(), sql);
    sql.push_str(" = ");
    key.write_literal(sql);
    sql.push(')');
}
