//! # In-Memory Executor
//!
//! A small relational engine over the `Table`/`Check` schema description.
//! It applies a statement's `RowInsert` batch in the order PostgreSQL
//! resolves the SQL form:
//!
//! - the whole batch is staged, validated and then committed under one lock,
//!   so readers never see part of a block;
//! - a `DO NOTHING` row whose key is already stored is skipped before any
//!   check runs, together with every row hanging off it;
//! - otherwise check constraints are evaluated first and the unique key
//!   second, aborting the batch with the constraint names the DDL uses.
//!
//! The parity scenarios in the test suite run the same submissions against
//! both executors.
//!
//! Used by unit and integration tests, and anywhere a database is not
//! available.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::encoding::{compare_decimal, SqlValue};
use crate::domain::errors::ExecutorError;
use crate::domain::schema::{Check, Table};
use crate::domain::statement::{OnConflict, RowInsert, Statement};
use crate::ports::outbound::{ExecutionReport, Executor};

/// A committed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    table: Table,
    id: i64,
    parent: Option<i64>,
    key: i64,
    values: Vec<SqlValue>,
}

impl StoredRow {
    pub fn table(&self) -> Table {
        self.table
    }

    /// Identity: the height for blocks, a generated id otherwise.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Identity of the parent row.
    pub fn parent(&self) -> Option<i64> {
        self.parent
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Value of a data column.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.table
            .column_position(column)
            .and_then(|pos| self.values.get(pos))
    }

    /// Value of the key column (`height` or `index`).
    pub fn key(&self) -> i64 {
        self.key
    }
}

/// Unique key: relation, parent identity, key column value.
type UniqueKey = (Table, Option<i64>, i64);

#[derive(Default)]
struct Store {
    rows: HashMap<Table, Vec<StoredRow>>,
    unique: HashSet<UniqueKey>,
    next_id: HashMap<Table, i64>,
    pending_failures: VecDeque<ExecutorError>,
    executions: u64,
}

impl Store {
    /// Stage the whole batch, then commit it. Nothing changes on error.
    fn apply(&mut self, statement: &Statement) -> Result<u64, ExecutorError> {
        let operations = statement.operations();
        let mut identities: Vec<Option<i64>> = Vec::with_capacity(operations.len());
        let mut staged: Vec<StoredRow> = Vec::with_capacity(operations.len());
        let mut staged_keys: HashSet<UniqueKey> = HashSet::new();
        let mut next_id = self.next_id.clone();

        for op in operations {
            let table = op.table();

            let parent = match op.parent() {
                None => None,
                Some(position) => match identities.get(position).copied().flatten() {
                    Some(identity) => Some(identity),
                    None => {
                        // Parent was not inserted by this statement.
                        identities.push(None);
                        continue;
                    }
                },
            };

            let key = key_of(op)?;
            let unique_key = (table, parent, key);
            let exists = self.unique.contains(&unique_key) || staged_keys.contains(&unique_key);

            // Stored key: the guarded insert yields no candidate row.
            if exists && op.on_conflict() == OnConflict::DoNothing {
                identities.push(None);
                continue;
            }

            for check in table.checks() {
                evaluate_check(table, check, op)?;
            }

            if exists {
                return Err(ExecutorError::ConstraintViolation {
                    constraint: table.unique_constraint().to_string(),
                    message: format!(
                        "duplicate key value violates unique constraint \"{}\"",
                        table.unique_constraint()
                    ),
                });
            }

            let id = if table.parent().is_none() {
                key
            } else {
                let counter = next_id.entry(table).or_insert(0);
                *counter += 1;
                *counter
            };

            identities.push(Some(id));
            staged_keys.insert(unique_key);
            staged.push(StoredRow {
                table,
                id,
                parent,
                key,
                values: op.values().to_vec(),
            });
        }

        let inserted = staged.len() as u64;
        for row in staged {
            self.rows.entry(row.table).or_default().push(row);
        }
        self.unique.extend(staged_keys);
        self.next_id = next_id;
        Ok(inserted)
    }
}

fn key_of(op: &RowInsert) -> Result<i64, ExecutorError> {
    let column = op.table().key_column();
    match op.value(column) {
        Some(SqlValue::BigInt(v)) => Ok(*v),
        other => Err(ExecutorError::Database(format!(
            "{}.{} must be a bigint, got {:?}",
            op.table().name(),
            column,
            other
        ))),
    }
}

fn evaluate_check(table: Table, check: &Check, op: &RowInsert) -> Result<(), ExecutorError> {
    let satisfied = match check {
        Check::NumericLe { lhs, rhs, .. } => match (op.value(lhs), op.value(rhs)) {
            (Some(SqlValue::Numeric(l)), Some(SqlValue::Numeric(r))) => {
                compare_decimal(l, r) != std::cmp::Ordering::Greater
            }
            // NULL operands leave the check unknown, which passes.
            _ => true,
        },
        Check::NonEmpty { column, .. } => match op.value(column) {
            Some(SqlValue::Text(text)) => !text.is_empty(),
            _ => true,
        },
        Check::MaxCardinality { column, max, .. } => match op.value(column) {
            Some(SqlValue::ByteaArray(items)) => items.len() <= *max,
            _ => true,
        },
    };

    if satisfied {
        Ok(())
    } else {
        Err(ExecutorError::ConstraintViolation {
            constraint: check.name().to_string(),
            message: format!(
                "new row for relation \"{}\" violates check constraint \"{}\"",
                table.name(),
                check.name()
            ),
        })
    }
}

/// In-memory executor.
///
/// Cheap to share behind an `Arc`; all state sits behind one mutex that is
/// never held across an await point.
#[derive(Default)]
pub struct InMemoryExecutor {
    store: Mutex<Store>,
    latency: Option<Duration>,
}

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before applying each statement.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `execute` call fail with `error` without touching the
    /// store. Queued failures are consumed in order.
    pub fn inject_failure(&self, error: ExecutorError) {
        self.store.lock().pending_failures.push_back(error);
    }

    /// Number of rows committed to `table`.
    pub fn row_count(&self, table: Table) -> u64 {
        self.store
            .lock()
            .rows
            .get(&table)
            .map_or(0, |rows| rows.len() as u64)
    }

    /// Committed rows of `table`, ordered by parent then key.
    pub fn rows(&self, table: Table) -> Vec<StoredRow> {
        let mut rows = self
            .store
            .lock()
            .rows
            .get(&table)
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|row| (row.parent, row.key()));
        rows
    }

    /// Number of `execute` calls that reached the store.
    pub fn execution_count(&self) -> u64 {
        self.store.lock().executions
    }

    /// Remove all rows. Id counters keep counting, like a sequence.
    pub fn truncate(&self) {
        let mut store = self.store.lock();
        store.rows.clear();
        store.unique.clear();
    }
}

#[async_trait]
impl Executor for InMemoryExecutor {
    async fn execute(&self, statement: &Statement) -> Result<ExecutionReport, ExecutorError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut store = self.store.lock();
        store.executions += 1;
        if let Some(error) = store.pending_failures.pop_front() {
            tracing::debug!(height = statement.height(), error = %error, "injected failure");
            return Err(error);
        }

        let rows_affected = store.apply(statement)?;
        tracing::trace!(
            height = statement.height(),
            rows = rows_affected,
            "in-memory statement committed"
        );
        Ok(ExecutionReport { rows_affected })
    }
}
