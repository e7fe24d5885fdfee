//! # Statement
//!
//! The unit of work produced for one block.
//!
//! A `Statement` carries the same insert plan in two forms:
//!
//! - `sql()`: one PostgreSQL statement (a chain of data-modifying CTEs) for
//!   engines that speak SQL.
//! - `operations()`: the ordered batch of typed `RowInsert`s, for executors
//!   that apply rows directly.
//!
//! Both forms have identical all-or-nothing semantics. Only the builder can
//! construct a statement, so every value inside it has passed encoding.

use crate::domain::encoding::SqlValue;
use crate::domain::schema::Table;

/// What to do when the row's unique key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Raise a constraint violation (aborts the whole statement).
    Fail,
    /// Skip the row, and with it every row conditioned on it.
    DoNothing,
}

/// One row of the insert plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowInsert {
    table: Table,
    values: Vec<SqlValue>,
    parent: Option<usize>,
    on_conflict: OnConflict,
}

impl RowInsert {
    pub(crate) fn new(
        table: Table,
        values: Vec<SqlValue>,
        parent: Option<usize>,
        on_conflict: OnConflict,
    ) -> Self {
        debug_assert_eq!(values.len(), table.columns().len());
        Self {
            table,
            values,
            parent,
            on_conflict,
        }
    }

    /// Target relation.
    pub fn table(&self) -> Table {
        self.table
    }

    /// Values aligned with `table().columns()`.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Value of a named data column.
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.table
            .column_position(column)
            .and_then(|pos| self.values.get(pos))
    }

    /// Position (in `Statement::operations`) of the row this one hangs off.
    ///
    /// The row is inserted only if its parent was inserted by the same
    /// execution; its foreign key takes the parent's identity.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Conflict policy on the unique key.
    pub fn on_conflict(&self) -> OnConflict {
        self.on_conflict
    }
}

/// Executable unit for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    height: u64,
    sql: String,
    operations: Vec<RowInsert>,
}

impl Statement {
    pub(crate) fn new(height: u64, sql: String, operations: Vec<RowInsert>) -> Self {
        Self {
            height,
            sql,
            operations,
        }
    }

    /// Height of the block this statement ingests.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// The single SQL statement text.
    ///
    /// Executing it returns one row with one `bigint` column: the number of
    /// rows it inserted.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Ordered insert plan; parents always precede their children.
    pub fn operations(&self) -> &[RowInsert] {
        &self.operations
    }

    /// Rows a fresh ingestion creates (block + transactions + events).
    pub fn row_count(&self) -> u64 {
        self.operations.len() as u64
    }

    /// Rows targeting one relation.
    pub fn row_count_for(&self, table: Table) -> u64 {
        self.operations
            .iter()
            .filter(|op| op.table == table)
            .count() as u64
    }
}
