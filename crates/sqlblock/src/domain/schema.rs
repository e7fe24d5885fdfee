//! # Persisted Schema
//!
//! Table layout and constraints the ingestion statement targets.
//!
//! The constraints live in the storage engine. They are described here as
//! data so that the PostgreSQL DDL (`SCHEMA_SQL`) and the in-memory executor
//! enforce the same rules under the same names.
//!
//! | Relation      | Identity             | Unique key                  | Check                  |
//! |---------------|----------------------|-----------------------------|------------------------|
//! | `block`       | `height`             | `height`                    | `block_check`          |
//! | `transaction` | `id` (generated)     | `(block_height, index)`     | `transaction_from_check` |
//! | `event`       | `id` (generated)     | `(transaction_id, index)`   | `event_topics_check`   |

/// One of the three ingestion relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Block,
    Transaction,
    Event,
}

/// Declarative check constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Numeric column `lhs` must not exceed numeric column `rhs`.
    NumericLe {
        name: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    /// Text column must not be the empty string.
    NonEmpty {
        name: &'static str,
        column: &'static str,
    },
    /// Array column must hold at most `max` elements.
    MaxCardinality {
        name: &'static str,
        column: &'static str,
        max: usize,
    },
}

impl Check {
    /// Constraint name as reported by the engine.
    pub const fn name(&self) -> &'static str {
        match self {
            Check::NumericLe { name, .. }
            | Check::NonEmpty { name, .. }
            | Check::MaxCardinality { name, .. } => *name,
        }
    }
}

/// Maximum number of indexed topics per event log.
pub const MAX_TOPICS: usize = 4;

const BLOCK_COLUMNS: &[&str] = &[
    "height",
    "hash",
    "parent_hash",
    "timestamp",
    "gas_limit",
    "gas_used",
    "sequence",
];

const TRANSACTION_COLUMNS: &[&str] = &[
    "index",
    "hash",
    "from_address",
    "to_address",
    "value",
    "gas_used",
    "input",
    "status",
];

const EVENT_COLUMNS: &[&str] = &["index", "address", "topics", "data"];

const BLOCK_CHECKS: &[Check] = &[Check::NumericLe {
    name: "block_check",
    lhs: "gas_used",
    rhs: "gas_limit",
}];

const TRANSACTION_CHECKS: &[Check] = &[Check::NonEmpty {
    name: "transaction_from_check",
    column: "from_address",
}];

const EVENT_CHECKS: &[Check] = &[Check::MaxCardinality {
    name: "event_topics_check",
    column: "topics",
    max: MAX_TOPICS,
}];

impl Table {
    /// Relation name.
    pub const fn name(self) -> &'static str {
        match self {
            Table::Block => "block",
            Table::Transaction => "transaction",
            Table::Event => "event",
        }
    }

    /// Data columns supplied by the statement, in value order.
    ///
    /// Excludes generated identities and the parent foreign key.
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Block => BLOCK_COLUMNS,
            Table::Transaction => TRANSACTION_COLUMNS,
            Table::Event => EVENT_COLUMNS,
        }
    }

    /// Column that identifies a row to its children.
    pub const fn identity_column(self) -> &'static str {
        match self {
            Table::Block => "height",
            Table::Transaction | Table::Event => "id",
        }
    }

    /// Parent relation and the foreign-key column referencing it.
    pub const fn parent(self) -> Option<(Table, &'static str)> {
        match self {
            Table::Block => None,
            Table::Transaction => Some((Table::Block, "block_height")),
            Table::Event => Some((Table::Transaction, "transaction_id")),
        }
    }

    /// Column that, together with the parent key, is unique.
    pub const fn key_column(self) -> &'static str {
        match self {
            Table::Block => "height",
            Table::Transaction | Table::Event => "index",
        }
    }

    /// Name of the uniqueness constraint.
    pub const fn unique_constraint(self) -> &'static str {
        match self {
            Table::Block => "block_pkey",
            Table::Transaction => "transaction_block_height_index_key",
            Table::Event => "event_transaction_id_index_key",
        }
    }

    /// Name of the foreign-key constraint to the parent.
    pub const fn foreign_key_constraint(self) -> Option<&'static str> {
        match self {
            Table::Block => None,
            Table::Transaction => Some("transaction_block_height_fkey"),
            Table::Event => Some("event_transaction_id_fkey"),
        }
    }

    /// Check constraints on this relation.
    pub const fn checks(self) -> &'static [Check] {
        match self {
            Table::Block => BLOCK_CHECKS,
            Table::Transaction => TRANSACTION_CHECKS,
            Table::Event => EVENT_CHECKS,
        }
    }

    /// Position of `column` within `columns()`.
    pub fn column_position(self, column: &str) -> Option<usize> {
        self.columns().iter().position(|c| *c == column)
    }

    /// All relations, parents first.
    pub const ALL: [Table; 3] = [Table::Block, Table::Transaction, Table::Event];
}

/// PostgreSQL DDL for the three relations.
///
/// Constraint names match `Table::unique_constraint`, `Table::foreign_key_constraint`
/// and `Check::name`.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "block" (
    "height"      BIGINT  NOT NULL,
    "hash"        BYTEA   NOT NULL,
    "parent_hash" BYTEA   NOT NULL,
    "timestamp"   BIGINT  NOT NULL,
    "gas_limit"   NUMERIC NOT NULL,
    "gas_used"    NUMERIC NOT NULL,
    "sequence"    BIGINT  NOT NULL,
    CONSTRAINT "block_pkey" PRIMARY KEY ("height"),
    CONSTRAINT "block_check" CHECK ("gas_used" <= "gas_limit")
);

CREATE TABLE IF NOT EXISTS "transaction" (
    "id"           BIGSERIAL NOT NULL,
    "block_height" BIGINT    NOT NULL,
    "index"        BIGINT    NOT NULL,
    "hash"         BYTEA     NOT NULL,
    "from_address" TEXT      NOT NULL,
    "to_address"   TEXT,
    "value"        NUMERIC   NOT NULL,
    "gas_used"     NUMERIC   NOT NULL,
    "input"        BYTEA     NOT NULL,
    "status"       BIGINT    NOT NULL,
    CONSTRAINT "transaction_pkey" PRIMARY KEY ("id"),
    CONSTRAINT "transaction_block_height_fkey" FOREIGN KEY ("block_height")
        REFERENCES "block" ("height") ON DELETE CASCADE,
    CONSTRAINT "transaction_block_height_index_key" UNIQUE ("block_height", "index"),
    CONSTRAINT "transaction_from_check" CHECK ("from_address" <> '')
);

CREATE TABLE IF NOT EXISTS "event" (
    "id"             BIGSERIAL NOT NULL,
    "transaction_id" BIGINT    NOT NULL,
    "index"          BIGINT    NOT NULL,
    "address"        TEXT      NOT NULL,
    "topics"         BYTEA[]   NOT NULL,
    "data"           BYTEA     NOT NULL,
    CONSTRAINT "event_pkey" PRIMARY KEY ("id"),
    CONSTRAINT "event_transaction_id_fkey" FOREIGN KEY ("transaction_id")
        REFERENCES "transaction" ("id") ON DELETE CASCADE,
    CONSTRAINT "event_transaction_id_index_key" UNIQUE ("transaction_id", "index"),
    CONSTRAINT "event_topics_check" CHECK (cardinality("topics") <= 4)
);
"#;
