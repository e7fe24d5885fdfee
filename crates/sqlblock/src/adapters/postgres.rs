//! # PostgreSQL Executor
//!
//! Runs the statement's SQL form through a `sqlx` connection pool.
//!
//! The statement is sent as one unprepared query. PostgreSQL runs a single
//! statement in its own implicit transaction, so the CTE chain commits or
//! rolls back as a unit without an explicit `BEGIN`.
//!
//! ## Error mapping
//!
//! | sqlx error                        | `ExecutorError`        |
//! |-----------------------------------|------------------------|
//! | database error, SQLSTATE `23xxx`  | `ConstraintViolation`  |
//! | other database error              | `Database`             |
//! | `PoolTimedOut`                    | `Timeout`              |
//! | I/O, TLS, closed pool             | `Connection`           |

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::errors::ExecutorError;
use crate::domain::schema::{Table, SCHEMA_SQL};
use crate::domain::statement::Statement;
use crate::domain::value_objects::{ConfigError, IngestConfig};
use crate::ports::outbound::{ExecutionReport, Executor};

/// SQLSTATE class for integrity constraint violations.
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";

/// Failure to set up the executor.
#[derive(Debug, Error)]
pub enum PostgresSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Executor backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PostgresExecutor {
    pool: PgPool,
    acquire_timeout: Duration,
}

impl PostgresExecutor {
    /// Open a pool as described by `config`.
    pub async fn connect(config: &IngestConfig) -> Result<Self, PostgresSetupError> {
        config.validate()?;
        let url = config.require_database_url()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| map_error(e, config.acquire_timeout))?;

        info!(
            max_connections = config.max_connections,
            "connected to PostgreSQL"
        );
        Ok(Self {
            pool,
            acquire_timeout: config.acquire_timeout,
        })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, acquire_timeout: Duration) -> Self {
        Self {
            pool,
            acquire_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the three relations if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), ExecutorError> {
        debug!("applying ingestion schema");
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| map_error(e, self.acquire_timeout))?;
        Ok(())
    }

    /// Delete every ingested row.
    pub async fn truncate(&self) -> Result<(), ExecutorError> {
        sqlx::raw_sql(r#"TRUNCATE "event", "transaction", "block""#)
            .execute(&self.pool)
            .await
            .map_err(|e| map_error(e, self.acquire_timeout))?;
        Ok(())
    }

    /// Number of rows in `table`.
    pub async fn row_count(&self, table: Table) -> Result<u64, ExecutorError> {
        let mut sql = String::from("SELECT count(*) FROM ");
        crate::domain::encoding::write_ident(table.name(), &mut sql);

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_error(e, self.acquire_timeout))?;
        Ok(count.max(0) as u64)
    }

    /// Stored length of a transaction's input, if the transaction exists.
    pub async fn input_length(&self, height: u64, index: u64) -> Result<Option<u64>, ExecutorError> {
        let height = i64::try_from(height)
            .map_err(|_| ExecutorError::Database(format!("height {} out of range", height)))?;
        let index = i64::try_from(index)
            .map_err(|_| ExecutorError::Database(format!("index {} out of range", index)))?;

        let length: Option<i64> = sqlx::query_scalar(
            r#"SELECT octet_length("input")::bigint FROM "transaction"
               WHERE "block_height" = $1 AND "index" = $2"#,
        )
        .bind(height)
        .bind(index)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_error(e, self.acquire_timeout))?;

        Ok(length.map(|len| len.max(0) as u64))
    }

    /// Close the pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Executor for PostgresExecutor {
    async fn execute(&self, statement: &Statement) -> Result<ExecutionReport, ExecutorError> {
        let started = Instant::now();

        let row = sqlx::query(statement.sql())
            .persistent(false)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_error(e, self.acquire_timeout))?;

        let inserted: i64 = row
            .try_get(0)
            .map_err(|e| ExecutorError::Database(e.to_string()))?;

        debug!(
            height = statement.height(),
            rows = inserted,
            sql_bytes = statement.sql().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "statement executed"
        );
        Ok(ExecutionReport {
            rows_affected: inserted.max(0) as u64,
        })
    }
}

fn map_error(error: sqlx::Error, acquire_timeout: Duration) -> ExecutorError {
    match error {
        sqlx::Error::Database(db) => {
            let is_integrity = db
                .code()
                .is_some_and(|code| code.starts_with(INTEGRITY_CONSTRAINT_CLASS));
            if is_integrity {
                ExecutorError::ConstraintViolation {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                    message: db.message().to_string(),
                }
            } else {
                ExecutorError::Database(db.message().to_string())
            }
        }
        sqlx::Error::PoolTimedOut => ExecutorError::Timeout(acquire_timeout),
        sqlx::Error::Io(e) => ExecutorError::Connection(e.to_string()),
        sqlx::Error::Tls(e) => ExecutorError::Connection(e.to_string()),
        sqlx::Error::PoolClosed => ExecutorError::Connection("pool closed".to_string()),
        other => ExecutorError::Database(other.to_string()),
    }
}
