//! # Adapters
//!
//! Implementations of the `Executor` port.
//!
//! - `memory` - In-process engine enforcing the same schema rules
//! - `postgres` - PostgreSQL via `sqlx` (feature `postgres`)

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{InMemoryExecutor, StoredRow};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresExecutor, PostgresSetupError};
