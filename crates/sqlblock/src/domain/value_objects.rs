//! # Value Objects
//!
//! Configuration for the ingestion service and its executors.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the database URL.
pub const ENV_DATABASE_URL: &str = "SQLBLOCK_DATABASE_URL";
/// Fallback database URL variable.
pub const ENV_DATABASE_URL_FALLBACK: &str = "DATABASE_URL";
pub const ENV_MAX_CONNECTIONS: &str = "SQLBLOCK_MAX_CONNECTIONS";
pub const ENV_ACQUIRE_TIMEOUT_MS: &str = "SQLBLOCK_ACQUIRE_TIMEOUT_MS";
pub const ENV_STATEMENT_TIMEOUT_MS: &str = "SQLBLOCK_STATEMENT_TIMEOUT_MS";

/// Invalid ingestion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("max_connections must be at least 1")]
    ZeroConnections,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("no database URL configured (set SQLBLOCK_DATABASE_URL or DATABASE_URL)")]
    MissingDatabaseUrl,
}

/// Configuration for ingestion.
///
/// All values have defaults suitable for a local development database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Connection string for the SQL executor. `None` when only the
    /// in-memory executor is used.
    pub database_url: Option<String>,

    /// Upper bound of pooled connections (default: 5).
    pub max_connections: u32,

    /// How long to wait for a pooled connection (default: 5s).
    pub acquire_timeout: Duration,

    /// Deadline for one statement execution (default: 30s).
    ///
    /// Ingesting a block with multi-megabyte calldata is a single round trip,
    /// so this bounds the whole attempt.
    pub statement_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

impl IngestConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SQLBLOCK_DATABASE_URL`, falling back to `DATABASE_URL`
    /// - `SQLBLOCK_MAX_CONNECTIONS` (default: 5)
    /// - `SQLBLOCK_ACQUIRE_TIMEOUT_MS` (default: 5000)
    /// - `SQLBLOCK_STATEMENT_TIMEOUT_MS` (default: 30000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`IngestConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup(ENV_DATABASE_URL)
            .or_else(|| lookup(ENV_DATABASE_URL_FALLBACK))
            .filter(|url| !url.trim().is_empty());

        let max_connections = parse_var(&lookup, ENV_MAX_CONNECTIONS)?
            .unwrap_or(defaults.max_connections);
        let acquire_timeout = parse_var(&lookup, ENV_ACQUIRE_TIMEOUT_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.acquire_timeout);
        let statement_timeout = parse_var(&lookup, ENV_STATEMENT_TIMEOUT_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.statement_timeout);

        let config = Self {
            database_url,
            max_connections,
            acquire_timeout,
            statement_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the database URL.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Set the statement timeout.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Check limits. Does not require a database URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::ZeroConnections);
        }
        if self.acquire_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("acquire_timeout"));
        }
        if self.statement_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("statement_timeout"));
        }
        Ok(())
    }

    /// The database URL, or an error if none is configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}
