//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Prefix of every exported metric name
    pub metrics_namespace: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "sqlblock".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_namespace: "sqlblock".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SQLBLOCK_SERVICE_NAME`: Service name (default: sqlblock)
    /// - `SQLBLOCK_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SQLBLOCK_JSON_LOGS`: JSON logs (default: true in containers)
    /// - `SQLBLOCK_METRICS_NAMESPACE`: Metric name prefix (default: sqlblock)
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("SQLBLOCK_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("SQLBLOCK_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: lookup("SQLBLOCK_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_namespace: lookup("SQLBLOCK_METRICS_NAMESPACE")
                .unwrap_or(defaults.metrics_namespace),
        }
    }
}
