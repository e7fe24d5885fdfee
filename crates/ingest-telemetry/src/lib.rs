//! # Ingest Telemetry
//!
//! Logging and metrics wiring for processes that run `sqlblock` ingestion.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ingest_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let recorder = init_telemetry(&config)?;
//!
//! let service = BlockIngestService::with_metrics(executor, ingest_config, Arc::new(recorder.clone()));
//! // ... serve `recorder.render()?` on a scrape endpoint
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SQLBLOCK_SERVICE_NAME` | `sqlblock` | Service name in logs |
//! | `SQLBLOCK_LOG_LEVEL` | `info` | Log level filter |
//! | `SQLBLOCK_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `SQLBLOCK_METRICS_NAMESPACE` | `sqlblock` | Metric name prefix |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::PrometheusRecorder;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and create the metrics recorder.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<PrometheusRecorder, TelemetryError> {
    let recorder = PrometheusRecorder::new(&config.metrics_namespace)?;
    init_logging(config)?;
    Ok(recorder)
}
