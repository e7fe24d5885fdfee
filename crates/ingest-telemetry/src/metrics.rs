//! Prometheus export of ingestion metrics.
//!
//! All metrics follow the naming convention `<namespace>_<metric>_<unit>`:
//!
//! - `blocks_total{outcome}`: fresh / duplicate / rejected / encoding_failure /
//!   execution_failure
//! - `rejections_total{constraint}`: rejections by constraint name
//! - `rows_inserted_total`
//! - `execution_duration_seconds`: histogram of executor time

use std::time::Duration;

use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};
use sqlblock::MetricsRecorder;

use crate::TelemetryError;

const OUTCOME_FRESH: &str = "fresh";
const OUTCOME_DUPLICATE: &str = "duplicate";
const OUTCOME_REJECTED: &str = "rejected";
const OUTCOME_ENCODING_FAILURE: &str = "encoding_failure";
const OUTCOME_EXECUTION_FAILURE: &str = "execution_failure";

fn metrics_err(e: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsInit(e.to_string())
}

/// `MetricsRecorder` backed by its own Prometheus registry.
///
/// The registry is not the process-global one, so several recorders (one per
/// test, say) never collide on metric names.
#[derive(Clone)]
pub struct PrometheusRecorder {
    registry: Registry,
    blocks: IntCounterVec,
    rejections: IntCounterVec,
    rows_inserted: IntCounter,
    execution_duration: Histogram,
}

impl PrometheusRecorder {
    /// Create and register all ingestion metrics under `namespace`.
    pub fn new(namespace: &str) -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let blocks = IntCounterVec::new(
            Opts::new("blocks_total", "Block submissions by outcome").namespace(namespace),
            &["outcome"],
        )
        .map_err(metrics_err)?;

        let rejections = IntCounterVec::new(
            Opts::new("rejections_total", "Rejected blocks by violated constraint")
                .namespace(namespace),
            &["constraint"],
        )
        .map_err(metrics_err)?;

        let rows_inserted = IntCounter::with_opts(
            Opts::new("rows_inserted_total", "Rows inserted across all relations")
                .namespace(namespace),
        )
        .map_err(metrics_err)?;

        let execution_duration = Histogram::with_opts(
            HistogramOpts::new(
                "execution_duration_seconds",
                "Time spent executing ingestion statements",
            )
            .namespace(namespace)
            .buckets(exponential_buckets(0.0005, 2.0, 16).map_err(metrics_err)?),
        )
        .map_err(metrics_err)?;

        registry
            .register(Box::new(blocks.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(rejections.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(rows_inserted.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(execution_duration.clone()))
            .map_err(metrics_err)?;

        Ok(Self {
            registry,
            blocks,
            rejections,
            rows_inserted,
            execution_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Count of submissions with the given outcome label.
    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.blocks.with_label_values(&[outcome]).get()
    }

    /// Encode all metrics as Prometheus text format.
    pub fn render(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(metrics_err)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }

    fn observe(&self, outcome: &str, duration: Option<Duration>) {
        self.blocks.with_label_values(&[outcome]).inc();
        if let Some(duration) = duration {
            self.execution_duration.observe(duration.as_secs_f64());
        }
    }
}

impl MetricsRecorder for PrometheusRecorder {
    fn record_fresh(&self, rows: u64, duration: Duration) {
        self.rows_inserted.inc_by(rows);
        self.observe(OUTCOME_FRESH, Some(duration));
    }

    fn record_duplicate(&self, duration: Duration) {
        self.observe(OUTCOME_DUPLICATE, Some(duration));
    }

    fn record_rejected(&self, constraint: &str, duration: Duration) {
        self.rejections.with_label_values(&[constraint]).inc();
        self.observe(OUTCOME_REJECTED, Some(duration));
    }

    fn record_encoding_failure(&self) {
        self.observe(OUTCOME_ENCODING_FAILURE, None);
    }

    fn record_execution_failure(&self, duration: Duration) {
        self.observe(OUTCOME_EXECUTION_FAILURE, Some(duration));
    }
}
