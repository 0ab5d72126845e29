//! Prometheus metrics for the store runtime and the domain operations.
//!
//! Metrics are always recorded through the `metrics` facade. Without an
//! installed recorder they are dropped; [`MetricsExporter::install`] wires a
//! Prometheus recorder so [`MetricsExporter::render`] can produce the text
//! exposition format.
//!
//! # Example
//!
//! ```rust,no_run
//! use synced_todo_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! if let Some(text) = exporter.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installs a process-wide Prometheus recorder and renders its contents.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter with no recorder installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// A recorder can only be installed once per process. If one is already
    /// present this logs a warning and returns `Ok(())`; [`render`](Self::render)
    /// then returns `None` for this exporter.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this exporter has not installed a recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!("store_actions_total", "Total number of actions dispatched to the store");
    describe_histogram!(
        "store_reducer_duration_seconds",
        "Time spent inside the reducer per action"
    );
    describe_counter!(
        "store_shutdown_rejected_actions_total",
        "Actions rejected because the store was shutting down"
    );

    describe_counter!(
        "todo_operations_total",
        "Domain operations (add, update, delete, hydrate) labelled by outcome"
    );
    describe_histogram!(
        "todo_operation_duration_seconds",
        "End-to-end duration of a domain operation, remote call included"
    );
}

/// Outcome label for a recorded domain operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Remote call and dispatch both succeeded
    Success,
    /// The operation returned an error
    Failure,
}

impl Outcome {
    /// Label value used in the exported series.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Domain operation metrics recorder.
pub struct OperationMetrics;

impl OperationMetrics {
    /// Record one finished operation.
    pub fn record(operation: &'static str, outcome: Outcome, duration: Duration) {
        counter!("todo_operations_total", "operation" => operation, "outcome" => outcome.as_str())
            .increment(1);
        histogram!("todo_operation_duration_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_renders_nothing_before_install() {
        let exporter = MetricsExporter::new();
        assert!(exporter.render().is_none());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(Outcome::Failure.as_str(), "failure");
    }

    #[test]
    fn test_install_and_render() {
        let mut exporter = MetricsExporter::new();
        assert!(exporter.install().is_ok());

        OperationMetrics::record("add", Outcome::Success, Duration::from_millis(12));

        // Another test binary thread may have installed the recorder first.
        if let Some(rendered) = exporter.render() {
            assert!(rendered.contains("todo_operations_total"));
        }
    }
}
