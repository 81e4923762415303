//! Metrics reader capability seam.
//!
//! The control plane never parses metric files itself; an external reader
//! supplies per-artifact scalar series (accuracy and loss over epochs).
//! When no data was recorded for an artifact the reader signals
//! [`MetricsError::NoData`] and the artifact store substitutes empty
//! placeholders instead of propagating the failure.

use thiserror::Error;

/// Errors from metric series retrieval.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// No metric data was recorded for this artifact.
    #[error("no metric data recorded for artifact '{artifact}'")]
    NoData { artifact: String },
}

/// Scalar series for one artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    /// Validation accuracy per epoch.
    pub test_acc: Vec<f64>,
    /// Training accuracy per epoch.
    pub train_acc: Vec<f64>,
    /// Validation loss per epoch.
    pub test_loss: Vec<f64>,
    /// Training loss per epoch.
    pub train_loss: Vec<f64>,
    /// Number of epochs recorded.
    pub epoch_count: u32,
}

/// Capability for fetching per-artifact metric series.
pub trait MetricsReader: Send + Sync {
    /// Fetches the recorded series for an artifact (by cache-entry stem).
    fn fetch_series(&self, artifact: &str) -> Result<MetricSeries, MetricsError>;
}

/// Reader that never has data; the default when no telemetry is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsReader;

impl MetricsReader for NoopMetricsReader {
    fn fetch_series(&self, artifact: &str) -> Result<MetricSeries, MetricsError> {
        Err(MetricsError::NoData {
            artifact: artifact.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_reader_always_no_data() {
        let err = NoopMetricsReader.fetch_series("20240101-120000").unwrap_err();
        assert!(matches!(err, MetricsError::NoData { .. }));
        assert!(err.to_string().contains("20240101-120000"));
    }
}
