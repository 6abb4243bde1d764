// Media pipeline Prometheus metrics
//
// - Transform counters by output format and result
// - Transform duration histogram
// - Upload outcomes by file type, upload errors
// - Watermark outcomes (applied, failed, skipped)
// - Object store operations by operation and success

use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, Histogram, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Outcome of the watermark step for one uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkOutcome {
    Applied,
    Failed,
    Skipped,
}

impl WatermarkOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Global metrics registry for the media pipeline
pub struct MediaMetrics {
    /// Transforms by output format and result (success, error)
    pub transforms: IntCounterVec,

    /// Transform duration histogram (in seconds)
    pub transform_duration: HistogramVec,

    /// Stored uploads by file type (image, video)
    pub uploads: IntCounterVec,

    /// Rejected upload files by reason
    pub upload_errors: IntCounterVec,

    /// Watermark step outcomes
    pub watermarks: IntCounterVec,

    /// Object store calls by operation and success
    pub storage_operations: IntCounterVec,
}

/// Global singleton instance of metrics
static METRICS: OnceLock<MediaMetrics> = OnceLock::new();

impl MediaMetrics {
    /// Initialize and return the global metrics instance
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let transforms = register_int_counter_vec!(
                "mediacdn_transforms_total",
                "Total number of image transforms by output format and result",
                &["format", "result"]
            )
            .expect("Failed to register transforms_total metric");

            let transform_duration = register_histogram_vec!(
                "mediacdn_transform_duration_seconds",
                "Duration of image transforms in seconds",
                &["format"],
                vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
            )
            .expect("Failed to register transform_duration_seconds metric");

            let uploads = register_int_counter_vec!(
                "mediacdn_uploads_total",
                "Total number of stored uploads by file type",
                &["file_type"]
            )
            .expect("Failed to register uploads_total metric");

            let upload_errors = register_int_counter_vec!(
                "mediacdn_upload_errors_total",
                "Total number of rejected upload files by reason",
                &["reason"]
            )
            .expect("Failed to register upload_errors_total metric");

            let watermarks = register_int_counter_vec!(
                "mediacdn_watermark_total",
                "Watermark step outcomes during uploads",
                &["outcome"]
            )
            .expect("Failed to register watermark_total metric");

            let storage_operations = register_int_counter_vec!(
                "mediacdn_storage_operations_total",
                "Object store operations by operation and success",
                &["operation", "success"]
            )
            .expect("Failed to register storage_operations_total metric");

            MediaMetrics {
                transforms,
                transform_duration,
                uploads,
                upload_errors,
                watermarks,
                storage_operations,
            }
        })
    }

    pub fn record_transform(&self, format: &str, success: bool) {
        let result = if success { "success" } else { "error" };
        self.transforms.with_label_values(&[format, result]).inc();
    }

    pub fn record_upload(&self, file_type: &str) {
        self.uploads.with_label_values(&[file_type]).inc();
    }

    pub fn record_upload_error(&self, reason: &str) {
        self.upload_errors.with_label_values(&[reason]).inc();
    }

    pub fn record_watermark(&self, outcome: WatermarkOutcome) {
        self.watermarks.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn record_storage_operation(&self, operation: &str, success: bool) {
        let success = if success { "true" } else { "false" };
        self.storage_operations
            .with_label_values(&[operation, success])
            .inc();
    }

    /// Start timing a transform; the duration is recorded on drop
    pub fn start_transform_timer(&self, format: &str) -> HistogramTimer {
        HistogramTimer {
            histogram: self.transform_duration.with_label_values(&[format]),
            start: std::time::Instant::now(),
        }
    }

    /// Text exposition of every registered metric
    pub fn render() -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// RAII timer for histogram metrics
///
/// Automatically records duration when dropped.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
