// Error types module

use thiserror::Error;

use crate::storage::StorageError;
use crate::transform::TransformError;
use crate::watermark::WatermarkError;

/// Crate-level error for the service and CLI layers
///
/// Pipeline, watermark and storage errors keep their own types; this enum
/// only unifies them where several can surface from one call.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The whole upload request was refused (empty batch, too many files,
    /// or every file failed in a single-file upload)
    #[error("Upload rejected: {0}")]
    UploadRejected(String),
}

impl MediaError {
    /// HTTP status code a caller would surface for this error
    pub fn to_http_status(&self) -> u16 {
        match self {
            MediaError::Transform(e) => e.to_http_status(),
            MediaError::Watermark(e) => e.to_http_status(),
            MediaError::Storage(StorageError::NotFound { .. }) => 404,
            MediaError::Storage(StorageError::Config(_)) => 500,
            MediaError::Storage(StorageError::Backend { .. }) => 502,
            MediaError::UploadRejected(_) => 400,
        }
    }
}
