//! Transform pipeline error types
//!
//! Structured errors with HTTP status mapping. Decode failures map to 500:
//! the source was already accepted into storage, so a bad raster there is an
//! internal failure rather than a client error.

use std::fmt;

/// Errors that can occur while serving or computing an image variant
#[derive(Debug, Clone)]
pub enum TransformError {
    // === Lookup Errors ===
    /// Object store has no such bucket/path
    SourceNotFound { bucket: String, path: String },
    /// Object store failed for a reason other than a missing object
    Storage { message: String },

    // === Parameter Errors ===
    /// Request violates a documented precondition
    InvalidParameter { param: String, message: String },
    /// Requested dimensions are outside the accepted range
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },
    /// Quality value out of range
    InvalidQuality { quality: u32 },

    // === Processing Errors ===
    /// Source bytes are not a decodable raster
    DecodeFailed { message: String },
    /// Resampling failed
    ResizeFailed { message: String },
    /// Output serialization failed
    EncodeFailed { format: String, message: String },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::SourceNotFound { bucket, path } => {
                write!(f, "Image not found: {}/{}", bucket, path)
            }
            TransformError::Storage { message } => {
                write!(f, "Object store error: {}", message)
            }
            TransformError::InvalidParameter { param, message } => {
                write!(f, "Invalid parameter '{}': {}", param, message)
            }
            TransformError::InvalidDimensions {
                width,
                height,
                reason,
            } => {
                write!(f, "Invalid dimensions {}x{}: {}", width, height, reason)
            }
            TransformError::InvalidQuality { quality } => {
                write!(f, "Invalid quality {}: must be 1-100", quality)
            }
            TransformError::DecodeFailed { message } => {
                write!(f, "Image transformation failed: cannot decode source: {}", message)
            }
            TransformError::ResizeFailed { message } => {
                write!(f, "Image transformation failed: resize: {}", message)
            }
            TransformError::EncodeFailed { format, message } => {
                write!(
                    f,
                    "Image transformation failed: cannot encode {}: {}",
                    format, message
                )
            }
        }
    }
}

impl std::error::Error for TransformError {}

impl TransformError {
    /// Maps transform errors to HTTP status codes
    ///
    /// - SourceNotFound → 404
    /// - InvalidParameter, InvalidDimensions, InvalidQuality → 400
    /// - DecodeFailed, ResizeFailed, EncodeFailed → 500
    /// - Storage → 502
    pub fn to_http_status(&self) -> u16 {
        match self {
            TransformError::SourceNotFound { .. } => 404,

            TransformError::InvalidParameter { .. }
            | TransformError::InvalidDimensions { .. }
            | TransformError::InvalidQuality { .. } => 400,

            TransformError::DecodeFailed { .. }
            | TransformError::ResizeFailed { .. }
            | TransformError::EncodeFailed { .. } => 500,

            TransformError::Storage { .. } => 502,
        }
    }

    /// Whether the error was caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.to_http_status())
    }

    pub fn source_not_found(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        TransformError::SourceNotFound {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        TransformError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        TransformError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        TransformError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        TransformError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_not_found_display() {
        let err = TransformError::source_not_found("media", "photos/cat.jpg");
        assert_eq!(err.to_string(), "Image not found: media/photos/cat.jpg");
        assert_eq!(err.to_http_status(), 404);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_decode_failed_is_server_error() {
        let err = TransformError::decode_failed("invalid header");
        assert!(err.to_string().contains("invalid header"));
        assert_eq!(err.to_http_status(), 500);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_encode_failed_display() {
        let err = TransformError::encode_failed("webp", "encoder error");
        assert_eq!(
            err.to_string(),
            "Image transformation failed: cannot encode webp: encoder error"
        );
        assert_eq!(err.to_http_status(), 500);
    }

    #[test]
    fn test_invalid_param_display() {
        let err = TransformError::invalid_param("w", "must be 1-4000");
        assert_eq!(err.to_string(), "Invalid parameter 'w': must be 1-4000");
        assert_eq!(err.to_http_status(), 400);
    }

    #[test]
    fn test_invalid_quality_display() {
        let err = TransformError::InvalidQuality { quality: 150 };
        assert_eq!(err.to_string(), "Invalid quality 150: must be 1-100");
        assert_eq!(err.to_http_status(), 400);
    }

    #[test]
    fn test_storage_error_maps_to_bad_gateway() {
        let err = TransformError::Storage {
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_http_status(), 502);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransformError>();
    }
}
