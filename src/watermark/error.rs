//! Watermark error types.
//!
//! The upload pipeline treats every variant as best-effort: it logs the error
//! and stores the image without a watermark.

use std::fmt;

/// Errors that can occur while loading or applying a watermark.
#[derive(Debug, Clone)]
pub enum WatermarkError {
    /// No logo has been uploaded
    MissingLogo,

    /// Stored logo bytes are not a decodable image
    DecodeError(String),

    /// Rejected logo upload (wrong format, empty file)
    InvalidLogo(String),

    /// Invalid configuration value
    ConfigError(String),

    /// Failed to composite watermark onto image
    CompositeError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLogo => write!(f, "No watermark logo configured"),
            Self::DecodeError(msg) => write!(f, "Failed to decode watermark image: {}", msg),
            Self::InvalidLogo(msg) => write!(f, "Invalid watermark logo: {}", msg),
            Self::ConfigError(msg) => write!(f, "Watermark configuration error: {}", msg),
            Self::CompositeError(msg) => write!(f, "Failed to composite watermark: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}

impl WatermarkError {
    /// HTTP status for the watermark management operations
    pub fn to_http_status(&self) -> u16 {
        match self {
            Self::MissingLogo => 404,
            Self::InvalidLogo(_) | Self::ConfigError(_) => 400,
            Self::DecodeError(_) | Self::CompositeError(_) => 500,
        }
    }
}
