//! Upload file classification and content types

use std::path::Path;

use serde::Serialize;

use crate::config::UploadConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Video => "video",
        }
    }

    /// Classify a lowercase dotted extension against the allow lists
    pub fn classify(extension: &str, config: &UploadConfig) -> Option<Self> {
        let allowed = |list: &[String]| list.iter().any(|e| e.eq_ignore_ascii_case(extension));
        if allowed(&config.allowed_image_extensions) {
            Some(FileType::Image)
        } else if allowed(&config.allowed_video_extensions) {
            Some(FileType::Video)
        } else {
            None
        }
    }
}

/// Lowercase extension with a leading dot, or an empty string
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Content type stored with an object, guessed from its extension
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".svg" => "image/svg+xml",
        ".mp4" | ".m4v" => "video/mp4",
        ".webm" => "video/webm",
        ".avi" => "video/x-msvideo",
        ".mov" => "video/quicktime",
        ".mkv" => "video/x-matroska",
        ".flv" => "video/x-flv",
        _ => "application/octet-stream",
    }
}
