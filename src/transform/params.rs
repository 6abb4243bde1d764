//! Transform request parameters
//!
//! Query format: `?w=800&h=600&format=webp&quality=85&fit=cover&crop=center`
//!
//! Width, height and quality are validated strictly. The enum-valued
//! parameters (`format`, `fit`, `crop`) are lenient: unknown values fall back
//! to WebP, `contain` and "no crop" respectively instead of being rejected.

use std::collections::HashMap;

use serde::Serialize;

use super::error::TransformError;
use crate::constants::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    WebP,
    Jpeg,
    Png,
    Gif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::WebP,
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Gif,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    /// Whether the format keeps alpha and palette images without coercion
    pub fn keeps_color_mode(&self) -> bool {
        matches!(self, Self::Png | Self::WebP)
    }

    /// Strict lookup, `jpg` is an alias of `jpeg`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "webp" => Some(Self::WebP),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Lenient lookup: anything unsupported becomes WebP
    pub fn parse_lenient(name: &str) -> Self {
        Self::from_name(name).unwrap_or(Self::WebP)
    }
}

/// How to reconcile source and requested aspect ratio during resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Shrink to fit within the box, preserving aspect ratio (default)
    #[default]
    Contain,
    /// Resize and center-crop to exactly fill the box
    Cover,
    /// Stretch to the exact box (may distort)
    Fill,
    /// Like contain, but only when the source exceeds the box
    Inside,
}

impl FitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contain => "contain",
            Self::Cover => "cover",
            Self::Fill => "fill",
            Self::Inside => "inside",
        }
    }
}

impl From<&str> for FitMode {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "cover" => FitMode::Cover,
            "fill" => FitMode::Fill,
            "inside" => FitMode::Inside,
            // "contain" and anything unrecognized
            _ => FitMode::Contain,
        }
    }
}

/// Pre-resize sub-region selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    Top,
    Bottom,
    Left,
    Right,
    Center,
    /// Content-aware crop. Approximated by a center crop.
    Entropy,
}

impl CropMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
            Self::Entropy => "entropy",
        }
    }

    /// Unknown modes yield `None`, which the crop engine treats as a no-op
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" => Some(Self::Center),
            "entropy" => Some(Self::Entropy),
            _ => None,
        }
    }
}

/// Upper bounds applied when parsing width/height from a request
#[derive(Debug, Clone, Copy)]
pub struct TransformLimits {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for TransformLimits {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

/// Image transformation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Target width in pixels
    pub width: Option<u32>,
    /// Target height in pixels
    pub height: Option<u32>,
    /// Output format (None = keep source format, WebP if unknown)
    pub format: Option<OutputFormat>,
    /// Output quality for lossy formats (1-100)
    pub quality: u8,
    /// How to fit the image in the target box
    pub fit: FitMode,
    /// Optional crop applied before resize
    pub crop: Option<CropMode>,
}

impl Default for TransformRequest {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            format: None,
            quality: DEFAULT_QUALITY,
            fit: FitMode::Contain,
            crop: None,
        }
    }
}

impl TransformRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_fit(mut self, fit: FitMode) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_crop(mut self, crop: CropMode) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Parse from query parameters (`w`, `h`, `format`, `quality`, `fit`, `crop`)
    ///
    /// Also enforces the "at least one of w/h/format" precondition, so a
    /// rejected request never reaches the object store.
    pub fn from_query(
        params: &HashMap<String, String>,
        limits: &TransformLimits,
    ) -> Result<Self, TransformError> {
        let mut result = Self::default();

        if let Some(w) = params.get("w") {
            result.width = Some(parse_dimension("w", w, limits.max_width)?);
        }

        if let Some(h) = params.get("h") {
            result.height = Some(parse_dimension("h", h, limits.max_height)?);
        }

        if let Some(fmt) = params.get("format") {
            result.format = Some(OutputFormat::parse_lenient(fmt));
        }

        if let Some(q) = params.get("quality") {
            let quality: u32 = q
                .trim()
                .parse()
                .map_err(|_| TransformError::invalid_param("quality", "must be 1-100"))?;
            if !(1..=100).contains(&quality) {
                return Err(TransformError::InvalidQuality { quality });
            }
            result.quality = quality as u8;
        }

        if let Some(fit) = params.get("fit") {
            result.fit = FitMode::from(fit.as_str());
        }

        if let Some(crop) = params.get("crop") {
            result.crop = CropMode::parse(crop);
        }

        result.validate_with(limits)?;
        Ok(result)
    }

    /// [`Self::validate`] plus the configured upper bounds on width and height
    pub fn validate_with(&self, limits: &TransformLimits) -> Result<(), TransformError> {
        self.validate()?;
        if let Some(w) = self.width {
            check_dimension("w", w, limits.max_width)?;
        }
        if let Some(h) = self.height {
            check_dimension("h", h, limits.max_height)?;
        }
        Ok(())
    }

    /// Check the request precondition: a transform needs a size or a format
    pub fn validate(&self) -> Result<(), TransformError> {
        if !self.has_transformations() {
            return Err(TransformError::invalid_param(
                "params",
                "At least one transformation parameter (w, h, or format) is required",
            ));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(TransformError::InvalidQuality {
                quality: self.quality as u32,
            });
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(TransformError::InvalidDimensions {
                width: self.width.unwrap_or(0),
                height: self.height.unwrap_or(0),
                reason: "dimensions must be at least 1 pixel".to_string(),
            });
        }
        Ok(())
    }

    /// Check if any transformation is requested
    pub fn has_transformations(&self) -> bool {
        self.width.is_some() || self.height.is_some() || self.format.is_some()
    }

    /// Non-null parameters, sorted by name, for cache key derivation
    pub fn cache_params(&self) -> Vec<(&'static str, String)> {
        let mut parts = vec![
            ("fit", self.fit.as_str().to_string()),
            ("quality", self.quality.to_string()),
        ];
        if let Some(crop) = self.crop {
            parts.push(("crop", crop.as_str().to_string()));
        }
        if let Some(format) = self.format {
            parts.push(("format", format.as_str().to_string()));
        }
        if let Some(h) = self.height {
            parts.push(("h", h.to_string()));
        }
        if let Some(w) = self.width {
            parts.push(("w", w.to_string()));
        }
        parts.sort_by(|a, b| a.0.cmp(b.0));
        parts
    }
}

fn parse_dimension(param: &str, value: &str, max: u32) -> Result<u32, TransformError> {
    let px: u32 = value
        .trim()
        .parse()
        .map_err(|_| TransformError::invalid_param(param, "invalid pixel value"))?;
    check_dimension(param, px, max)?;
    Ok(px)
}

fn check_dimension(param: &str, px: u32, max: u32) -> Result<(), TransformError> {
    if px == 0 || px > max {
        return Err(TransformError::invalid_param(
            param,
            format!("must be between 1 and {}", max),
        ));
    }
    Ok(())
}

/// Parameter catalogue for the transform endpoint, suitable for an info route
pub fn capabilities(limits: &TransformLimits) -> serde_json::Value {
    serde_json::json!({
        "description": "Image Transformation API - on-the-fly image processing",
        "endpoint": "/api/transform/{bucket}/{path}",
        "parameters": {
            "w": {"type": "integer", "description": "Target width in pixels", "range": format!("1-{}", limits.max_width), "optional": true},
            "h": {"type": "integer", "description": "Target height in pixels", "range": format!("1-{}", limits.max_height), "optional": true},
            "format": {"type": "string", "description": "Output format", "options": ["webp", "jpg", "jpeg", "png", "gif"], "optional": true},
            "quality": {"type": "integer", "description": "Quality for lossy formats", "range": "1-100", "default": DEFAULT_QUALITY, "optional": true},
            "fit": {
                "type": "string",
                "description": "Resize mode",
                "options": {
                    "contain": "Fit within bounds, preserve aspect ratio (default)",
                    "cover": "Fill bounds, preserve aspect, crop excess",
                    "fill": "Exact dimensions (may distort)",
                    "inside": "Only shrink if larger, preserve aspect"
                },
                "default": "contain",
                "optional": true
            },
            "crop": {
                "type": "string",
                "description": "Crop before resize",
                "options": {
                    "center": "Center crop to square",
                    "top": "Crop from top",
                    "bottom": "Crop from bottom",
                    "left": "Crop from left",
                    "right": "Crop from right",
                    "entropy": "Crop to most interesting area (center approximation)"
                },
                "optional": true
            }
        },
        "limits": {
            "max_width": limits.max_width,
            "max_height": limits.max_height,
            "supported_formats": OutputFormat::ALL.iter().map(|f| f.as_str()).collect::<Vec<_>>()
        }
    })
}
