//! Watermark configuration types.
//!
//! `WatermarkSpec` is the placement recipe the compositor reads.
//! `WatermarkSettings` is its YAML form, which also says where to find the
//! initial logo and whether watermarking starts out active.
//!
//! ```yaml
//! watermark:
//!   logo_path: /etc/mediacdn/logo.png
//!   position: bottom-right
//!   opacity: 0.7
//!   scale_percent: 20
//!   padding: 10
//!   enabled: true
//! ```

use serde::{Deserialize, Serialize};

use super::error::WatermarkError;
use crate::constants::{
    DEFAULT_WATERMARK_OPACITY, DEFAULT_WATERMARK_PADDING, DEFAULT_WATERMARK_SCALE_PERCENT,
};

/// Anchor for the watermark on the base image.
///
/// Unknown names deserialize to `BottomRight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl WatermarkPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
        }
    }
}

impl From<&str> for WatermarkPosition {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "center" => Self::Center,
            _ => Self::BottomRight,
        }
    }
}

impl From<String> for WatermarkPosition {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

fn default_opacity() -> f32 {
    DEFAULT_WATERMARK_OPACITY
}

fn default_scale_percent() -> u8 {
    DEFAULT_WATERMARK_SCALE_PERCENT
}

fn default_padding() -> u32 {
    DEFAULT_WATERMARK_PADDING
}

fn default_enabled() -> bool {
    true
}

/// Placement, opacity and size of the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSpec {
    #[serde(default)]
    pub position: WatermarkPosition,

    /// Global alpha multiplier (0.0 - 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Maximum logo width as a percentage of the base width (1 - 100)
    #[serde(default = "default_scale_percent")]
    pub scale_percent: u8,

    /// Distance from the anchored edges in pixels
    #[serde(default = "default_padding")]
    pub padding: u32,
}

impl Default for WatermarkSpec {
    fn default() -> Self {
        Self {
            position: WatermarkPosition::default(),
            opacity: default_opacity(),
            scale_percent: default_scale_percent(),
            padding: default_padding(),
        }
    }
}

impl WatermarkSpec {
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(WatermarkError::ConfigError(format!(
                "opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            )));
        }
        if !(1..=100).contains(&self.scale_percent) {
            return Err(WatermarkError::ConfigError(format!(
                "scale_percent must be between 1 and 100, got {}",
                self.scale_percent
            )));
        }
        Ok(())
    }
}

/// Watermark section of the YAML config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSettings {
    /// PNG logo loaded into the store at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,

    #[serde(flatten)]
    pub spec: WatermarkSpec,

    /// Initial active flag
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            logo_path: None,
            spec: WatermarkSpec::default(),
            enabled: default_enabled(),
        }
    }
}
