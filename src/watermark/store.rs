//! In-process watermark configuration store.
//!
//! Holds the logo bytes and the active `WatermarkSpec`. Readers take a
//! snapshot per call; writers swap in a whole new state, so an upload batch
//! that read a snapshot keeps seeing it even if an admin edits the config
//! halfway through.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::Serialize;

use super::compositor::decode_logo;
use super::config::{WatermarkPosition, WatermarkSettings, WatermarkSpec};
use super::error::WatermarkError;

/// Stored watermark state.
#[derive(Debug, Clone, Default)]
pub struct WatermarkState {
    pub spec: WatermarkSpec,
    pub is_active: bool,
    pub logo: Option<Bytes>,
    pub logo_filename: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read-only view of the configuration, without the logo bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkView {
    pub has_logo: bool,
    pub position: WatermarkPosition,
    pub opacity: f32,
    pub scale_percent: u8,
    pub padding: u32,
    pub is_active: bool,
}

/// Partial update of the placement settings.
#[derive(Debug, Clone, Default)]
pub struct WatermarkUpdate {
    pub position: Option<WatermarkPosition>,
    pub opacity: Option<f32>,
    pub scale_percent: Option<u8>,
    pub padding: Option<u32>,
}

impl WatermarkUpdate {
    fn apply_to(&self, spec: &WatermarkSpec) -> WatermarkSpec {
        WatermarkSpec {
            position: self.position.unwrap_or(spec.position),
            opacity: self.opacity.unwrap_or(spec.opacity),
            scale_percent: self.scale_percent.unwrap_or(spec.scale_percent),
            padding: self.padding.unwrap_or(spec.padding),
        }
    }
}

/// A watermark that is active and has logo data.
#[derive(Debug, Clone)]
pub struct ActiveWatermark {
    pub spec: WatermarkSpec,
    pub logo: Bytes,
}

impl ActiveWatermark {
    /// Decode the logo once so a batch can reuse it for every file.
    pub fn decode(&self) -> Result<DecodedWatermark, WatermarkError> {
        Ok(DecodedWatermark {
            spec: self.spec,
            logo: decode_logo(&self.logo)?,
        })
    }
}

/// An active watermark with its logo already decoded.
#[derive(Debug, Clone)]
pub struct DecodedWatermark {
    pub spec: WatermarkSpec,
    pub logo: DynamicImage,
}

/// Watermark configuration store.
#[derive(Debug, Default)]
pub struct WatermarkStore {
    state: ArcSwap<WatermarkState>,
}

impl WatermarkStore {
    /// Empty store: no logo, default spec, inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the config file section, loading `logo_path` when set.
    pub fn from_settings(settings: &WatermarkSettings) -> Result<Self, WatermarkError> {
        settings.spec.validate()?;

        let mut state = WatermarkState {
            spec: settings.spec,
            ..Default::default()
        };

        if let Some(path) = settings.logo_path.as_deref() {
            let data = std::fs::read(path).map_err(|e| {
                WatermarkError::ConfigError(format!("cannot read logo '{}': {}", path, e))
            })?;
            validate_png(&data)?;
            state.logo = Some(Bytes::from(data));
            state.logo_filename = Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            state.is_active = settings.enabled;
            state.updated_at = Some(Utc::now());

            tracing::info!(logo_path = %path, active = settings.enabled, "Watermark logo loaded");
        }

        Ok(Self {
            state: ArcSwap::from_pointee(state),
        })
    }

    /// Current state.
    pub fn state(&self) -> Arc<WatermarkState> {
        self.state.load_full()
    }

    /// The watermark to apply right now, if any.
    pub fn snapshot(&self) -> Option<ActiveWatermark> {
        let state = self.state.load();
        match (&state.logo, state.is_active) {
            (Some(logo), true) => Some(ActiveWatermark {
                spec: state.spec,
                logo: logo.clone(),
            }),
            _ => None,
        }
    }

    /// Configuration view; defaults when nothing has been configured.
    pub fn config(&self) -> WatermarkView {
        let state = self.state.load();
        WatermarkView {
            has_logo: state.logo.is_some(),
            position: state.spec.position,
            opacity: state.spec.opacity,
            scale_percent: state.spec.scale_percent,
            padding: state.spec.padding,
            is_active: state.is_active,
        }
    }

    /// Raw logo bytes (PNG).
    pub fn logo(&self) -> Result<Bytes, WatermarkError> {
        self.state
            .load()
            .logo
            .clone()
            .ok_or(WatermarkError::MissingLogo)
    }

    /// Replace the logo, optionally adjusting placement, and activate.
    ///
    /// Only PNG is accepted; the bytes must also decode.
    pub fn set_logo(
        &self,
        filename: &str,
        data: Bytes,
        update: WatermarkUpdate,
    ) -> Result<WatermarkView, WatermarkError> {
        validate_png(&data)?;

        let current = self.state.load_full();
        let spec = update.apply_to(&current.spec);
        spec.validate()?;

        self.state.store(Arc::new(WatermarkState {
            spec,
            is_active: true,
            logo: Some(data),
            logo_filename: Some(filename.to_string()),
            updated_at: Some(Utc::now()),
        }));

        tracing::info!(filename = %filename, position = spec.position.as_str(), "Watermark logo updated");
        Ok(self.config())
    }

    /// Change placement settings without touching the logo.
    pub fn update_config(&self, update: WatermarkUpdate) -> Result<WatermarkView, WatermarkError> {
        let current = self.state.load_full();
        if current.logo.is_none() {
            return Err(WatermarkError::MissingLogo);
        }

        let spec = update.apply_to(&current.spec);
        spec.validate()?;

        self.state.rcu(|state| WatermarkState {
            spec,
            updated_at: Some(Utc::now()),
            ..(**state).clone()
        });
        Ok(self.config())
    }

    /// Enable or disable watermarking globally.
    pub fn toggle(&self, is_active: bool) -> Result<bool, WatermarkError> {
        if self.state.load().logo.is_none() {
            return Err(WatermarkError::MissingLogo);
        }

        self.state.rcu(|state| WatermarkState {
            is_active,
            updated_at: Some(Utc::now()),
            ..(**state).clone()
        });
        tracing::info!(active = is_active, "Watermark toggled");
        Ok(is_active)
    }

    /// Remove logo and settings.
    pub fn clear(&self) -> Result<(), WatermarkError> {
        if self.state.load().logo.is_none() {
            return Err(WatermarkError::MissingLogo);
        }
        self.state.store(Arc::new(WatermarkState::default()));
        tracing::info!("Watermark deleted");
        Ok(())
    }
}

fn validate_png(data: &[u8]) -> Result<(), WatermarkError> {
    if data.is_empty() {
        return Err(WatermarkError::InvalidLogo("logo file is empty".to_string()));
    }
    if image::guess_format(data).ok() != Some(image::ImageFormat::Png) {
        return Err(WatermarkError::InvalidLogo(
            "only PNG files with transparency are supported".to_string(),
        ));
    }
    decode_logo(data).map(|_| ())
}
