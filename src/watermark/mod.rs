//! Logo watermarking for uploaded images.
//!
//! A single PNG logo is scaled relative to the base width, dimmed by a
//! global opacity and composited at one of five anchors. Watermarking is an
//! upload-time feature; the on-demand transform path never applies it.
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   logo_path: /etc/mediacdn/logo.png
//!   position: bottom-right
//!   opacity: 0.7
//!   scale_percent: 20
//!   padding: 10
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod position;
pub mod store;

pub use compositor::{apply_watermark, decode_logo, prepare_logo};
pub use config::{WatermarkPosition, WatermarkSettings, WatermarkSpec};
pub use error::WatermarkError;
pub use position::{calculate_position, LayerSize, PlacementPosition};
pub use store::{
    ActiveWatermark, DecodedWatermark, WatermarkState, WatermarkStore, WatermarkUpdate,
    WatermarkView,
};
