//! Image transform pipeline
//!
//! A pure function from (source bytes, [`TransformRequest`]) to encoded bytes
//! plus a content type:
//!
//! ```text
//! decode → crop → geometry → resize → normalize → encode
//! ```
//!
//! # Query Parameters
//! ```text
//! /api/transform/{bucket}/{path}?w=800&h=600&fit=cover&crop=center&format=webp&quality=85
//! ```

pub mod cache_key;
pub mod crop;
pub mod encoder;
pub mod error;
pub mod format;
pub mod geometry;
pub mod normalize;
pub mod params;
pub mod processor;
pub mod resize;

pub use cache_key::cache_key;
pub use encoder::{EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};
pub use error::TransformError;
pub use format::ColorMode;
pub use geometry::Dimensions;
pub use params::{capabilities, CropMode, FitMode, OutputFormat, TransformLimits, TransformRequest};
pub use processor::{decode_image, process_image, ProcessedImage, SourceImage};
