//! Source format and color mode detection
//!
//! The decoded raster alone loses two facts the pipeline needs: which
//! container the bytes came in (to keep the source format when none is
//! requested) and whether the source was palette-indexed (which JPEG cannot
//! carry). Both are sniffed from the raw bytes here.

use image::{DynamicImage, ImageFormat};

use super::params::OutputFormat;

/// PNG signature followed by the IHDR chunk header
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Offset of the IHDR color type byte in a PNG stream
const PNG_COLOR_TYPE_OFFSET: usize = 25;

/// IHDR color type for indexed-color images
const PNG_COLOR_TYPE_PALETTE: u8 = 3;

/// Pixel layout of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Single-channel grayscale
    L,
    /// Grayscale with alpha
    La,
    Rgb,
    Rgba,
    /// Indexed color (PNG color type 3, GIF)
    Palette,
    /// High bit depth or float layouts
    Other,
}

impl ColorMode {
    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorMode::La | ColorMode::Rgba)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::L => "L",
            ColorMode::La => "LA",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::Palette => "P",
            ColorMode::Other => "other",
        }
    }

    /// Mode of a decoded raster, without palette knowledge
    pub fn of(img: &DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(_) => ColorMode::L,
            DynamicImage::ImageLumaA8(_) => ColorMode::La,
            DynamicImage::ImageRgb8(_) => ColorMode::Rgb,
            DynamicImage::ImageRgba8(_) => ColorMode::Rgba,
            _ => ColorMode::Other,
        }
    }
}

/// Detect the container format of encoded bytes, if it is one we can emit
pub fn detect_source_format(data: &[u8]) -> Option<OutputFormat> {
    match image::guess_format(data).ok()? {
        ImageFormat::Png => Some(OutputFormat::Png),
        ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
        ImageFormat::WebP => Some(OutputFormat::WebP),
        ImageFormat::Gif => Some(OutputFormat::Gif),
        _ => None,
    }
}

/// Whether the encoded source is palette-indexed
pub fn is_palette_source(data: &[u8]) -> bool {
    if data.len() > PNG_COLOR_TYPE_OFFSET && data.starts_with(&PNG_SIGNATURE) {
        return data[PNG_COLOR_TYPE_OFFSET] == PNG_COLOR_TYPE_PALETTE;
    }
    detect_source_format(data) == Some(OutputFormat::Gif)
}

/// Color mode of a source, combining the raster layout with the palette sniff
pub fn detect_color_mode(data: &[u8], img: &DynamicImage) -> ColorMode {
    if is_palette_source(data) {
        ColorMode::Palette
    } else {
        ColorMode::of(img)
    }
}

/// Pick the output format: explicit request, else source format, else WebP
pub fn resolve_output_format(
    requested: Option<OutputFormat>,
    source: Option<OutputFormat>,
) -> OutputFormat {
    requested.or(source).unwrap_or(OutputFormat::WebP)
}
