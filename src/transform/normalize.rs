//! Color mode normalization before encode
//!
//! Rules, first match wins:
//! 1. JPEG output with alpha or a palette source: flatten onto white RGB
//! 2. Any non-RGB image going to a format other than PNG/WebP: plain RGB
//! 3. Otherwise the image is left alone

use image::{DynamicImage, Rgb, RgbImage};

use super::format::ColorMode;
use super::params::OutputFormat;

/// Coerce `img` into a color mode the output format can carry
///
/// `source_mode` is the mode detected on the original bytes; it is what
/// carries the palette flag, which the decoded raster has already lost.
pub fn normalize_for_format(
    img: DynamicImage,
    source_mode: ColorMode,
    format: OutputFormat,
) -> DynamicImage {
    let has_alpha = img.color().has_alpha();
    let is_palette = source_mode == ColorMode::Palette;

    if format == OutputFormat::Jpeg && (has_alpha || is_palette) {
        return DynamicImage::ImageRgb8(flatten_onto_white(&img));
    }

    let is_rgb = matches!(img, DynamicImage::ImageRgb8(_)) && !is_palette;
    if !is_rgb && !format.keeps_color_mode() {
        return match img {
            DynamicImage::ImageRgb8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };
    }

    img
}

/// Composite every pixel over opaque white and drop the alpha channel
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());

    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = src[3] as u32;
        let over_white = |channel: u8| -> u8 {
            ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        *dst = Rgb([over_white(src[0]), over_white(src[1]), over_white(src[2])]);
    }

    out
}
