//! Watermark compositor for blending a logo onto images.
//!
//! Steps, in order:
//! 1. The base is promoted to RGBA
//! 2. The logo is capped at `scale_percent` of the base width (never upscaled)
//! 3. Logo alpha is multiplied by the configured opacity
//! 4. The logo is placed at its anchor and alpha-composited ("over")
//! 5. A base without alpha is flattened back to RGB
//!
//! ```ignore
//! use mediacdn::watermark::{apply_watermark, WatermarkSpec};
//!
//! let logo = decode_logo(&png_bytes)?;
//! let result = apply_watermark(base_image, &logo, &WatermarkSpec::default())?;
//! ```

use image::{DynamicImage, Rgba, RgbaImage};

use super::config::WatermarkSpec;
use super::error::WatermarkError;
use super::position::{calculate_position, is_visible, LayerSize, PlacementPosition};
use crate::transform::geometry::Dimensions;
use crate::transform::resize::resize_exact;

/// Decode stored logo bytes.
pub fn decode_logo(data: &[u8]) -> Result<DynamicImage, WatermarkError> {
    if data.is_empty() {
        return Err(WatermarkError::MissingLogo);
    }
    image::load_from_memory(data).map_err(|e| WatermarkError::DecodeError(e.to_string()))
}

/// Largest logo width allowed on a base of `base_width` pixels.
pub fn max_logo_width(base_width: u32, scale_percent: u8) -> u32 {
    ((base_width as u64 * scale_percent as u64) / 100).max(1) as u32
}

/// Scale the logo to fit the width cap and apply the opacity multiplier.
pub fn prepare_logo(
    logo: &DynamicImage,
    base_width: u32,
    spec: &WatermarkSpec,
) -> Result<RgbaImage, WatermarkError> {
    let max_width = max_logo_width(base_width, spec.scale_percent);

    let mut layer = if logo.width() > max_width {
        let height = ((logo.height() as u64 * max_width as u64) / logo.width() as u64).max(1);
        let rgba = DynamicImage::ImageRgba8(logo.to_rgba8());
        resize_exact(&rgba, Dimensions::new(max_width, height as u32))
            .map_err(|e| WatermarkError::CompositeError(e.to_string()))?
            .into_rgba8()
    } else {
        logo.to_rgba8()
    };

    let opacity = spec.opacity.clamp(0.0, 1.0);
    for pixel in layer.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * opacity) as u8;
    }

    Ok(layer)
}

/// Blend `layer` onto `target` at `position`, clipping to the target bounds.
pub fn composite(target: &mut RgbaImage, layer: &RgbaImage, position: PlacementPosition) {
    let target_size = LayerSize {
        width: target.width(),
        height: target.height(),
    };
    let layer_size = LayerSize {
        width: layer.width(),
        height: layer.height(),
    };
    if !is_visible(position, target_size, layer_size) {
        return;
    }

    let x_start = position.x.max(0);
    let y_start = position.y.max(0);
    let x_end = (position.x + layer_size.width as i64).min(target_size.width as i64);
    let y_end = (position.y + layer_size.height as i64).min(target_size.height as i64);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let fg = *layer.get_pixel((tx - position.x) as u32, (ty - position.y) as u32);
            let bg = target.get_pixel_mut(tx as u32, ty as u32);
            *bg = blend_pixels(*bg, fg);
        }
    }
}

/// Porter-Duff "over": result = foreground + background * (1 - foreground.alpha)
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match foreground[3] {
        0 => return background,
        255 => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let value = (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Apply a decoded logo to `base` according to `spec`.
pub fn apply_watermark(
    base: DynamicImage,
    logo: &DynamicImage,
    spec: &WatermarkSpec,
) -> Result<DynamicImage, WatermarkError> {
    spec.validate()?;

    let base_had_alpha = base.color().has_alpha();
    let mut canvas = base.into_rgba8();

    let layer = prepare_logo(logo, canvas.width(), spec)?;
    let position = calculate_position(
        spec.position,
        LayerSize {
            width: canvas.width(),
            height: canvas.height(),
        },
        LayerSize {
            width: layer.width(),
            height: layer.height(),
        },
        spec.padding,
    );

    tracing::debug!(
        position = spec.position.as_str(),
        x = position.x,
        y = position.y,
        logo_width = layer.width(),
        logo_height = layer.height(),
        "Compositing watermark"
    );

    composite(&mut canvas, &layer, position);

    let result = DynamicImage::ImageRgba8(canvas);
    if base_had_alpha {
        Ok(result)
    } else {
        Ok(DynamicImage::ImageRgb8(result.to_rgb8()))
    }
}
