//! Resize engine
//!
//! Implements the four fit modes on top of fast_image_resize with a Lanczos3
//! convolution. The decoded pixel layout is kept through the resize, so a
//! grayscale source stays grayscale and an RGB source never gains alpha.

use std::num::NonZeroU32;

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

use super::crop::CropRegion;
use super::error::TransformError;
use super::geometry::Dimensions;
use super::params::FitMode;

/// Size a `contain` resize produces: largest aspect-preserving fit, never upscaled
pub fn contain_size(source: Dimensions, target: Dimensions) -> Dimensions {
    if source.fits_within(target) {
        return source;
    }

    let scale = f64::min(
        target.width as f64 / source.width as f64,
        target.height as f64 / source.height as f64,
    );
    let width = ((source.width as f64 * scale).round() as u32).clamp(1, target.width);
    let height = ((source.height as f64 * scale).round() as u32).clamp(1, target.height);
    Dimensions::new(width, height)
}

/// Centered region of the source with the target's aspect ratio
pub fn cover_region(source: Dimensions, target: Dimensions) -> CropRegion {
    let target_ratio = target.aspect_ratio();

    if source.aspect_ratio() > target_ratio {
        let width = ((source.height as f64 * target_ratio).round() as u32).clamp(1, source.width);
        CropRegion {
            x: (source.width - width) / 2,
            y: 0,
            width,
            height: source.height,
        }
    } else {
        let height =
            ((source.width as f64 / target_ratio).round() as u32).clamp(1, source.height);
        CropRegion {
            x: 0,
            y: (source.height - height) / 2,
            width: source.width,
            height,
        }
    }
}

/// Resize `img` toward `target` according to `fit`
pub fn apply_fit(
    img: DynamicImage,
    target: Dimensions,
    fit: FitMode,
) -> Result<DynamicImage, TransformError> {
    let source = Dimensions::new(img.width(), img.height());

    match fit {
        FitMode::Fill => resize_to(img, target),
        FitMode::Contain => resize_to(img, contain_size(source, target)),
        FitMode::Inside => {
            if source.fits_within(target) {
                Ok(img)
            } else {
                resize_to(img, contain_size(source, target))
            }
        }
        FitMode::Cover => {
            let region = cover_region(source, target);
            let cropped = if region.width == source.width && region.height == source.height {
                img
            } else {
                img.crop_imm(region.x, region.y, region.width, region.height)
            };
            resize_to(cropped, target)
        }
    }
}

fn resize_to(img: DynamicImage, target: Dimensions) -> Result<DynamicImage, TransformError> {
    if img.width() == target.width && img.height() == target.height {
        return Ok(img);
    }
    resize_exact(&img, target)
}

/// Resample `img` to exactly `target` with Lanczos3
pub fn resize_exact(img: &DynamicImage, target: Dimensions) -> Result<DynamicImage, TransformError> {
    let src_width = NonZeroU32::new(img.width())
        .ok_or_else(|| TransformError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| TransformError::resize_failed("Source height is 0"))?;
    let dst_width = NonZeroU32::new(target.width)
        .ok_or_else(|| TransformError::resize_failed("Target width is 0"))?;
    let dst_height = NonZeroU32::new(target.height)
        .ok_or_else(|| TransformError::resize_failed("Target height is 0"))?;

    let (pixel_type, raw) = match img {
        DynamicImage::ImageLuma8(buf) => (PixelType::U8, buf.as_raw().clone()),
        DynamicImage::ImageLumaA8(buf) => (PixelType::U8x2, buf.as_raw().clone()),
        DynamicImage::ImageRgb8(buf) => (PixelType::U8x3, buf.as_raw().clone()),
        DynamicImage::ImageRgba8(buf) => (PixelType::U8x4, buf.as_raw().clone()),
        // 16-bit and float layouts drop to 8 bits with the same channels
        other => match (other.color().channel_count(), other.color().has_alpha()) {
            (1, _) => (PixelType::U8, other.to_luma8().into_raw()),
            (2, _) => (PixelType::U8x2, other.to_luma_alpha8().into_raw()),
            (_, false) => (PixelType::U8x3, other.to_rgb8().into_raw()),
            _ => (PixelType::U8x4, other.to_rgba8().into_raw()),
        },
    };
    let has_alpha = matches!(pixel_type, PixelType::U8x2 | PixelType::U8x4);

    let mut src_image = Image::from_vec_u8(src_width, src_height, raw, pixel_type).map_err(|e| {
        TransformError::resize_failed(format!("Failed to create source image: {:?}", e))
    })?;

    // Premultiplied alpha keeps transparent pixels from bleeding color into edges
    let mul_div = MulDiv::default();
    if has_alpha {
        mul_div
            .multiply_alpha_inplace(&mut src_image.view_mut())
            .map_err(|e| TransformError::resize_failed(format!("{:?}", e)))?;
    }

    let mut dst_image = Image::new(dst_width, dst_height, pixel_type);
    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| TransformError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    if has_alpha {
        mul_div
            .divide_alpha_inplace(&mut dst_image.view_mut())
            .map_err(|e| TransformError::resize_failed(format!("{:?}", e)))?;
    }

    let (w, h) = (target.width, target.height);
    let buf = dst_image.into_vec();
    let resized = match pixel_type {
        PixelType::U8 => GrayImage::from_raw(w, h, buf).map(DynamicImage::ImageLuma8),
        PixelType::U8x2 => GrayAlphaImage::from_raw(w, h, buf).map(DynamicImage::ImageLumaA8),
        PixelType::U8x3 => RgbImage::from_raw(w, h, buf).map(DynamicImage::ImageRgb8),
        _ => RgbaImage::from_raw(w, h, buf).map(DynamicImage::ImageRgba8),
    };

    resized.ok_or_else(|| TransformError::resize_failed("Failed to create output image buffer"))
}
