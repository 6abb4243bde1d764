//! Pre-resize crop engine
//!
//! Every mode selects a region of side `min(w, h)` on the short axis.
//! `top`/`bottom` keep the full width, `left`/`right` keep the full height,
//! and `center`/`entropy` take a centered square.

use image::DynamicImage;

use super::params::CropMode;

/// Crop rectangle in source pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the region a crop mode selects from a `width` x `height` source
pub fn crop_region(mode: CropMode, width: u32, height: u32) -> CropRegion {
    let side = width.min(height);

    match mode {
        CropMode::Top => CropRegion {
            x: 0,
            y: 0,
            width,
            height: side,
        },
        CropMode::Bottom => CropRegion {
            x: 0,
            y: height - side,
            width,
            height: side,
        },
        CropMode::Left => CropRegion {
            x: 0,
            y: 0,
            width: side,
            height,
        },
        CropMode::Right => CropRegion {
            x: width - side,
            y: 0,
            width: side,
            height,
        },
        // No saliency detector: entropy degrades to the centered square
        CropMode::Center | CropMode::Entropy => CropRegion {
            x: (width - side) / 2,
            y: (height - side) / 2,
            width: side,
            height: side,
        },
    }
}

/// Apply an optional crop; `None` passes the image through untouched
pub fn apply_crop(img: DynamicImage, mode: Option<CropMode>) -> DynamicImage {
    let Some(mode) = mode else {
        return img;
    };

    let region = crop_region(mode, img.width(), img.height());
    if region.width == img.width() && region.height == img.height() {
        return img;
    }

    img.crop_imm(region.x, region.y, region.width, region.height)
}
