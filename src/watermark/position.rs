//! Position calculation for watermark placement.
//!
//! ```ignore
//! use mediacdn::watermark::position::{calculate_position, LayerSize};
//! use mediacdn::watermark::WatermarkPosition;
//!
//! let base = LayerSize { width: 800, height: 600 };
//! let logo = LayerSize { width: 100, height: 50 };
//!
//! let pos = calculate_position(WatermarkPosition::BottomRight, base, logo, 10);
//! assert_eq!((pos.x, pos.y), (690, 540)); // 800 - 100 - 10, 600 - 50 - 10
//! ```

use super::config::WatermarkPosition;

/// Width and height of a compositing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSize {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of the placed watermark.
///
/// Coordinates may be negative when the watermark plus padding does not fit;
/// the compositor clips to the base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i64,
    pub y: i64,
}

impl PlacementPosition {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Calculate where the watermark's top-left corner lands on the base.
pub fn calculate_position(
    position: WatermarkPosition,
    base: LayerSize,
    watermark: LayerSize,
    padding: u32,
) -> PlacementPosition {
    let base_w = base.width as i64;
    let base_h = base.height as i64;
    let wm_w = watermark.width as i64;
    let wm_h = watermark.height as i64;
    let p = padding as i64;

    match position {
        WatermarkPosition::TopLeft => PlacementPosition::new(p, p),
        WatermarkPosition::TopRight => PlacementPosition::new(base_w - wm_w - p, p),
        WatermarkPosition::BottomLeft => PlacementPosition::new(p, base_h - wm_h - p),
        WatermarkPosition::BottomRight => {
            PlacementPosition::new(base_w - wm_w - p, base_h - wm_h - p)
        }
        WatermarkPosition::Center => PlacementPosition::new(
            (base_w - wm_w).div_euclid(2),
            (base_h - wm_h).div_euclid(2),
        ),
    }
}

/// Check whether any part of the placed watermark overlaps the base.
pub fn is_visible(pos: PlacementPosition, base: LayerSize, watermark: LayerSize) -> bool {
    pos.x < base.width as i64
        && pos.y < base.height as i64
        && pos.x + watermark.width as i64 > 0
        && pos.y + watermark.height as i64 > 0
}
