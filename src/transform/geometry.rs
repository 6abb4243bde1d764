//! Target dimension resolution
//!
//! Runs on the dimensions the resize engine will see, i.e. after any crop.

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether both sides fit within `bounds`
    pub fn fits_within(&self, bounds: Dimensions) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Resolve the requested box against the source size
///
/// - both given: the box is taken literally
/// - one given: the other side follows the source aspect ratio
/// - neither given: `None`, the image passes through without resize
///
/// A computed side never drops below one pixel.
pub fn resolve_target(
    source: Dimensions,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<Dimensions> {
    let src_w = source.width.max(1) as f64;
    let src_h = source.height.max(1) as f64;

    match (width, height) {
        (Some(w), Some(h)) => Some(Dimensions::new(w, h)),
        (Some(w), None) => {
            let h = (src_h * w as f64 / src_w).round() as u32;
            Some(Dimensions::new(w, h.max(1)))
        }
        (None, Some(h)) => {
            let w = (src_w * h as f64 / src_h).round() as u32;
            Some(Dimensions::new(w.max(1), h))
        }
        (None, None) => None,
    }
}
