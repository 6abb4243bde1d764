// Shared helpers: synthetic images and an in-memory service

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use mediacdn::config::Config;
use mediacdn::service::MediaService;
use mediacdn::storage::MemoryObjectStore;
use mediacdn::watermark::WatermarkStore;

pub fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Gradient JPEG, so resampling has something to chew on
pub fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    encode(&DynamicImage::ImageRgb8(img), ImageOutputFormat::Jpeg(90))
}

pub fn solid_png_rgba(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    encode(&DynamicImage::ImageRgba8(img), ImageOutputFormat::Png)
}

/// Opaque logo PNG
pub fn logo_png(width: u32, height: u32) -> Bytes {
    Bytes::from(solid_png_rgba(width, height, [255, 0, 0, 255]))
}

pub struct Harness {
    pub store: MemoryObjectStore,
    pub watermarks: Arc<WatermarkStore>,
    pub service: MediaService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let store = MemoryObjectStore::new();
        let watermarks = Arc::new(WatermarkStore::new());
        let service = MediaService::new(Arc::new(store.clone()), Arc::clone(&watermarks), config);
        Self {
            store,
            watermarks,
            service,
        }
    }
}

/// Width and height of encoded WebP bytes
pub fn webp_dimensions(data: &[u8]) -> (u32, u32) {
    let decoded = webp::Decoder::new(data).decode().expect("valid webp");
    (decoded.width(), decoded.height())
}
