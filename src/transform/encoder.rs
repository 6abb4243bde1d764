//! Image encoder abstraction
//!
//! One encoder per output format behind the `ImageEncoder` trait:
//! - JPEG through the image crate, quality applied
//! - PNG through the image crate at best compression, then oxipng
//! - WebP through libwebp (lossy, maximum method), quality applied
//! - GIF through the image crate

use std::borrow::Cow;
use std::io::Cursor;

use image::codecs::gif::GifEncoder as ImageGifEncoder;
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder as ImagePngEncoder};
use image::{ColorType, DynamicImage, ImageEncoder as _};

use super::error::TransformError;
use super::params::OutputFormat;
use crate::constants::{DEFAULT_QUALITY, PNG_OPTIMIZATION_PRESET, WEBP_MAX_METHOD};

/// Quality settings for image encoding
#[derive(Debug, Clone, Copy)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
        }
    }
}

impl EncoderQuality {
    /// Create quality settings, clamped to 1-100
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// The output format
    pub format: OutputFormat,
    /// Content-Type header value
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: OutputFormat, width: u32, height: u32) -> Self {
        Self {
            data,
            format,
            content_type: format.content_type(),
            width,
            height,
        }
    }
}

/// Trait for image encoders
///
/// Object-safe so the factory can hand out boxed encoders.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode a normalized image
    fn encode(
        &self,
        img: &DynamicImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, TransformError>;
}

/// JPEG encoder using the image crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(
        &self,
        img: &DynamicImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, TransformError> {
        let rgb: Cow<'_, image::RgbImage> = match img {
            DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
            other => Cow::Owned(other.to_rgb8()),
        };
        let (width, height) = rgb.dimensions();

        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, quality.quality)
            .write_image(rgb.as_raw(), width, height, ColorType::Rgb8)
            .map_err(|e| TransformError::encode_failed("jpeg", e.to_string()))?;

        Ok(EncodedImage::new(
            output.into_inner(),
            OutputFormat::Jpeg,
            width,
            height,
        ))
    }
}

/// PNG encoder: best zlib compression, then an oxipng pass
pub struct PngEncoder;

impl PngEncoder {
    fn write_png(img: &DynamicImage) -> Result<Vec<u8>, TransformError> {
        let converted;
        let (raw, color): (&[u8], ColorType) = match img {
            DynamicImage::ImageLuma8(buf) => (buf.as_raw(), ColorType::L8),
            DynamicImage::ImageLumaA8(buf) => (buf.as_raw(), ColorType::La8),
            DynamicImage::ImageRgb8(buf) => (buf.as_raw(), ColorType::Rgb8),
            DynamicImage::ImageRgba8(buf) => (buf.as_raw(), ColorType::Rgba8),
            other => {
                converted = other.to_rgba8();
                (converted.as_raw(), ColorType::Rgba8)
            }
        };

        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new_with_quality(&mut output, CompressionType::Best, FilterType::Adaptive)
            .write_image(raw, img.width(), img.height(), color)
            .map_err(|e| TransformError::encode_failed("png", e.to_string()))?;
        Ok(output.into_inner())
    }
}

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(
        &self,
        img: &DynamicImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, TransformError> {
        let png = Self::write_png(img)?;

        let options = oxipng::Options::from_preset(PNG_OPTIMIZATION_PRESET);
        let data = match oxipng::optimize_from_memory(&png, &options) {
            Ok(optimized) if optimized.len() < png.len() => optimized,
            Ok(_) => png,
            Err(e) => {
                tracing::warn!(error = %e, "oxipng pass failed, keeping unoptimized PNG");
                png
            }
        };

        Ok(EncodedImage::new(
            data,
            OutputFormat::Png,
            img.width(),
            img.height(),
        ))
    }
}

/// Lossy WebP encoder using libwebp
pub struct WebPEncoder {
    /// Compression effort (0 = fastest, 6 = smallest)
    pub method: i32,
}

impl Default for WebPEncoder {
    fn default() -> Self {
        Self {
            method: WEBP_MAX_METHOD,
        }
    }
}

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(
        &self,
        img: &DynamicImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, TransformError> {
        let (width, height) = (img.width(), img.height());

        let mut config = webp::WebPConfig::new()
            .map_err(|_| TransformError::encode_failed("webp", "failed to create WebPConfig"))?;
        config.quality = quality.quality as f32;
        config.method = self.method;

        let encoded = if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_advanced(&config)
        } else {
            let rgb: Cow<'_, image::RgbImage> = match img {
                DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
                other => Cow::Owned(other.to_rgb8()),
            };
            webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_advanced(&config)
        };
        let mem = encoded.map_err(|e| TransformError::encode_failed("webp", format!("{:?}", e)))?;

        Ok(EncodedImage::new(
            mem.to_vec(),
            OutputFormat::WebP,
            width,
            height,
        ))
    }
}

/// GIF encoder using the image crate
pub struct GifEncoder;

impl ImageEncoder for GifEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    fn encode(
        &self,
        img: &DynamicImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, TransformError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut output = Vec::new();
        {
            // The encoder writes the trailer when dropped
            let mut encoder = ImageGifEncoder::new(&mut output);
            encoder
                .encode(rgba.as_raw(), width, height, ColorType::Rgba8)
                .map_err(|e| TransformError::encode_failed("gif", e.to_string()))?;
        }

        Ok(EncodedImage::new(output, OutputFormat::Gif, width, height))
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an encoder for the specified output format
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder::default()),
            OutputFormat::Gif => Box::new(GifEncoder),
        }
    }
}
