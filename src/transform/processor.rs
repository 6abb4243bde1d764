//! Image processing implementation
//!
//! decode → crop → resolve geometry → resize → normalize → encode
//!
//! Everything here is synchronous and CPU-bound; async callers should run it
//! on a blocking thread.

use std::io::Cursor;

use image::io::Reader as ImageReader;
use image::DynamicImage;

use super::crop::apply_crop;
use super::encoder::{EncoderFactory, EncoderQuality};
use super::error::TransformError;
use super::format::{detect_color_mode, detect_source_format, resolve_output_format, ColorMode};
use super::geometry::{resolve_target, Dimensions};
use super::normalize::normalize_for_format;
use super::params::{OutputFormat, TransformRequest};
use super::resize::apply_fit;

/// A decoded source along with what the raw bytes told us about it
pub struct SourceImage {
    pub image: DynamicImage,
    /// Container format, if it is one we can also emit
    pub format: Option<OutputFormat>,
    pub color_mode: ColorMode,
}

impl SourceImage {
    pub fn decode(data: &[u8]) -> Result<Self, TransformError> {
        let image = decode_image(data)?;
        let color_mode = detect_color_mode(data, &image);
        Ok(Self {
            image,
            format: detect_source_format(data),
            color_mode,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }
}

/// Result of image processing
#[derive(Debug)]
pub struct ProcessedImage {
    /// The processed image data
    pub data: Vec<u8>,
    pub format: OutputFormat,
    /// Content-Type header value
    pub content_type: &'static str,
    pub original_size: Dimensions,
    pub output_size: Dimensions,
}

/// Run the full transform pipeline over encoded source bytes
pub fn process_image(
    data: &[u8],
    request: &TransformRequest,
) -> Result<ProcessedImage, TransformError> {
    let source = SourceImage::decode(data)?;
    let original_size = source.dimensions();

    let cropped = apply_crop(source.image, request.crop);
    let cropped_size = Dimensions::new(cropped.width(), cropped.height());

    let resized = match resolve_target(cropped_size, request.width, request.height) {
        Some(target) => apply_fit(cropped, target, request.fit)?,
        None => cropped,
    };

    let format = resolve_output_format(request.format, source.format);
    let normalized = normalize_for_format(resized, source.color_mode, format);

    let encoder = EncoderFactory::create(format);
    let encoded = encoder.encode(&normalized, EncoderQuality::with_quality(request.quality))?;

    tracing::debug!(
        original_width = original_size.width,
        original_height = original_size.height,
        output_width = encoded.width,
        output_height = encoded.height,
        format = format.as_str(),
        bytes = encoded.data.len(),
        "Image processed"
    );

    Ok(ProcessedImage {
        output_size: Dimensions::new(encoded.width, encoded.height),
        data: encoded.data,
        format,
        content_type: encoded.content_type,
        original_size,
    })
}

/// Decode image data into a DynamicImage
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, TransformError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| TransformError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| TransformError::decode_failed(e.to_string()))
}
