//! Forced WebP conversion for uploads, with best-effort watermarking.

use crate::metrics::WatermarkOutcome;
use crate::transform::normalize::normalize_for_format;
use crate::transform::{EncoderFactory, EncoderQuality, OutputFormat, SourceImage, TransformError};
use crate::watermark::{apply_watermark, DecodedWatermark};

/// An upload converted to WebP
#[derive(Debug)]
pub struct ConvertedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// `Skipped` when no watermark was supplied
    pub watermark: WatermarkOutcome,
}

/// Convert any decodable image to WebP, compositing `watermark` when given.
///
/// The raster is decoded and encoded once; the watermark is composited in
/// between. A watermark failure is logged and the image is stored without
/// it. Decode and encode failures are returned so the caller can fall back
/// to the original bytes.
pub fn convert_and_maybe_watermark(
    data: &[u8],
    watermark: Option<&DecodedWatermark>,
    quality: u8,
) -> Result<ConvertedImage, TransformError> {
    let source = SourceImage::decode(data)?;
    let format = OutputFormat::WebP;
    let mut image = normalize_for_format(source.image, source.color_mode, format);

    let outcome = match watermark {
        None => WatermarkOutcome::Skipped,
        Some(wm) => match apply_watermark(image.clone(), &wm.logo, &wm.spec) {
            Ok(marked) => {
                image = marked;
                WatermarkOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(error = %e, "Watermark failed, storing image without it");
                WatermarkOutcome::Failed
            }
        },
    };

    let encoded = EncoderFactory::create(format)
        .encode(&image, EncoderQuality::with_quality(quality))?;

    Ok(ConvertedImage {
        data: encoded.data,
        width: encoded.width,
        height: encoded.height,
        watermark: outcome,
    })
}
