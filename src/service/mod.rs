//! The two operations callers use
//!
//! - [`MediaService::transform`]: fetch an original from the object store,
//!   derive the requested variant, report size metadata and headers
//! - [`MediaService::convert_and_maybe_watermark`]: the upload-time WebP
//!   conversion with the active watermark
//!
//! Image work runs on tokio's blocking pool. Watermark configuration is read
//! as a snapshot at call time.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::Config;
use crate::constants::TRANSFORM_CACHE_CONTROL;
use crate::error::MediaError;
use crate::metrics::MediaMetrics;
use crate::storage::{ObjectStore, StorageError};
use crate::transform::{cache_key, capabilities, process_image, TransformError, TransformRequest};
use crate::upload::{BatchWatermark, ConvertedImage, UploadPipeline};
use crate::watermark::WatermarkStore;

/// A derived image plus the metadata surfaced to the caller
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    /// Byte size of the stored original
    pub original_size: usize,
    pub cache_key: String,
}

impl TransformOutcome {
    pub fn transformed_size(&self) -> usize {
        self.data.len()
    }

    /// Size saving relative to the original, e.g. `"62.5%"`; negative when
    /// the variant is larger
    pub fn compression_ratio(&self) -> String {
        if self.original_size == 0 {
            return "0.0%".to_string();
        }
        let ratio = (1.0 - self.transformed_size() as f64 / self.original_size as f64) * 100.0;
        format!("{:.1}%", ratio)
    }

    /// Response headers for the variant. Every response is a cache miss: the
    /// pipeline itself caches nothing.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", self.content_type.to_string()),
            ("Cache-Control", TRANSFORM_CACHE_CONTROL.to_string()),
            ("X-Transform-Cache", "MISS".to_string()),
            ("X-Original-Size", self.original_size.to_string()),
            ("X-Transformed-Size", self.transformed_size().to_string()),
            ("X-Compression-Ratio", self.compression_ratio()),
        ]
    }
}

#[derive(Clone)]
pub struct MediaService {
    store: Arc<dyn ObjectStore>,
    watermarks: Arc<WatermarkStore>,
    config: Arc<Config>,
    uploads: UploadPipeline,
}

impl MediaService {
    pub fn new(store: Arc<dyn ObjectStore>, watermarks: Arc<WatermarkStore>, config: Config) -> Self {
        let uploads = UploadPipeline::new(Arc::clone(&store), Arc::clone(&watermarks), &config);
        Self {
            store,
            watermarks,
            config: Arc::new(config),
            uploads,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn watermarks(&self) -> &WatermarkStore {
        &self.watermarks
    }

    pub fn uploads(&self) -> &UploadPipeline {
        &self.uploads
    }

    /// Parameter catalogue for the configured limits
    pub fn capabilities(&self) -> serde_json::Value {
        capabilities(&self.config.transform.limits())
    }

    /// Parse query parameters and run [`Self::transform`]
    ///
    /// A missing `quality` takes the configured default.
    pub async fn transform_query(
        &self,
        bucket: &str,
        path: &str,
        query: &HashMap<String, String>,
    ) -> Result<TransformOutcome, TransformError> {
        let mut request = TransformRequest::from_query(query, &self.config.transform.limits())?;
        if !query.contains_key("quality") {
            request.quality = self.config.transform.default_quality;
        }
        self.transform(bucket, path, &request).await
    }

    /// Derive a variant of `bucket/path`
    ///
    /// The request is validated against the configured limits before the
    /// object store is touched.
    pub async fn transform(
        &self,
        bucket: &str,
        path: &str,
        request: &TransformRequest,
    ) -> Result<TransformOutcome, TransformError> {
        request.validate_with(&self.config.transform.limits())?;

        let original = self.store.get(bucket, path).await.map_err(|e| match e {
            StorageError::NotFound { .. } => TransformError::source_not_found(bucket, path),
            other => TransformError::Storage {
                message: other.to_string(),
            },
        })?;

        let metrics = MediaMetrics::global();
        let format_label = request.format.map(|f| f.as_str()).unwrap_or("source");
        let _timer = metrics.start_transform_timer(format_label);

        let original_size = original.len();
        let owned_request = request.clone();
        let result = tokio::task::spawn_blocking(move || process_image(&original, &owned_request))
            .await
            .map_err(|e| TransformError::encode_failed(format_label, format!("transform task failed: {}", e)))
            .and_then(|r| r);

        let processed = match result {
            Ok(processed) => {
                metrics.record_transform(processed.format.as_str(), true);
                processed
            }
            Err(e) => {
                metrics.record_transform(format_label, false);
                tracing::error!(bucket = %bucket, path = %path, error = %e, "Transform failed");
                return Err(e);
            }
        };

        tracing::info!(
            bucket = %bucket,
            path = %path,
            format = processed.format.as_str(),
            width = processed.output_size.width,
            height = processed.output_size.height,
            original_bytes = original_size,
            bytes = processed.data.len(),
            "Image transformed"
        );

        Ok(TransformOutcome {
            data: Bytes::from(processed.data),
            content_type: processed.content_type,
            width: processed.output_size.width,
            height: processed.output_size.height,
            original_size,
            cache_key: cache_key(bucket, path, request),
        })
    }

    /// Convert upload bytes to WebP at the upload quality, watermarking them
    /// when asked and a watermark is active with a logo.
    pub async fn convert_and_maybe_watermark(
        &self,
        data: Bytes,
        apply_watermark: bool,
    ) -> Result<ConvertedImage, MediaError> {
        let watermark = BatchWatermark::resolve(&self.watermarks, apply_watermark);
        let converted = watermark
            .convert(data, self.config.transform.upload_quality)
            .await?;

        if apply_watermark {
            MediaMetrics::global().record_watermark(converted.watermark);
        }
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;
    use crate::transform::{CropMode, FitMode, OutputFormat};
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Jpeg(90)).unwrap();
        buf.into_inner()
    }

    fn service(store: &MemoryObjectStore) -> MediaService {
        MediaService::new(
            Arc::new(store.clone()),
            Arc::new(WatermarkStore::new()),
            Config::default(),
        )
    }

    #[test]
    fn test_compression_ratio_format() {
        let outcome = TransformOutcome {
            data: Bytes::from(vec![0u8; 250]),
            content_type: "image/webp",
            width: 1,
            height: 1,
            original_size: 1000,
            cache_key: String::new(),
        };
        assert_eq!(outcome.compression_ratio(), "75.0%");

        let grown = TransformOutcome {
            original_size: 200,
            ..outcome.clone()
        };
        assert_eq!(grown.compression_ratio(), "-25.0%");

        let headers = outcome.headers();
        assert!(headers.contains(&("Cache-Control", "public, max-age=2592000".to_string())));
        assert!(headers.contains(&("X-Transform-Cache", "MISS".to_string())));
        assert!(headers.contains(&("X-Transformed-Size", "250".to_string())));
    }

    #[tokio::test]
    async fn test_transform_cover_scenario() {
        let store = MemoryObjectStore::new();
        store.insert("media", "photo.jpg", jpeg(800, 600), "image/jpeg");

        let request = TransformRequest::new()
            .with_width(400)
            .with_height(300)
            .with_fit(FitMode::Cover)
            .with_crop(CropMode::Center)
            .with_format(OutputFormat::WebP)
            .with_quality(90);

        let outcome = service(&store).transform("media", "photo.jpg", &request).await.unwrap();
        assert_eq!((outcome.width, outcome.height), (400, 300));
        assert_eq!(outcome.content_type, "image/webp");
        assert_eq!(outcome.cache_key.len(), 64);
        assert_eq!(outcome.cache_key, cache_key("media", "photo.jpg", &request));
    }

    #[tokio::test]
    async fn test_transform_query_keeps_source_format() {
        let store = MemoryObjectStore::new();
        store.insert("media", "wide.jpg", jpeg(1000, 500), "image/jpeg");

        let query = HashMap::from([("w".to_string(), "400".to_string())]);
        let outcome = service(&store)
            .transform_query("media", "wide.jpg", &query)
            .await
            .unwrap();
        assert_eq!((outcome.width, outcome.height), (400, 200));
        assert_eq!(outcome.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_source_is_not_found() {
        let store = MemoryObjectStore::new();
        let request = TransformRequest::new().with_width(10);
        let err = service(&store)
            .transform("media", "missing.jpg", &request)
            .await
            .unwrap_err();
        assert_eq!(err.to_http_status(), 404);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_fetch() {
        // The object does not exist; a 400 proves the store was never asked
        let store = MemoryObjectStore::new();
        let err = service(&store)
            .transform("media", "missing.jpg", &TransformRequest::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_http_status(), 400);
    }

    #[tokio::test]
    async fn test_oversized_request_rejected_before_fetch() {
        let store = MemoryObjectStore::new();
        store.insert("media", "photo.jpg", jpeg(50, 40), "image/jpeg");
        let service = service(&store);

        let stretched = TransformRequest::new()
            .with_width(5000)
            .with_height(10)
            .with_fit(FitMode::Fill);
        let err = service.transform("media", "photo.jpg", &stretched).await.unwrap_err();
        assert!(matches!(err, TransformError::InvalidParameter { .. }));
        assert_eq!(err.to_http_status(), 400);

        let wide = TransformRequest::new().with_width(5000);
        let err = service.transform("media", "photo.jpg", &wide).await.unwrap_err();
        assert_eq!(err.to_http_status(), 400);

        // Missing object and oversized height: the size check wins
        let tall = TransformRequest::new().with_height(4001);
        let err = service.transform("media", "missing.jpg", &tall).await.unwrap_err();
        assert_eq!(err.to_http_status(), 400);
    }

    #[tokio::test]
    async fn test_undecodable_source_is_server_error() {
        let store = MemoryObjectStore::new();
        store.insert("media", "notes.jpg", b"plain text".to_vec(), "image/jpeg");
        let request = TransformRequest::new().with_format(OutputFormat::Png);
        let err = service(&store)
            .transform("media", "notes.jpg", &request)
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::DecodeFailed { .. }));
        assert_eq!(err.to_http_status(), 500);
    }

    #[tokio::test]
    async fn test_convert_without_active_watermark() {
        let store = MemoryObjectStore::new();
        let converted = service(&store)
            .convert_and_maybe_watermark(Bytes::from(jpeg(64, 32)), true)
            .await
            .unwrap();
        assert_eq!((converted.width, converted.height), (64, 32));
        assert_eq!(
            converted.watermark,
            crate::metrics::WatermarkOutcome::Skipped
        );
    }
}
