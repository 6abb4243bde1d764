//! Upload orchestration
//!
//! Per batch:
//! 1. Reject empty batches and batches over `max_files_per_request`
//! 2. Ensure the bucket exists with a public-read policy
//! 3. Take one watermark snapshot, only when the caller asked for it
//!
//! Per file:
//! - size limit, then extension classification (image / video)
//! - images are converted to WebP with the optional watermark; if that
//!   fails the original bytes and extension are kept
//! - object name `{YYYYmmdd_HHMMSS}_{sha256[..16]}{ext}` under the folder
//! - a failing file lands in the report's error list, the batch goes on

pub mod convert;
pub mod file_type;

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::{Config, UploadConfig};
use crate::constants::FILE_HASH_LENGTH;
use crate::error::MediaError;
use crate::metrics::{MediaMetrics, WatermarkOutcome};
use crate::storage::ObjectStore;
use crate::transform::{decode_image, OutputFormat, TransformError};
use crate::urls::UrlBuilder;
use crate::watermark::{DecodedWatermark, WatermarkStore};

pub use convert::{convert_and_maybe_watermark, ConvertedImage};
pub use file_type::{content_type_for, extension_of, FileType};

/// A file as received from the client
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Where and how a batch is stored
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub bucket: String,
    /// Optional key prefix; surrounding slashes are ignored
    pub folder: String,
    pub apply_watermark: bool,
}

impl UploadOptions {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn with_watermark(mut self, apply: bool) -> Self {
        self.apply_watermark = apply;
        self
    }

    fn object_name(&self, filename: &str) -> String {
        let folder = self.folder.trim_matches('/');
        if folder.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", folder, filename)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Ready-made transform URLs for a stored image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformUrls {
    pub thumbnail: String,
    pub preview: String,
    pub large: String,
    pub original_webp: String,
}

/// Metadata of one stored file; persisting it is up to the caller
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub filename: String,
    pub original_filename: String,
    pub bucket: String,
    /// `/{bucket}/{object}`
    pub path: String,
    pub object_name: String,
    pub size: u64,
    pub mime_type: String,
    pub file_type: FileType,
    pub cdn_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform_urls: Option<TransformUrls>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub filename: String,
    pub error: String,
}

/// Outcome of a batch; `success` is true when at least one file was stored
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub success: bool,
    pub uploaded: usize,
    pub failed: usize,
    pub results: Vec<FileRecord>,
    pub errors: Vec<FileError>,
}

/// Watermark state resolved once per batch, or once per single conversion
pub(crate) enum BatchWatermark {
    NotRequested,
    /// Requested, but nothing active with a logo is configured
    Unavailable,
    /// Requested, but the stored logo does not decode
    Broken,
    Ready(Arc<DecodedWatermark>),
}

impl BatchWatermark {
    pub(crate) fn resolve(store: &WatermarkStore, requested: bool) -> Self {
        if !requested {
            return BatchWatermark::NotRequested;
        }
        let Some(active) = store.snapshot() else {
            return BatchWatermark::Unavailable;
        };
        match active.decode() {
            Ok(decoded) => BatchWatermark::Ready(Arc::new(decoded)),
            Err(e) => {
                tracing::warn!(error = %e, "Stored watermark logo cannot be decoded");
                BatchWatermark::Broken
            }
        }
    }

    /// WebP conversion on the blocking pool with this watermark state.
    /// A broken logo reports `Failed` on an otherwise converted image.
    pub(crate) async fn convert(
        &self,
        data: Bytes,
        quality: u8,
    ) -> Result<ConvertedImage, TransformError> {
        let (logo, broken) = match self {
            BatchWatermark::Ready(decoded) => (Some(Arc::clone(decoded)), false),
            BatchWatermark::Broken => (None, true),
            BatchWatermark::NotRequested | BatchWatermark::Unavailable => (None, false),
        };

        let mut converted = tokio::task::spawn_blocking(move || {
            convert_and_maybe_watermark(&data, logo.as_deref(), quality)
        })
        .await
        .map_err(|e| TransformError::encode_failed("webp", format!("conversion task failed: {}", e)))??;

        if broken {
            converted.watermark = WatermarkOutcome::Failed;
        }
        Ok(converted)
    }
}

/// Stores uploaded files through an [`ObjectStore`]
#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn ObjectStore>,
    watermarks: Arc<WatermarkStore>,
    limits: UploadConfig,
    urls: UrlBuilder,
    quality: u8,
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, watermarks: Arc<WatermarkStore>, config: &Config) -> Self {
        Self {
            store,
            watermarks,
            limits: config.upload.clone(),
            urls: UrlBuilder::new(&config.cdn, &config.storage),
            quality: config.transform.upload_quality,
        }
    }

    /// Store a batch of files. Only whole-batch problems are errors; per-file
    /// failures are collected in the report.
    pub async fn upload_batch(
        &self,
        files: Vec<UploadFile>,
        options: &UploadOptions,
    ) -> Result<UploadReport, MediaError> {
        if files.is_empty() {
            return Err(MediaError::UploadRejected("No files provided".to_string()));
        }
        if files.len() > self.limits.max_files_per_request {
            return Err(MediaError::UploadRejected(format!(
                "Maximum {} files per request",
                self.limits.max_files_per_request
            )));
        }

        self.store.ensure_bucket(&options.bucket).await?;

        let watermark = BatchWatermark::resolve(&self.watermarks, options.apply_watermark);

        let mut results = Vec::new();
        let mut errors = Vec::new();

        for file in files {
            match self.store_file(&file, options, &watermark).await {
                Ok(record) => results.push(record),
                Err(error) => {
                    tracing::warn!(filename = %file.filename, error = %error.error, "Upload failed");
                    errors.push(error);
                }
            }
        }

        tracing::info!(
            bucket = %options.bucket,
            uploaded = results.len(),
            failed = errors.len(),
            "Upload batch finished"
        );

        Ok(UploadReport {
            success: !results.is_empty(),
            uploaded: results.len(),
            failed: errors.len(),
            results,
            errors,
        })
    }

    /// Store one file; a failed file becomes an error with its message
    pub async fn upload_single(
        &self,
        file: UploadFile,
        options: &UploadOptions,
    ) -> Result<FileRecord, MediaError> {
        let mut report = self.upload_batch(vec![file], options).await?;
        match report.results.pop() {
            Some(record) => Ok(record),
            None => Err(MediaError::UploadRejected(
                report
                    .errors
                    .into_iter()
                    .next()
                    .map(|e| e.error)
                    .unwrap_or_else(|| "Upload failed".to_string()),
            )),
        }
    }

    async fn store_file(
        &self,
        file: &UploadFile,
        options: &UploadOptions,
        watermark: &BatchWatermark,
    ) -> Result<FileRecord, FileError> {
        let metrics = MediaMetrics::global();
        let reject = |reason: &str, error: String| {
            metrics.record_upload_error(reason);
            FileError {
                filename: file.filename.clone(),
                error,
            }
        };

        if file.data.len() as u64 > self.limits.max_upload_size {
            return Err(reject(
                "too_large",
                format!("File too large. Max: {} bytes", self.limits.max_upload_size),
            ));
        }

        let mut extension = extension_of(&file.filename);
        let Some(file_type) = FileType::classify(&extension, &self.limits) else {
            return Err(reject(
                "type_not_allowed",
                format!("File type not allowed: {}", extension),
            ));
        };

        let mut data = file.data.clone();
        let mut mime_type = content_type_for(&extension).to_string();
        let mut dimensions = None;

        if file_type == FileType::Image {
            match self.convert(file.data.clone(), watermark).await {
                Ok(converted) => {
                    if options.apply_watermark {
                        metrics.record_watermark(converted.watermark);
                    }
                    dimensions = Some(ImageDimensions {
                        width: converted.width,
                        height: converted.height,
                    });
                    data = Bytes::from(converted.data);
                    extension = format!(".{}", OutputFormat::WebP.extension());
                    mime_type = OutputFormat::WebP.content_type().to_string();
                }
                Err(e) => {
                    tracing::warn!(
                        filename = %file.filename,
                        error = %e,
                        "Image processing failed, keeping original"
                    );
                    dimensions = decode_image(&file.data).ok().map(|img| ImageDimensions {
                        width: img.width(),
                        height: img.height(),
                    });
                }
            }
        }

        let filename = format!(
            "{}_{}{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            content_hash(&data),
            extension
        );
        let object_name = options.object_name(&filename);
        let size = data.len() as u64;

        self.store
            .put(&options.bucket, &object_name, data, &mime_type)
            .await
            .map_err(|e| reject("storage", e.to_string()))?;

        metrics.record_upload(file_type.as_str());
        tracing::debug!(
            bucket = %options.bucket,
            object = %object_name,
            bytes = size,
            file_type = file_type.as_str(),
            "File stored"
        );

        let transform_urls = (file_type == FileType::Image).then(|| self.transform_urls(&options.bucket, &object_name));

        Ok(FileRecord {
            filename,
            original_filename: file.filename.clone(),
            bucket: options.bucket.clone(),
            path: format!("/{}/{}", options.bucket, object_name),
            cdn_url: self.urls.build_cdn_url(&options.bucket, &object_name),
            object_name,
            size,
            mime_type,
            file_type,
            dimensions,
            created_at: Utc::now(),
            transform_urls,
        })
    }

    /// Run the CPU-bound conversion off the async workers
    async fn convert(
        &self,
        data: Bytes,
        watermark: &BatchWatermark,
    ) -> Result<ConvertedImage, String> {
        watermark
            .convert(data, self.quality)
            .await
            .map_err(|e| e.to_string())
    }

    fn transform_urls(&self, bucket: &str, object_name: &str) -> TransformUrls {
        let webp = || Some("webp".to_string());
        TransformUrls {
            thumbnail: self.urls.thumbnail_url(bucket, object_name, 400, "center"),
            preview: self.urls.build_transform_url(
                bucket,
                object_name,
                [("w", Some("800".to_string())), ("format", webp())],
            ),
            large: self.urls.build_transform_url(
                bucket,
                object_name,
                [("w", Some("1600".to_string())), ("format", webp())],
            ),
            original_webp: self.urls.build_transform_url(
                bucket,
                object_name,
                [("format", webp()), ("quality", Some("90".to_string()))],
            ),
        }
    }
}

/// First `FILE_HASH_LENGTH` hex chars of the SHA-256 of the stored bytes
pub fn content_hash(data: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(data));
    digest[..FILE_HASH_LENGTH].to_string()
}
