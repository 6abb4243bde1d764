// Constants module - centralized default values for configuration
//
// All defaults used by the config layer and the pipelines live here so the
// YAML defaults, the CLI and the tests agree on a single source of truth.

// =============================================================================
// Storage defaults
// =============================================================================

/// Default bucket for uploads and transforms
pub const DEFAULT_BUCKET: &str = "media";

/// Default S3 region (MinIO ignores it, but the SDK requires one)
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default S3 operation timeout in seconds
pub const DEFAULT_S3_TIMEOUT_SECS: u64 = 20;

// =============================================================================
// Transform defaults
// =============================================================================

/// Largest width accepted by the transform endpoint
pub const DEFAULT_MAX_WIDTH: u32 = 4000;

/// Largest height accepted by the transform endpoint
pub const DEFAULT_MAX_HEIGHT: u32 = 4000;

/// Default quality for lossy formats (JPEG, WebP)
pub const DEFAULT_QUALITY: u8 = 85;

/// Quality used when uploads are converted to WebP
pub const DEFAULT_UPLOAD_QUALITY: u8 = 85;

/// WebP encoder method (0 = fastest, 6 = best compression)
pub const WEBP_MAX_METHOD: i32 = 6;

/// oxipng optimisation preset for PNG output
pub const PNG_OPTIMIZATION_PRESET: u8 = 2;

/// Cache-Control value attached to transformed responses (30 days)
pub const TRANSFORM_CACHE_CONTROL: &str = "public, max-age=2592000";

// =============================================================================
// Upload defaults
// =============================================================================

/// Default maximum upload size per file (5 GB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 5_000_000_000;

/// Default maximum number of files in one batch upload
pub const DEFAULT_MAX_FILES_PER_REQUEST: usize = 50;

/// Number of hex characters of the content hash used in object names
pub const FILE_HASH_LENGTH: usize = 16;

/// Image extensions accepted by the upload pipeline
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

/// Video extensions accepted by the upload pipeline
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] =
    &[".mp4", ".webm", ".avi", ".mov", ".mkv", ".flv", ".m4v"];

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark opacity (0.0 - 1.0)
pub const DEFAULT_WATERMARK_OPACITY: f32 = 0.7;

/// Default watermark width as a percentage of the base image width
pub const DEFAULT_WATERMARK_SCALE_PERCENT: u8 = 20;

/// Default watermark padding from the anchored edges, in pixels
pub const DEFAULT_WATERMARK_PADDING: u32 = 10;

// =============================================================================
// CDN defaults
// =============================================================================

/// Default public CDN domain
pub const DEFAULT_CDN_DOMAIN: &str = "localhost";

/// Default public CDN protocol
pub const DEFAULT_CDN_PROTOCOL: &str = "http";

// =============================================================================
// Retry defaults
// =============================================================================

/// Default maximum retry attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default initial backoff in milliseconds
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;

/// Default maximum backoff in milliseconds
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 1000;
