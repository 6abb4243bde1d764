// Configuration module
//
// YAML file with ${VAR} environment substitution. Every section and field is
// optional; missing values fall back to `crate::constants`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::*;
use crate::transform::TransformLimits;
use crate::watermark::WatermarkSettings;

pub mod retry;

pub use retry::RetryConfigYaml;

/// Upper bound accepted for the configured transform limits
const MAX_CONFIGURABLE_DIMENSION: u32 = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub cdn: CdnConfig,
    #[serde(default)]
    pub watermark: WatermarkSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_S3_TIMEOUT_SECS
}

/// Object storage connection (S3 or MinIO)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint, e.g. `http://minio:9000`. AWS when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default = "default_bucket")]
    pub default_bucket: String,
    /// MinIO needs path-style addressing
    #[serde(default = "default_true")]
    pub force_path_style: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub retry: RetryConfigYaml,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            access_key: None,
            secret_key: None,
            default_bucket: default_bucket(),
            force_path_style: true,
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfigYaml::default(),
        }
    }
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_upload_quality() -> u8 {
    DEFAULT_UPLOAD_QUALITY
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    /// Quality used when a transform request does not name one
    #[serde(default = "default_quality")]
    pub default_quality: u8,
    /// Quality of the forced WebP conversion on upload
    #[serde(default = "default_upload_quality")]
    pub upload_quality: u8,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            default_quality: default_quality(),
            upload_quality: default_upload_quality(),
        }
    }
}

impl TransformConfig {
    pub fn limits(&self) -> TransformLimits {
        TransformLimits {
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

fn default_max_upload_size() -> u64 {
    DEFAULT_MAX_UPLOAD_SIZE
}

fn default_max_files_per_request() -> usize {
    DEFAULT_MAX_FILES_PER_REQUEST
}

fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_video_extensions() -> Vec<String> {
    DEFAULT_VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Per-file limit in bytes
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    #[serde(default = "default_max_files_per_request")]
    pub max_files_per_request: usize,
    /// Lowercase extensions with a leading dot
    #[serde(default = "default_image_extensions")]
    pub allowed_image_extensions: Vec<String>,
    #[serde(default = "default_video_extensions")]
    pub allowed_video_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: default_max_upload_size(),
            max_files_per_request: default_max_files_per_request(),
            allowed_image_extensions: default_image_extensions(),
            allowed_video_extensions: default_video_extensions(),
        }
    }
}

fn default_cdn_domain() -> String {
    DEFAULT_CDN_DOMAIN.to_string()
}

fn default_cdn_protocol() -> String {
    DEFAULT_CDN_PROTOCOL.to_string()
}

/// Public address the stored objects are served from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdnConfig {
    #[serde(default = "default_cdn_domain")]
    pub domain: String,
    #[serde(default = "default_cdn_protocol")]
    pub protocol: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            domain: default_cdn_domain(),
            protocol: default_cdn_protocol(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            })
        });

        if let Some(var_name) = missing {
            return Err(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            ));
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.storage.default_bucket.trim().is_empty() {
            return Err("storage.default_bucket cannot be empty".to_string());
        }
        if self.storage.timeout_seconds == 0 {
            return Err("storage.timeout_seconds must be greater than 0".to_string());
        }
        if self.storage.access_key.is_some() != self.storage.secret_key.is_some() {
            return Err("storage.access_key and storage.secret_key must be set together".to_string());
        }
        self.storage.retry.validate()?;

        for (name, value) in [
            ("transform.max_width", self.transform.max_width),
            ("transform.max_height", self.transform.max_height),
        ] {
            if value == 0 || value > MAX_CONFIGURABLE_DIMENSION {
                return Err(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_CONFIGURABLE_DIMENSION, value
                ));
            }
        }
        for (name, value) in [
            ("transform.default_quality", self.transform.default_quality),
            ("transform.upload_quality", self.transform.upload_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(format!("{} must be between 1 and 100, got {}", name, value));
            }
        }

        if self.upload.max_files_per_request == 0 {
            return Err("upload.max_files_per_request must be at least 1".to_string());
        }
        for ext in self
            .upload
            .allowed_image_extensions
            .iter()
            .chain(&self.upload.allowed_video_extensions)
        {
            if !ext.starts_with('.') {
                return Err(format!(
                    "upload extension '{}' must start with a dot",
                    ext
                ));
            }
        }

        if self.cdn.domain.trim().is_empty() {
            return Err("cdn.domain cannot be empty".to_string());
        }
        if !matches!(self.cdn.protocol.as_str(), "http" | "https") {
            return Err(format!(
                "cdn.protocol must be 'http' or 'https', got '{}'",
                self.cdn.protocol
            ));
        }

        self.watermark
            .spec
            .validate()
            .map_err(|e| format!("watermark: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::WatermarkPosition;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = Config::from_yaml_with_env("{}").unwrap();
        assert_eq!(config.storage.default_bucket, "media");
        assert_eq!(config.storage.region, "us-east-1");
        assert!(config.storage.force_path_style);
        assert_eq!(config.transform.max_width, 4000);
        assert_eq!(config.transform.upload_quality, 85);
        assert_eq!(config.upload.max_files_per_request, 50);
        assert!(config
            .upload
            .allowed_video_extensions
            .contains(&".mkv".to_string()));
        assert_eq!(config.cdn.protocol, "http");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.watermark.spec.position, WatermarkPosition::BottomRight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
storage:
  endpoint: http://minio:9000
  access_key: admin
  secret_key: secret
  default_bucket: assets
  retry:
    max_attempts: 5
transform:
  max_width: 2000
cdn:
  domain: cdn.example.com
  protocol: https
watermark:
  logo_path: /etc/mediacdn/logo.png
  position: top-left
  opacity: 0.5
logging:
  level: debug
  format: pretty
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.storage.endpoint.as_deref(), Some("http://minio:9000"));
        assert_eq!(config.storage.default_bucket, "assets");
        assert_eq!(config.storage.retry.max_attempts, 5);
        assert_eq!(config.transform.limits().max_width, 2000);
        assert_eq!(config.transform.limits().max_height, 4000);
        assert_eq!(config.cdn.domain, "cdn.example.com");
        assert_eq!(config.watermark.spec.position, WatermarkPosition::TopLeft);
        assert_eq!(config.watermark.spec.opacity, 0.5);
        assert_eq!(config.watermark.spec.scale_percent, 20);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("MEDIACDN_TEST_SECRET", "s3cr3t");
        let yaml = "storage:\n  access_key: admin\n  secret_key: ${MEDIACDN_TEST_SECRET}\n";
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.storage.secret_key.as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let yaml = "storage:\n  secret_key: ${MEDIACDN_TEST_DEFINITELY_UNSET}\n";
        let err = Config::from_yaml_with_env(yaml).unwrap_err();
        assert!(err.contains("MEDIACDN_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "cdn:\n  domain: media.example.org\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.cdn.domain, "media.example.org");

        let missing = Config::from_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(missing.contains("Failed to read config file"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.storage.default_bucket = " ".to_string();
        assert!(config.validate().unwrap_err().contains("default_bucket"));

        let mut config = Config::default();
        config.transform.max_width = 20_000;
        assert!(config.validate().unwrap_err().contains("max_width"));

        let mut config = Config::default();
        config.transform.upload_quality = 0;
        assert!(config.validate().unwrap_err().contains("upload_quality"));

        let mut config = Config::default();
        config.cdn.protocol = "ftp".to_string();
        assert!(config.validate().unwrap_err().contains("cdn.protocol"));

        let mut config = Config::default();
        config.watermark.spec.opacity = 1.5;
        assert!(config.validate().unwrap_err().starts_with("watermark"));

        let mut config = Config::default();
        config.storage.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.access_key = Some("only-half".to_string());
        assert!(config.validate().unwrap_err().contains("together"));

        let mut config = Config::default();
        config.upload.allowed_image_extensions.push("png".to_string());
        assert!(config.validate().unwrap_err().contains("dot"));
    }
}
