//! Public URL builders for stored objects and their transform variants
//!
//! ```text
//! cdn:       {protocol}://{domain}/{bucket}/{path}
//! transform: {protocol}://{domain}/api/transform/{bucket}/{path}?w=800&format=webp
//! ```

use crate::config::{CdnConfig, StorageConfig};

/// Path prefix of the on-demand transform endpoint
pub const TRANSFORM_PATH_PREFIX: &str = "/api/transform";

/// Builds CDN, transform and origin URLs from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base: String,
    origin: String,
}

impl UrlBuilder {
    pub fn new(cdn: &CdnConfig, storage: &StorageConfig) -> Self {
        let origin = match storage.endpoint.as_deref() {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://s3.{}.amazonaws.com", storage.region),
        };
        Self {
            base: format!("{}://{}", cdn.protocol, cdn.domain.trim_end_matches('/')),
            origin,
        }
    }

    /// Direct URL of a stored object
    pub fn build_cdn_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base, bucket, encode_path(path))
    }

    /// Transform URL; `None` parameters are left out, the rest keep their order
    pub fn build_transform_url<'a, I>(&self, bucket: &str, path: &str, params: I) -> String
    where
        I: IntoIterator<Item = (&'a str, Option<String>)>,
    {
        let base = format!(
            "{}{}/{}/{}",
            self.base,
            TRANSFORM_PATH_PREFIX,
            bucket,
            encode_path(path)
        );

        let query: Vec<String> = params
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, urlencoding::encode(&v))))
            .collect();

        if query.is_empty() {
            base
        } else {
            format!("{}?{}", base, query.join("&"))
        }
    }

    /// Internal object store URL, bypassing the CDN
    pub fn build_origin_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.origin, bucket, encode_path(path))
    }

    /// `srcset` attribute value with one transform URL per width
    pub fn responsive_srcset(&self, bucket: &str, path: &str, widths: &[u32], format: &str) -> String {
        widths
            .iter()
            .map(|width| {
                let url = self.build_transform_url(
                    bucket,
                    path,
                    [("w", Some(width.to_string())), ("format", Some(format.to_string()))],
                );
                format!("{} {}w", url, width)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Square WebP thumbnail, cover fit
    pub fn thumbnail_url(&self, bucket: &str, path: &str, size: u32, crop: &str) -> String {
        self.build_transform_url(
            bucket,
            path,
            [
                ("w", Some(size.to_string())),
                ("h", Some(size.to_string())),
                ("fit", Some("cover".to_string())),
                ("crop", Some(crop.to_string())),
                ("format", Some("webp".to_string())),
            ],
        )
    }

    /// Hero or banner image, cover fit at quality 85
    pub fn hero_url(&self, bucket: &str, path: &str, width: u32, height: u32) -> String {
        self.build_transform_url(
            bucket,
            path,
            [
                ("w", Some(width.to_string())),
                ("h", Some(height.to_string())),
                ("fit", Some("cover".to_string())),
                ("format", Some("webp".to_string())),
                ("quality", Some("85".to_string())),
            ],
        )
    }
}

fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
