//! Object storage collaborator
//!
//! The pipeline only needs three calls: fetch an object, store an object,
//! and make sure a bucket exists with a public-read policy. Two backends:
//! - [`S3ObjectStore`]: aws-sdk-s3 against S3 or MinIO
//! - [`MemoryObjectStore`]: in-process map for tests and dry runs
//!
//! Implementations must be safe to share between concurrent requests.

pub mod error;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;

pub use error::StorageError;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Abstraction over the object store backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a whole object
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    /// Store a whole object, replacing any existing one
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Create the bucket if missing and apply the public-read policy
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError>;
}

/// Bucket policy granting anonymous `s3:GetObject` on every key
pub fn public_read_policy(bucket: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {"AWS": "*"},
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{}/*", bucket)]
        }]
    })
    .to_string()
}
