//! In-memory object store (HashMap storage)

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::error::StorageError;
use super::{public_read_policy, ObjectStore};

/// An object as stored, with its content type
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Object store that keeps everything in memory
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), StoredObject>>>,
    buckets: Arc<RwLock<HashSet<String>>>,
    policies: Arc<RwLock<HashMap<String, String>>>,
    /// Simulate backend failures on put if true
    fail_puts: Arc<RwLock<bool>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly, creating its bucket
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>, content_type: &str) {
        self.buckets.write().insert(bucket.to_string());
        self.objects.write().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: data.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.read().contains(bucket)
    }

    pub fn bucket_policy(&self, bucket: &str) -> Option<String> {
        self.policies.read().get(bucket).cloned()
    }

    /// Enable put failure simulation for testing
    pub fn set_fail_puts(&self, enabled: bool) {
        *self.fail_puts.write() = enabled;
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.object(bucket, key)
            .map(|object| object.data)
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if *self.fail_puts.read() {
            return Err(StorageError::backend(
                "PutObject",
                Some(500),
                "Simulated backend failure",
            ));
        }
        if !self.has_bucket(bucket) {
            return Err(StorageError::backend(
                "PutObject",
                Some(404),
                format!("NoSuchBucket: {}", bucket),
            ));
        }

        self.insert(bucket, key, data, content_type);
        Ok(())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.buckets.write().insert(bucket.to_string());
        self.policies
            .write()
            .insert(bucket.to_string(), public_read_policy(bucket));
        Ok(())
    }
}
