//! S3 / MinIO object store backed by aws-sdk-s3

use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;

use super::error::StorageError;
use super::{public_read_policy, ObjectStore};
use crate::config::StorageConfig;
use crate::metrics::MediaMetrics;
use crate::retry::RetryPolicy;

/// Object store talking to an S3-compatible endpoint
#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    retry: RetryPolicy,
}

impl S3ObjectStore {
    pub fn new(client: S3Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Build a client from the storage section of the config
    ///
    /// Static credentials are used when both keys are set; otherwise the
    /// default AWS provider chain applies.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let timeout = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.timeout_seconds))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(timeout);

        if let Some(endpoint) = config.endpoint.as_deref() {
            loader = loader.endpoint_url(endpoint);
        }

        match (config.access_key.as_deref(), config.secret_key.as_deref()) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key, secret_key, None, None, "static",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(StorageError::Config(
                    "access_key and secret_key must be set together".to_string(),
                ))
            }
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::info!(
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            region = %config.region,
            force_path_style = config.force_path_style,
            "S3 client configured"
        );

        Ok(Self::new(
            S3Client::from_conf(s3_config),
            config.retry.to_retry_policy(),
        ))
    }

    async fn get_once(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let is_missing = e.as_service_error().map(|se| se.is_no_such_key()) == Some(true)
                    || status_of(&e) == Some(404);
                if is_missing {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    backend_error("GetObject", &e)
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::backend("GetObject", None, format!("Failed to read body: {e}")))?;

        Ok(body.into_bytes())
    }

    async fn put_once(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_length(data.len() as i64)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| backend_error("PutObject", &e))?;
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) if status_of(&e) == Some(404) => Ok(false),
            Err(e) if e.as_service_error().map(|se| se.is_not_found()) == Some(true) => Ok(false),
            Err(e) => Err(backend_error("HeadBucket", &e)),
        }
    }
}

fn status_of<E>(err: &SdkError<E>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

fn backend_error<E>(operation: &'static str, err: &SdkError<E>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = match err.as_service_error() {
        Some(service_err) => format!(
            "{}: {}",
            service_err.code().unwrap_or("Unknown"),
            service_err.message().unwrap_or("no message")
        ),
        None => DisplayErrorContext(err).to_string(),
    };
    StorageError::backend(operation, status_of(err), message)
}

fn record(operation: &str, result: &Result<impl Sized, StorageError>) {
    MediaMetrics::global().record_storage_operation(operation, result.is_ok());
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let result = self
            .retry
            .run("GetObject", StorageError::is_retriable, || self.get_once(bucket, key))
            .await;
        record("get", &result);
        result
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let result = self
            .retry
            .run("PutObject", StorageError::is_retriable, || {
                self.put_once(bucket, key, data.clone(), content_type)
            })
            .await;
        record("put", &result);

        if result.is_ok() {
            tracing::debug!(bucket = %bucket, key = %key, content_type = %content_type, "Object stored");
        }
        result
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        if !self.bucket_exists(bucket).await? {
            self.client
                .create_bucket()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| backend_error("CreateBucket", &e))?;
            tracing::info!(bucket = %bucket, "Bucket created");
        }

        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(public_read_policy(bucket))
            .send()
            .await
            .map_err(|e| backend_error("PutBucketPolicy", &e))?;

        tracing::debug!(bucket = %bucket, "Bucket policy set to public read");
        Ok(())
    }
}
