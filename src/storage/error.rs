//! Error types for object store operations

use thiserror::Error;

use crate::retry::RetryPolicy;

#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("{operation} failed (status {status:?}): {message}")]
    Backend {
        operation: &'static str,
        /// HTTP status of the backend response, `None` for transport failures
        status: Option<u16>,
        message: String,
    },

    #[error("Storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn backend(operation: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        StorageError::Backend {
            operation,
            status,
            message: message.into(),
        }
    }

    /// 5xx responses and transport failures are worth another attempt
    pub fn is_retriable(&self) -> bool {
        match self {
            StorageError::Backend { status: None, .. } => true,
            StorageError::Backend {
                status: Some(status),
                ..
            } => RetryPolicy::is_retriable_status(*status),
            StorageError::NotFound { .. } | StorageError::Config(_) => false,
        }
    }
}
