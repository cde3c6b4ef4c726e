//! Blob storage for uploaded documents
//!
//! Raw upload bytes live in a key/value store addressed by storage name.
//! Two backends are provided: the local filesystem (default) and any
//! S3-compatible object store.

mod local;
pub mod naming;
mod s3_client;

pub use local::LocalBlobStore;
pub use naming::{
    content_type_for, is_allowed, is_safe_storage_name, make_storage_name, DocumentKind,
    ALLOWED_EXTENSIONS,
};
pub use s3_client::S3BlobStore;

use std::sync::Arc;

use crate::config::StorageConfig;

/// Storage-specific errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 SDK error: {0}")]
    SdkError(String),
}

/// Durable byte store keyed by storage name
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under a new `name`. An existing object is left untouched
    /// and reported as `AlreadyExists`.
    async fn put(&self, name: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Read the full contents stored under `name`.
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove the object. Missing objects are reported as `ObjectNotFound`.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;
}

/// Build the configured blob store backend.
pub async fn open_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config {
        StorageConfig::Local { root } => {
            let store = LocalBlobStore::create(root.clone()).await?;
            tracing::info!("Using local blob storage at {}", root.display());
            Ok(Arc::new(store))
        }
        StorageConfig::S3 {
            endpoint,
            bucket,
            access_key,
            secret_key,
            region,
            prefix,
        } => {
            let store = S3BlobStore::new(
                endpoint,
                bucket,
                access_key,
                secret_key,
                region.as_deref(),
                prefix.clone(),
            )
            .await;
            tracing::info!("Using S3 blob storage at {} (bucket {})", endpoint, bucket);
            Ok(Arc::new(store))
        }
    }
}
