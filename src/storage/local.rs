//! Local filesystem blob storage

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;

use super::naming::is_safe_storage_name;
use super::{BlobStore, StorageError};

/// Stores each upload as a flat file under a root directory
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open the store, creating the root directory if needed.
    pub async fn create(root: PathBuf) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn object_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        if !is_safe_storage_name(name) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

fn not_found_or_io(name: &str, err: std::io::Error) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::ObjectNotFound(name.to_string())
    } else {
        StorageError::Io(err)
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let path = self.object_path(name)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(name.to_string()),
                _ => StorageError::Io(e),
            })?;
        file.write_all(data).await?;
        file.flush().await?;

        tracing::debug!(storage_name = %name, size = data.len(), "Stored upload on disk");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.object_path(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let path = self.object_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
