//! S3-compatible blob storage
//!
//! Wraps the AWS SDK for S3-compatible storage access (MinIO, R2, B2, S3).

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

use super::naming::is_safe_storage_name;
use super::{BlobStore, StorageError};

/// Status returned when an `If-None-Match: *` write hits an existing key
const PRECONDITION_FAILED: u16 = 412;

/// S3-backed blob store
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3BlobStore {
    /// Create a new S3 blob store
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: Option<&str>,
        prefix: Option<String>,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "lecturelens");

        let region = region.unwrap_or("us-east-1").to_string();

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        match client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                tracing::info!("Connected to S3 bucket: {}", bucket);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not verify bucket {}: {}. Will attempt operations anyway.",
                    bucket,
                    e
                );
            }
        }

        Self {
            client,
            bucket: bucket.to_string(),
            prefix: prefix.map(|p| p.trim_end_matches('/').to_string()),
        }
    }

    fn key_for(&self, name: &str) -> Result<String, StorageError> {
        object_key(self.prefix.as_deref(), name)
    }
}

/// Object key for a storage name under an optional prefix
fn object_key(prefix: Option<&str>, name: &str) -> Result<String, StorageError> {
    if !is_safe_storage_name(name) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(match prefix {
        Some(prefix) => format!("{}/{}", prefix, name),
        None => name.to_string(),
    })
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, name: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        let key = self.key_for(name)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data.to_vec()))
            // Conditional write: refuse to replace an existing key
            .if_none_match("*")
            .send()
            .await
            .map_err(|e| match e.raw_response().map(|r| r.status().as_u16()) {
                Some(PRECONDITION_FAILED) => StorageError::AlreadyExists(key.clone()),
                _ => StorageError::SdkError(format!("Failed to put object {}: {}", key, e)),
            })?;

        tracing::debug!(key = %key, size = data.len(), "Stored upload in S3");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let key = self.key_for(name)?;

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(err) if err.is_no_such_key() => StorageError::ObjectNotFound(key.clone()),
                _ => StorageError::SdkError(format!("Failed to get object {}: {}", key, e)),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::SdkError(format!("Failed to read object body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let key = self.key_for(name)?;

        // S3 deletes are idempotent, so check first to report missing objects
        if !self.exists(name).await? {
            return Err(StorageError::ObjectNotFound(key));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::SdkError(format!("Failed to delete object {}: {}", key, e)))?;

        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let key = self.key_for(name)?;

        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match e.as_service_error() {
                Some(err) if err.is_not_found() => Ok(false),
                _ => Err(StorageError::SdkError(format!(
                    "Failed to head object {}: {}",
                    key, e
                ))),
            },
        }
    }
}
