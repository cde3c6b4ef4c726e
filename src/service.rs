//! Note service
//!
//! The operations exposed to clients: ingest, search, file fetch and
//! delete. Routes call into this and nothing else.

use std::sync::Arc;

use crate::db::{NoteRepository, RepositoryError};
use crate::extract::TextExtractor;
use crate::ingest::{IngestError, IngestOutcome, IngestPipeline, Upload};
use crate::search::{NoteView, QueryEngine, SearchError, SearchParams};
use crate::storage::{content_type_for, is_allowed, is_safe_storage_name, BlobStore, StorageError};
use crate::config::AnalysisConfig;

/// A stored upload ready to be sent back to a client
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read file: {0}")]
    Storage(#[source] StorageError),
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("Note not found: {0}")]
    NotFound(i64),

    #[error("Failed to delete note: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Entry point for every note operation
#[derive(Clone)]
pub struct NoteService {
    repo: Arc<dyn NoteRepository>,
    blob_store: Arc<dyn BlobStore>,
    pipeline: IngestPipeline,
    query: QueryEngine,
}

impl NoteService {
    pub fn new(
        repo: Arc<dyn NoteRepository>,
        blob_store: Arc<dyn BlobStore>,
        extractor: TextExtractor,
        analysis: AnalysisConfig,
    ) -> Self {
        let pipeline = IngestPipeline::new(repo.clone(), blob_store.clone(), extractor, analysis);
        Self::with_pipeline(repo, blob_store, pipeline)
    }

    /// Build around an already configured pipeline.
    pub fn with_pipeline(
        repo: Arc<dyn NoteRepository>,
        blob_store: Arc<dyn BlobStore>,
        pipeline: IngestPipeline,
    ) -> Self {
        Self {
            query: QueryEngine::new(repo.clone()),
            repo,
            blob_store,
            pipeline,
        }
    }

    pub fn extractor(&self) -> &TextExtractor {
        self.pipeline.extractor()
    }

    pub async fn ingest(&self, upload: Upload) -> Result<IngestOutcome, IngestError> {
        self.pipeline.ingest(upload).await
    }

    pub async fn search(&self, params: SearchParams, base_url: &str) -> Result<Vec<NoteView>, SearchError> {
        self.query.search(params, base_url).await
    }

    /// Read a stored upload. Only single-component names with an accepted
    /// extension are served.
    pub async fn fetch_file(&self, storage_name: &str) -> Result<StoredFile, FetchError> {
        if !is_safe_storage_name(storage_name) || !is_allowed(storage_name) {
            tracing::warn!(storage_name = %storage_name, "Rejected file request");
            return Err(FetchError::AccessDenied(storage_name.to_string()));
        }

        let data = self.blob_store.get(storage_name).await.map_err(|e| match e {
            StorageError::ObjectNotFound(name) => FetchError::NotFound(name),
            other => FetchError::Storage(other),
        })?;

        Ok(StoredFile {
            name: storage_name.to_string(),
            content_type: content_type_for(storage_name),
            data,
        })
    }

    /// Delete a note and its stored bytes.
    ///
    /// The bytes go first and a failure there is only logged. If the record
    /// delete then fails the bytes stay deleted.
    pub async fn delete(&self, id: i64) -> Result<(), DeleteError> {
        let note = self.repo.get(id).await?.ok_or(DeleteError::NotFound(id))?;

        if let Err(e) = self.blob_store.delete(&note.storage_name).await {
            tracing::warn!(
                note_id = id,
                storage_name = %note.storage_name,
                error = %e,
                "Failed to delete stored file, removing note anyway"
            );
        }

        if !self.repo.delete(id).await? {
            return Err(DeleteError::NotFound(id));
        }

        tracing::info!(note_id = id, storage_name = %note.storage_name, "Note deleted");
        Ok(())
    }
}
