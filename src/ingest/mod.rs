//! Ingestion pipeline
//!
//! Takes one upload from receipt to a persisted note:
//!
//! ```text
//! Received -> Validated -> Stored -> Extracted -> Analyzed -> Persisted
//! ```
//!
//! Each step either advances or ends the upload with an `IngestError` that
//! names the step it failed in. Nothing is retried. Bytes written in the
//! `Stored` step are left in place when a later step fails.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::analysis::analyze;
use crate::config::AnalysisConfig;
use crate::db::{NewNote, NoteRepository, RepositoryError};
use crate::extract::{ExtractionError, TextExtractor};
use crate::storage::{content_type_for, is_allowed, make_storage_name, BlobStore, StorageError};

/// Separator used when a list of keywords is stored as a single string
pub const LIST_SEPARATOR: &str = ", ";

/// Pipeline steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStage {
    Received,
    Validated,
    Stored,
    Extracted,
    Analyzed,
    Persisted,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Received => "received",
            IngestStage::Validated => "validated",
            IngestStage::Stored => "stored",
            IngestStage::Extracted => "extracted",
            IngestStage::Analyzed => "analyzed",
            IngestStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Reasons an upload is rejected before anything is stored
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("No file part")]
    MissingFile,

    #[error("No selected file")]
    EmptyFilename,

    #[error("File type not allowed: {0}")]
    DisallowedExtension(String),
}

/// Ingestion failure
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The storage name is taken, either by stored bytes or by a note
    #[error("Storage name already in use: {storage_name}")]
    Conflict {
        storage_name: String,
        stage: IngestStage,
    },

    /// Blob write or record insert failed
    #[error("Failed to persist upload: {source}")]
    Persistence {
        stage: IngestStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl IngestError {
    /// The step the upload was in when it failed.
    pub fn stage(&self) -> IngestStage {
        match self {
            IngestError::Validation(_) => IngestStage::Received,
            IngestError::Extraction(_) => IngestStage::Stored,
            IngestError::Conflict { stage, .. } | IngestError::Persistence { stage, .. } => *stage,
        }
    }
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AlreadyExists(storage_name) => IngestError::Conflict {
                storage_name,
                stage: IngestStage::Validated,
            },
            other => IngestError::Persistence {
                stage: IngestStage::Validated,
                source: Box::new(other),
            },
        }
    }
}

impl From<RepositoryError> for IngestError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateStorageName(storage_name) => IngestError::Conflict {
                storage_name,
                stage: IngestStage::Analyzed,
            },
            other => IngestError::Persistence {
                stage: IngestStage::Analyzed,
                source: Box::new(other),
            },
        }
    }
}

/// One uploaded file as received from the client
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    /// `None` when the request carried no file part
    pub filename: Option<String>,
    pub tags: Option<String>,
}

/// Result of a successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// Storage name of the new note
    pub filename: String,
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Produces the storage name for an upload
pub type StorageNamer = fn(&str) -> String;

/// Drives one upload through every stage
#[derive(Clone)]
pub struct IngestPipeline {
    repo: Arc<dyn NoteRepository>,
    blob_store: Arc<dyn BlobStore>,
    extractor: TextExtractor,
    analysis: AnalysisConfig,
    namer: StorageNamer,
}

impl IngestPipeline {
    pub fn new(
        repo: Arc<dyn NoteRepository>,
        blob_store: Arc<dyn BlobStore>,
        extractor: TextExtractor,
        analysis: AnalysisConfig,
    ) -> Self {
        Self {
            repo,
            blob_store,
            extractor,
            analysis,
            namer: make_storage_name,
        }
    }

    /// Replace the storage namer. Used to force name collisions in tests.
    pub fn with_namer(mut self, namer: StorageNamer) -> Self {
        self.namer = namer;
        self
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    pub async fn ingest(&self, upload: Upload) -> Result<IngestOutcome, IngestError> {
        let original_name = validate(&upload)?;
        debug!(filename = %original_name, stage = %IngestStage::Validated, "Upload validated");

        let storage_name = (self.namer)(original_name);
        self.blob_store
            .put(&storage_name, &upload.bytes, &content_type_for(&storage_name))
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    warn!(storage_name = %storage_name, "Storage name collision, upload rejected");
                    IngestError::Conflict {
                        storage_name: storage_name.clone(),
                        stage: IngestStage::Validated,
                    }
                }
                other => {
                    error!(storage_name = %storage_name, error = %other, "Failed to store upload");
                    IngestError::from(other)
                }
            })?;
        info!(
            storage_name = %storage_name,
            stage = %IngestStage::Stored,
            size = upload.bytes.len(),
            "Upload stored"
        );

        let text = self.extractor.extract(&storage_name).await.map_err(|e| {
            warn!(storage_name = %storage_name, error = %e, "Text extraction failed");
            IngestError::Extraction(e)
        })?;
        debug!(
            storage_name = %storage_name,
            stage = %IngestStage::Extracted,
            chars = text.chars().count(),
            "Text extracted"
        );

        let analysis = analyze(&text, &self.analysis);
        debug!(
            storage_name = %storage_name,
            stage = %IngestStage::Analyzed,
            keywords = analysis.keywords.len(),
            "Text analyzed"
        );

        let keywords = analysis.keywords.join(LIST_SEPARATOR);
        let tags = match upload.tags.as_deref().map(str::trim) {
            Some(tags) if !tags.is_empty() => tags.to_string(),
            _ => keywords.clone(),
        };

        let note = self
            .repo
            .create(NewNote {
                storage_name: storage_name.clone(),
                text_content: text,
                tags,
                summary: analysis.summary.clone(),
                keywords,
            })
            .await
            .map_err(|e| {
                warn!(storage_name = %storage_name, error = %e, "Failed to persist note");
                IngestError::from(e)
            })?;
        info!(
            storage_name = %storage_name,
            stage = %IngestStage::Persisted,
            note_id = note.id,
            "Note created"
        );

        Ok(IngestOutcome {
            filename: storage_name,
            summary: analysis.summary,
            keywords: analysis.keywords,
        })
    }
}

/// Returns the original filename when the upload may proceed.
fn validate(upload: &Upload) -> Result<&str, ValidationError> {
    let filename = upload.filename.as_deref().ok_or(ValidationError::MissingFile)?;

    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if !is_allowed(filename) {
        return Err(ValidationError::DisallowedExtension(filename.to_string()));
    }

    Ok(filename)
}
