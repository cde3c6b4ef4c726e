//! Text extraction
//!
//! Routes a stored upload to single-image OCR or to page-by-page PDF OCR and
//! returns the plain text. Failures here are an expected outcome of
//! processing untrusted uploads, so every one of them comes back as an
//! `ExtractionError` and none is retried.

use std::sync::Arc;

use crate::ocr::{OcrError, OcrProviderTrait};
use crate::pdf::{PageRasterizer, RasterizeError};
use crate::storage::{BlobStore, DocumentKind, StorageError};

/// Separator placed between the text of consecutive PDF pages
pub const PAGE_SEPARATOR: &str = "\n";

/// Extraction failure, carrying the underlying cause
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Failed to read stored file: {0}")]
    Read(#[source] StorageError),

    #[error("Unreadable image: {0}")]
    UnreadableImage(String),

    #[error("PDF rasterization failed: {0}")]
    Rasterize(#[from] RasterizeError),

    #[error("OCR failed on page {page}: {source}")]
    PageOcr {
        page: usize,
        #[source]
        source: OcrError,
    },

    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Extracts text from stored uploads
#[derive(Clone)]
pub struct TextExtractor {
    blob_store: Arc<dyn BlobStore>,
    ocr: Arc<dyn OcrProviderTrait>,
    rasterizer: Arc<dyn PageRasterizer>,
    language: Option<String>,
}

impl TextExtractor {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        ocr: Arc<dyn OcrProviderTrait>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        Self {
            blob_store,
            ocr,
            rasterizer,
            language: None,
        }
    }

    /// Override the provider's default OCR language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn ocr_provider(&self) -> &Arc<dyn OcrProviderTrait> {
        &self.ocr
    }

    /// Extract the text of the upload stored under `storage_name`.
    ///
    /// The document kind is taken from the name's extension.
    pub async fn extract(&self, storage_name: &str) -> Result<String, ExtractionError> {
        let kind = DocumentKind::from_name(storage_name)
            .ok_or_else(|| ExtractionError::UnsupportedType(storage_name.to_string()))?;

        let data = self
            .blob_store
            .get(storage_name)
            .await
            .map_err(ExtractionError::Read)?;

        match kind {
            DocumentKind::Pdf => self.extract_pdf(&data).await,
            DocumentKind::Image => self.extract_image(&data).await,
        }
    }

    async fn extract_image(&self, data: &[u8]) -> Result<String, ExtractionError> {
        // Any recognised image passes; the OCR engine handles the decoding
        let format = image::guess_format(data)
            .map_err(|e| ExtractionError::UnreadableImage(e.to_string()))?;
        tracing::debug!(format = ?format, size = data.len(), "Sniffed image upload");

        let result = self.ocr.recognize(data, self.language.as_deref()).await?;
        Ok(result.text)
    }

    async fn extract_pdf(&self, data: &[u8]) -> Result<String, ExtractionError> {
        let pages = self.rasterizer.rasterize(data).await?;

        let mut texts = Vec::with_capacity(pages.len());
        for page in &pages {
            let result = self
                .ocr
                .recognize(&page.data, self.language.as_deref())
                .await
                .map_err(|source| ExtractionError::PageOcr {
                    page: page.page,
                    source,
                })?;
            texts.push(result.text);
        }

        tracing::debug!(pages = pages.len(), "Extracted text from PDF pages");
        Ok(texts.join(PAGE_SEPARATOR))
    }
}
