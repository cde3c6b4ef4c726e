//! PDF rasterization
//!
//! OCR engines work on images, so PDFs are rendered to one image per page
//! before recognition. Page order is preserved.

mod poppler;

#[cfg(feature = "mupdf")]
mod mupdf_renderer;

use std::sync::Arc;

use async_trait::async_trait;

pub use poppler::PopplerRasterizer;

#[cfg(feature = "mupdf")]
pub use mupdf_renderer::MupdfRasterizer;

use crate::config::{PdfConfig, RasterizerKind};

/// A rendered page, encoded as PNG
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Page number (1-indexed)
    pub page: usize,
    pub data: Vec<u8>,
}

/// Rasterization errors
#[derive(Debug, thiserror::Error)]
pub enum RasterizeError {
    #[error("Rasterizer not available: {0}")]
    NotAvailable(String),

    #[error("Failed to render PDF: {0}")]
    RenderError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders a PDF into an ordered sequence of page images
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, pdf_data: &[u8]) -> Result<Vec<PageImage>, RasterizeError>;
}

/// Build the configured rasterizer.
pub fn build_rasterizer(config: &PdfConfig) -> Result<Arc<dyn PageRasterizer>, RasterizeError> {
    match config.rasterizer {
        RasterizerKind::Poppler => Ok(Arc::new(PopplerRasterizer::new(
            config.poppler_path.clone(),
            config.dpi,
        ))),
        #[cfg(feature = "mupdf")]
        RasterizerKind::Mupdf => Ok(Arc::new(MupdfRasterizer::new(config.dpi))),
        #[cfg(not(feature = "mupdf"))]
        RasterizerKind::Mupdf => Err(RasterizeError::NotAvailable(
            "built without the `mupdf` feature".to_string(),
        )),
    }
}
