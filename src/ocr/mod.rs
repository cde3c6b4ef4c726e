//! OCR Module
//!
//! Turns a single page image into plain text.
//!
//! Supports two backends, one of which is active at a time:
//! - Tesseract (local binary, default)
//! - Ollama vision models (local LLM)

mod provider;
mod types;

use std::sync::Arc;

pub use provider::{OcrProviderTrait, OllamaProvider, TesseractProvider};
pub use types::{OcrError, OcrProvider, OcrResult};

use crate::config::OcrConfig;

/// Build the configured OCR provider.
pub fn build_provider(config: &OcrConfig) -> Arc<dyn OcrProviderTrait> {
    match config.provider {
        OcrProvider::Tesseract => Arc::new(TesseractProvider::new(
            &config.tesseract_cmd,
            &config.language,
        )),
        OcrProvider::Ollama => Arc::new(OllamaProvider::new(
            &config.ollama_url,
            &config.ollama_model,
        )),
    }
}
