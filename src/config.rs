//! Configuration management for LectureLens Server
//!
//! Built once at startup from the environment and handed to the components
//! that need it. Nothing reads the environment after `main`.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::analysis::{DEFAULT_KEYWORD_COUNT, DEFAULT_SUMMARY_SENTENCES};
use crate::ocr::OcrProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
    pub pdf: PdfConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL used when building file links; derived from the request
    /// `Host` header when unset.
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Local {
        root: PathBuf,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: Option<String>,
        prefix: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub provider: OcrProvider,
    pub tesseract_cmd: String,
    pub language: String,
    pub ollama_url: String,
    pub ollama_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterizerKind {
    Poppler,
    Mupdf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    pub rasterizer: RasterizerKind,
    /// Directory holding `pdftoppm`; `None` means resolve through `$PATH`.
    pub poppler_path: Option<PathBuf>,
    pub dpi: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub summary_sentences: usize,
    pub keyword_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                public_url: None,
            },
            database: DatabaseConfig {
                url: "sqlite:./lecturelens.db".to_string(),
            },
            storage: StorageConfig::Local {
                root: PathBuf::from("uploads"),
            },
            ocr: OcrConfig::default(),
            pdf: PdfConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: OcrProvider::Tesseract,
            tesseract_cmd: "/usr/bin/tesseract".to_string(),
            language: "eng".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llava".to_string(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            rasterizer: RasterizerKind::Poppler,
            poppler_path: None,
            dpi: 200,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            summary_sentences: DEFAULT_SUMMARY_SENTENCES,
            keyword_count: DEFAULT_KEYWORD_COUNT,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: String, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
                public_url: optional_var("PUBLIC_URL"),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            storage: storage_from_env()?,
            ocr: OcrConfig {
                provider: match env::var("OCR_PROVIDER")
                    .unwrap_or_else(|_| "tesseract".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "tesseract" => OcrProvider::Tesseract,
                    "ollama" => OcrProvider::Ollama,
                    other => {
                        return Err(ConfigError::Invalid {
                            name: "OCR_PROVIDER".to_string(),
                            value: other.to_string(),
                        })
                    }
                },
                tesseract_cmd: env::var("TESSERACT_CMD").unwrap_or(defaults.ocr.tesseract_cmd),
                language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
            },
            pdf: PdfConfig {
                rasterizer: match env::var("PDF_RASTERIZER")
                    .unwrap_or_else(|_| "poppler".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "poppler" => RasterizerKind::Poppler,
                    "mupdf" => RasterizerKind::Mupdf,
                    other => {
                        return Err(ConfigError::Invalid {
                            name: "PDF_RASTERIZER".to_string(),
                            value: other.to_string(),
                        })
                    }
                },
                poppler_path: optional_var("POPPLER_PATH").map(PathBuf::from),
                dpi: parse_var("PDF_DPI", defaults.pdf.dpi)?,
            },
            analysis: AnalysisConfig {
                summary_sentences: parse_var(
                    "SUMMARY_SENTENCES",
                    defaults.analysis.summary_sentences,
                )?,
                keyword_count: parse_var("KEYWORD_COUNT", defaults.analysis.keyword_count)?,
            },
        })
    }
}

fn storage_from_env() -> Result<StorageConfig, ConfigError> {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string());

    match backend.to_lowercase().as_str() {
        "local" => Ok(StorageConfig::Local {
            root: PathBuf::from(env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "uploads".to_string())),
        }),
        "s3" => Ok(StorageConfig::S3 {
            endpoint: required_var("S3_ENDPOINT")?,
            bucket: required_var("S3_BUCKET")?,
            access_key: required_var("S3_ACCESS_KEY")?,
            secret_key: required_var("S3_SECRET_KEY")?,
            region: optional_var("S3_REGION"),
            prefix: optional_var("S3_PREFIX"),
        }),
        other => Err(ConfigError::Invalid {
            name: "STORAGE_BACKEND".to_string(),
            value: other.to_string(),
        }),
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name.to_string()))
}

/// Unset and blank variables are both treated as absent.
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_local_storage() {
        let config = Config::default();
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.analysis.summary_sentences, 3);
        assert_eq!(config.analysis.keyword_count, 5);
        assert_eq!(config.ocr.provider, OcrProvider::Tesseract);
    }

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let value: u16 = parse_var("LECTURELENS_TEST_UNSET_PORT", 1234).unwrap();
        assert_eq!(value, 1234);
    }

    #[test]
    fn test_invalid_var_reports_its_name() {
        env::set_var("LECTURELENS_TEST_BAD_COUNT", "many");
        let result: Result<usize, _> = parse_var("LECTURELENS_TEST_BAD_COUNT", 5);
        match result {
            Err(ConfigError::Invalid { name, value }) => {
                assert_eq!(name, "LECTURELENS_TEST_BAD_COUNT");
                assert_eq!(value, "many");
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }
}
