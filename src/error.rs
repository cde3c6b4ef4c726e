//! Error types for the LectureLens server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ingest::IngestError;
use crate::search::SearchError;
use crate::service::{DeleteError, FetchError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("OCR processing failed: {0}")]
    ExtractionFailed(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "access_denied", "Access denied".to_string(), Some(msg))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            AppError::ExtractionFailed(details) => {
                tracing::error!("Extraction error: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "extraction_failed",
                    "OCR processing failed".to_string(),
                    Some(details),
                )
            }
            AppError::Persistence(details) => {
                tracing::error!("Persistence error: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "persistence_error",
                    "Failed to save data".to_string(),
                    Some(details),
                )
            }
            AppError::Internal(details) => {
                tracing::error!("Internal error: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(e) => AppError::BadRequest(e.to_string()),
            IngestError::Extraction(e) => AppError::ExtractionFailed(e.to_string()),
            IngestError::Conflict { storage_name, .. } => {
                AppError::Conflict(format!("A note named {} already exists", storage_name))
            }
            err @ IngestError::Persistence { .. } => AppError::Persistence(err.to_string()),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            e @ SearchError::DateFormat { .. } => AppError::BadRequest(e.to_string()),
            SearchError::Persistence(e) => AppError::Persistence(e.to_string()),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::AccessDenied(name) => AppError::Forbidden(name),
            FetchError::NotFound(name) => AppError::NotFound(format!("File not found: {}", name)),
            FetchError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<DeleteError> for AppError {
    fn from(err: DeleteError) -> Self {
        match err {
            DeleteError::NotFound(id) => AppError::NotFound(format!("Note {} not found", id)),
            DeleteError::Persistence(e) => AppError::Persistence(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{IngestStage, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(IngestError::Validation(ValidationError::MissingFile)), StatusCode::BAD_REQUEST),
            (
                AppError::from(IngestError::Conflict {
                    storage_name: "x_a.png".to_string(),
                    stage: IngestStage::Validated,
                }),
                StatusCode::CONFLICT,
            ),
            (AppError::from(FetchError::AccessDenied("../x".to_string())), StatusCode::FORBIDDEN),
            (AppError::from(DeleteError::NotFound(7)), StatusCode::NOT_FOUND),
            (
                AppError::from(SearchError::DateFormat {
                    field: "start_date",
                    value: "yesterday".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
