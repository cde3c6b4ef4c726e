//! Note routes
//!
//! Endpoints:
//! - POST /upload - Ingest a document (multipart `file`, optional `tags`)
//! - GET /search - Filter notes by text, tag and date range
//! - DELETE /delete/:id - Remove a note and its file

use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::ingest::Upload;
use crate::search::{NoteView, SearchParams};
use crate::state::AppState;

use super::base_url;

#[derive(Serialize)]
pub struct UploadResponse {
    message: &'static str,
    filename: String,
    summary: String,
    keywords: Vec<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    message: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/search", get(search))
        .route("/delete/:id", delete(delete_note))
}

/// POST /upload
async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        tracing::debug!(
            "Received field: name='{}', filename={:?}",
            name,
            field.file_name()
        );

        match name.as_str() {
            "file" => {
                upload.filename = Some(field.file_name().unwrap_or("").to_string());
                upload.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?
                    .to_vec();
            }
            "tags" => {
                upload.tags = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Failed to read tags: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let outcome = state.notes().ingest(upload).await?;

    Ok(Json(UploadResponse {
        message: "File uploaded and processed successfully",
        filename: outcome.filename,
        summary: outcome.summary,
        keywords: outcome.keywords,
    }))
}

/// GET /search
async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<NoteView>>> {
    let base = base_url(&state, &headers);
    let results = state.notes().search(params, &base).await?;

    tracing::debug!(results = results.len(), "Search complete");
    Ok(Json(results))
}

/// DELETE /delete/:id
async fn delete_note(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<MessageResponse>> {
    state.notes().delete(id).await?;

    Ok(Json(MessageResponse {
        message: format!("Note {} deleted successfully", id),
    }))
}
