//! Liveness and health routes

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::ocr::OcrProvider;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    ocr_provider: OcrProvider,
    ocr_available: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
}

async fn index() -> &'static str {
    "LectureLens server is running"
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ocr = state.notes().extractor().ocr_provider();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        ocr_provider: ocr.provider_type(),
        ocr_available: ocr.is_available().await,
    })
}
