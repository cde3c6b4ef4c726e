//! Route modules for LectureLens Server

pub mod files;
pub mod health;
pub mod notes;

use axum::{extract::DefaultBodyLimit, http::HeaderMap, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router())
        .merge(notes::router())
        .merge(files::router())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Base URL for links handed back to clients, always ending in `/`.
///
/// Uses the configured public URL when set, otherwise the request's
/// `Host` header.
pub(crate) fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    let base = match &state.config().server.public_url {
        Some(url) => url.clone(),
        None => {
            let host = headers
                .get(axum::http::header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{}", host)
        }
    };

    if base.ends_with('/') {
        base
    } else {
        format!("{}/", base)
    }
}
