//! LectureLens Server
//!
//! Turns uploaded lecture notes (images and PDFs) into searchable text with
//! summaries and keywords.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lecturelens_server::config::Config;
use lecturelens_server::db::{self, SqliteNoteRepository};
use lecturelens_server::extract::TextExtractor;
use lecturelens_server::ocr::build_provider;
use lecturelens_server::pdf::build_rasterizer;
use lecturelens_server::routes;
use lecturelens_server::service::NoteService;
use lecturelens_server::state::AppState;
use lecturelens_server::storage::open_blob_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lecturelens_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting LectureLens Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = db::create_pool(&config.database.url)
        .await
        .with_context(|| format!("Failed to initialize database at {}", config.database.url))?;
    tracing::info!("Database initialized at {}", config.database.url);

    let blob_store = open_blob_store(&config.storage)
        .await
        .context("Failed to initialize blob storage")?;

    let ocr = build_provider(&config.ocr);
    if !ocr.is_available().await {
        tracing::warn!("OCR provider {:?} is not available, uploads will fail", ocr.provider_type());
    }

    let rasterizer = build_rasterizer(&config.pdf).context("Failed to initialize PDF rasterizer")?;

    let extractor = TextExtractor::new(blob_store.clone(), ocr, rasterizer)
        .with_language(config.ocr.language.clone());
    let repo = Arc::new(SqliteNoteRepository::new(pool));
    let notes = NoteService::new(repo, blob_store, extractor, config.analysis.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = routes::router(AppState::new(config, notes));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("LectureLens Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
