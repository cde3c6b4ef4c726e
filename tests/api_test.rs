//! HTTP API tests
//!
//! Drive the full router with stub OCR and rasterizer backends.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;
use tower::ServiceExt;

use lecturelens_server::config::Config;
use lecturelens_server::db::{initialize_schema, SqliteNoteRepository};
use lecturelens_server::extract::TextExtractor;
use lecturelens_server::ingest::IngestPipeline;
use lecturelens_server::ocr::{OcrError, OcrProvider, OcrProviderTrait, OcrResult};
use lecturelens_server::pdf::{PageImage, PageRasterizer, RasterizeError};
use lecturelens_server::routes;
use lecturelens_server::service::NoteService;
use lecturelens_server::state::AppState;
use lecturelens_server::storage::LocalBlobStore;

const BOUNDARY: &str = "lecturelens-test-boundary";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Treats the bytes after the PNG signature as the recognized text
struct SignatureOcr;

#[async_trait]
impl OcrProviderTrait for SignatureOcr {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(&self, image_data: &[u8], _language: Option<&str>) -> Result<OcrResult, OcrError> {
        let text = image_data.strip_prefix(PNG_BYTES).unwrap_or(image_data);
        Ok(OcrResult {
            text: String::from_utf8_lossy(text).into_owned(),
            confidence: 100.0,
            provider: OcrProvider::Tesseract,
        })
    }
}

/// Splits the PDF body on form feeds, one page per chunk
struct FormFeedPages;

#[async_trait]
impl PageRasterizer for FormFeedPages {
    async fn rasterize(&self, pdf_data: &[u8]) -> Result<Vec<PageImage>, RasterizeError> {
        let body = pdf_data
            .strip_prefix(b"%PDF")
            .ok_or_else(|| RasterizeError::RenderError("missing PDF header".to_string()))?;

        Ok(body
            .split(|b| *b == b'\x0c')
            .enumerate()
            .map(|(i, page)| PageImage {
                page: i + 1,
                data: page.to_vec(),
            })
            .collect())
    }
}

struct TestApp {
    _dir: TempDir,
    router: Router,
}

async fn setup_app_with(configure: impl FnOnce(IngestPipeline) -> IngestPipeline) -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(LocalBlobStore::create(dir.path().join("uploads")).await.unwrap());

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    initialize_schema(&pool).await.unwrap();
    let repo = Arc::new(SqliteNoteRepository::new(pool));

    let mut config = Config::default();
    config.server.public_url = Some("http://notes.test".to_string());

    let extractor = TextExtractor::new(store.clone(), Arc::new(SignatureOcr), Arc::new(FormFeedPages));
    let pipeline = configure(IngestPipeline::new(
        repo.clone(),
        store.clone(),
        extractor,
        config.analysis.clone(),
    ));
    let notes = NoteService::with_pipeline(repo, store, pipeline);

    TestApp {
        _dir: dir,
        router: routes::router(AppState::new(config, notes)),
    }
}

async fn setup_app() -> TestApp {
    setup_app_with(|pipeline| pipeline).await
}

fn png_with_text(text: &str) -> Vec<u8> {
    let mut data = PNG_BYTES.to_vec();
    data.extend_from_slice(text.as_bytes());
    data
}

fn multipart_body(filename: &str, data: &[u8], tags: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    if let Some(tags) = tags {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\n{tags}\r\n").as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn upload(router: &Router, filename: &str, data: &[u8], tags: Option<&str>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(filename, data, tags)))
        .unwrap();
    send_json(router, request).await
}

async fn search(router: &Router, query: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(format!("/search{query}"))
        .body(Body::empty())
        .unwrap();
    send_json(router, request).await
}

#[tokio::test]
async fn test_root_and_health() {
    let app = setup_app().await;

    let (status, body) = send(&app.router, Request::builder().uri("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.is_empty());

    let (status, json) = send_json(
        &app.router,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["ocr_available"], true);
}

#[tokio::test]
async fn test_receipt_upload() {
    let app = setup_app().await;

    let (status, json) = upload(&app.router, "receipt.png", &png_with_text("Total: 42 dollars"), None).await;
    assert_eq!(status, StatusCode::OK);

    assert!(json["filename"].as_str().unwrap().ends_with("_receipt.png"));
    assert!(!json["summary"].as_str().unwrap().is_empty());

    let keywords: Vec<&str> = json["keywords"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k.as_str().unwrap())
        .collect();
    assert!(!keywords.is_empty());
    assert!(keywords.iter().all(|k| *k == "total" || *k == "dollars"));
}

#[tokio::test]
async fn test_upload_then_search_round_trip() {
    let app = setup_app().await;

    let (status, uploaded) = upload(
        &app.router,
        "cells.png",
        &png_with_text("Ribosomes synthesize proteins from amino acids."),
        Some("biology"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    upload(&app.router, "other.png", &png_with_text("Unrelated calculus notes."), None).await;

    let (status, results) = search(&app.router, "?q=ribosomes").await;
    assert_eq!(status, StatusCode::OK);

    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);

    let hit = &results[0];
    let filename = uploaded["filename"].as_str().unwrap();
    assert_eq!(hit["file_name"], filename);
    assert_eq!(hit["tags"], "biology");
    assert_eq!(hit["file_url"], format!("http://notes.test/files/{filename}"));

    let (status, by_tag) = search(&app.router, "?tag=BIO").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_tag.as_array().unwrap().len(), 1);

    let (_, everything) = search(&app.router, "").await;
    assert_eq!(everything.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_pdf_pages_are_joined() {
    let app = setup_app().await;

    let (status, json) = upload(
        &app.router,
        "lecture.pdf",
        b"%PDFThermodynamics governs heat.\x0cEntropy always increases.",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["filename"].as_str().unwrap().ends_with("_lecture.pdf"));

    let (_, results) = search(&app.router, "?q=entropy").await;
    let excerpt = results[0]["text_excerpt"].as_str().unwrap();
    assert_eq!(excerpt, "Thermodynamics governs heat.\nEntropy always increases.");
}

#[tokio::test]
async fn test_search_future_start_date_is_empty() {
    let app = setup_app().await;
    upload(&app.router, "a.png", &png_with_text("Some text."), None).await;

    let (status, results) = search(&app.router, "?start_date=2099-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert!(results.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_bad_date() {
    let app = setup_app().await;

    let (status, json) = search(&app.router, "?end_date=not-a-date").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_upload_rejections() {
    let app = setup_app().await;

    let (status, _) = upload(&app.router, "script.exe", b"MZ", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = upload(&app.router, "", &png_with_text("x"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A form without a file part
    let body = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\nmath\r\n--{BOUNDARY}--\r\n");
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, results) = search(&app.router, "").await;
    assert!(results.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_extraction_failure() {
    let app = setup_app().await;

    let (status, json) = upload(&app.router, "broken.pdf", b"not a pdf at all", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "OCR processing failed");
    assert!(json["details"].is_string());
}

#[tokio::test]
async fn test_storage_name_collision() {
    fn fixed_name(_original: &str) -> String {
        "fixed_scan.png".to_string()
    }

    let app = setup_app_with(|pipeline| pipeline.with_namer(fixed_name)).await;

    let (status, _) = upload(&app.router, "scan.png", &png_with_text("First upload."), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = upload(&app.router, "scan.png", &png_with_text("Second upload."), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");

    let (_, results) = search(&app.router, "").await;
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["text_excerpt"], "First upload.");

    let (status, body) = send(
        &app.router,
        Request::builder().uri("/files/fixed_scan.png").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, png_with_text("First upload."));
}

#[tokio::test]
async fn test_file_fetch() {
    let app = setup_app().await;
    let data = png_with_text("Stored bytes.");
    let (_, json) = upload(&app.router, "page.png", &data, None).await;
    let filename = json["filename"].as_str().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/files/{filename}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.to_vec(), data);

    let (status, _) = send(
        &app.router,
        Request::builder().uri("/files/missing_x.png").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        Request::builder().uri("/files/notes.txt").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        Request::builder().uri("/files/..%2Fsecret.png").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete() {
    let app = setup_app().await;
    upload(&app.router, "gone.png", &png_with_text("Soon deleted."), None).await;

    let (_, results) = search(&app.router, "").await;
    let id = results[0]["id"].as_i64().unwrap();
    let filename = results[0]["file_name"].as_str().unwrap().to_string();

    let (status, json) = send_json(
        &app.router,
        Request::builder()
            .method("DELETE")
            .uri(format!("/delete/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].is_string());

    let (_, results) = search(&app.router, "").await;
    assert!(results.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app.router,
        Request::builder().uri(format!("/files/{filename}")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send_json(
        &app.router,
        Request::builder()
            .method("DELETE")
            .uri(format!("/delete/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}
