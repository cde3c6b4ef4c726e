//! LectureLens Server Library
//!
//! Ingests scanned notes and PDFs, extracts their text with OCR, derives a
//! summary and keywords, and serves filtered search over the results.

pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod ocr;
pub mod pdf;
pub mod routes;
pub mod search;
pub mod service;
pub mod state;
pub mod storage;
