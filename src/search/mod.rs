//! Note search
//!
//! Parses request filters, runs them against the note repository and
//! projects the matches into client-facing views.

use std::sync::Arc;

use chrono::{Days, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::db::{Note, NoteFilter, NoteRepository, RepositoryError};

/// Characters of note text included in a search result
pub const EXCERPT_CHARS: usize = 200;

/// Accepted date format for `start_date` and `end_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw search filters as received from the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Search errors
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid {field}: {value:?}, expected YYYY-MM-DD")]
    DateFormat { field: &'static str, value: String },

    #[error("Search failed: {0}")]
    Persistence(#[from] RepositoryError),
}

/// One search hit
#[derive(Debug, Clone, Serialize)]
pub struct NoteView {
    pub id: i64,
    pub file_name: String,
    pub tags: String,
    pub summary: String,
    pub keywords: String,
    pub text_excerpt: String,
    pub file_url: String,
    pub created_at: String,
}

impl NoteView {
    fn from_note(note: Note, base_url: &str) -> Self {
        Self {
            id: note.id,
            file_url: format!("{}files/{}", base_url, note.storage_name),
            text_excerpt: excerpt(&note.text_content),
            created_at: note.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            file_name: note.storage_name,
            tags: note.tags,
            summary: note.summary,
            keywords: note.keywords,
        }
    }
}

/// Runs filtered searches over stored notes
#[derive(Clone)]
pub struct QueryEngine {
    repo: Arc<dyn NoteRepository>,
}

impl QueryEngine {
    pub fn new(repo: Arc<dyn NoteRepository>) -> Self {
        Self { repo }
    }

    /// Notes matching every supplied filter, newest first. `base_url` must
    /// end with `/`.
    pub async fn search(&self, params: SearchParams, base_url: &str) -> Result<Vec<NoteView>, SearchError> {
        let filter = build_filter(&params)?;

        tracing::debug!(?filter, "Searching notes");
        let notes = self.repo.query(&filter).await?;

        Ok(notes
            .into_iter()
            .map(|note| NoteView::from_note(note, base_url))
            .collect())
    }
}

fn build_filter(params: &SearchParams) -> Result<NoteFilter, SearchError> {
    let start = parse_date("start_date", params.start_date.as_deref())?;
    let end = parse_date("end_date", params.end_date.as_deref())?;

    Ok(NoteFilter {
        text_contains: present(params.q.as_deref()),
        tags_contain: present(params.tag.as_deref()),
        created_from: start.map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc()),
        // Whole end day included
        created_before: end
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc()),
    })
}

/// Blank values count as absent.
fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, SearchError> {
    match present(value) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| SearchError::DateFormat { field, value: raw }),
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
