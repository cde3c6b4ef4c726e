//! Notes database operations

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// Storage format for `created_at`. Fixed width, so comparing the text
/// compares the instants.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Persisted note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: i64,
    pub storage_name: String,
    pub text_content: String,
    pub tags: String,
    pub summary: String,
    pub keywords: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a note. `id` and `created_at` are assigned
/// by the repository.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub storage_name: String,
    pub text_content: String,
    pub tags: String,
    pub summary: String,
    pub keywords: String,
}

/// Conjunctive note filter. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    /// Case-insensitive substring of `text_content`
    pub text_contains: Option<String>,
    /// Case-insensitive substring of `tags`
    pub tags_contain: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
}

impl NoteFilter {
    pub fn is_empty(&self) -> bool {
        self.text_contains.is_none()
            && self.tags_contain.is_none()
            && self.created_from.is_none()
            && self.created_before.is_none()
    }
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("A note with storage name {0} already exists")]
    DuplicateStorageName(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt note row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },
}

/// Note persistence
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a note atomically. A storage name collision leaves nothing
    /// behind and is reported as `DuplicateStorageName`.
    async fn create(&self, note: NewNote) -> Result<Note, RepositoryError>;

    async fn get(&self, id: i64) -> Result<Option<Note>, RepositoryError>;

    /// Returns false when no note had this id.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Notes matching every set predicate, newest first.
    async fn query(&self, filter: &NoteFilter) -> Result<Vec<Note>, RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
struct NoteRow {
    id: i64,
    storage_name: String,
    text_content: String,
    tags: String,
    summary: String,
    keywords: String,
    created_at: String,
}

impl TryFrom<NoteRow> for Note {
    type Error = RepositoryError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        let created_at = NaiveDateTime::parse_from_str(&row.created_at, TIMESTAMP_FORMAT)
            .map_err(|e| RepositoryError::CorruptRow {
                id: row.id,
                reason: format!("bad created_at {:?}: {}", row.created_at, e),
            })?
            .and_utc();

        Ok(Note {
            id: row.id,
            storage_name: row.storage_name,
            text_content: row.text_content,
            tags: row.tags,
            summary: row.summary,
            keywords: row.keywords,
            created_at,
        })
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Escape `LIKE` wildcards so the needle matches literally
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

const NOTE_COLUMNS: &str =
    "id, storage_name, text_content, tags, summary, keywords, created_at";

/// SQLite-backed note repository
#[derive(Clone)]
pub struct SqliteNoteRepository {
    pool: SqlitePool,
}

impl SqliteNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for SqliteNoteRepository {
    async fn create(&self, note: NewNote) -> Result<Note, RepositoryError> {
        let now = format_timestamp(&Utc::now());

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, NoteRow>(&format!(
            r#"
            INSERT INTO notes
                (storage_name, text_content, tags, summary, keywords, text_lower, tags_lower, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(&note.storage_name)
        .bind(&note.text_content)
        .bind(&note.tags)
        .bind(&note.summary)
        .bind(&note.keywords)
        .bind(note.text_content.to_lowercase())
        .bind(note.tags.to_lowercase())
        .bind(&now)
        .fetch_one(&mut *tx)
        .await;

        // Dropping `tx` on the error paths rolls the insert back
        let row = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(RepositoryError::DuplicateStorageName(note.storage_name));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        Note::try_from(row)
    }

    async fn get(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        let row = sqlx::query_as::<_, NoteRow>(&format!(
            "SELECT {} FROM notes WHERE id = ?",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Note::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, filter: &NoteFilter) -> Result<Vec<Note>, RepositoryError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        // SQLite's LIKE only folds ASCII, so both sides are lowercased here
        if let Some(text) = &filter.text_contains {
            clauses.push(r"text_lower LIKE ? ESCAPE '\'");
            binds.push(like_pattern(&text.to_lowercase()));
        }

        if let Some(tag) = &filter.tags_contain {
            clauses.push(r"tags_lower LIKE ? ESCAPE '\'");
            binds.push(like_pattern(&tag.to_lowercase()));
        }

        if let Some(from) = &filter.created_from {
            clauses.push("created_at >= ?");
            binds.push(format_timestamp(from));
        }

        if let Some(before) = &filter.created_before {
            clauses.push("created_at < ?");
            binds.push(format_timestamp(before));
        }

        let mut sql = format!("SELECT {} FROM notes", NOTE_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query = sqlx::query_as::<_, NoteRow>(&sql);
        for bind in binds {
            query = query.bind(bind);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Note::try_from).collect()
    }
}
