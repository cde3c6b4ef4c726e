//! Upload naming rules
//!
//! Decides which uploads are accepted and the name their bytes are stored
//! under. Storage names double as URL path segments, so they must never be
//! able to address anything outside the storage root.

use uuid::Uuid;

/// Extensions accepted for upload and for file serving.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "pdf"];

/// Stem used when nothing survives sanitization.
const FALLBACK_STEM: &str = "upload";

/// Broad document category, used to route extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Classify a filename by its extension. `None` for anything not accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        match extension_of(name)?.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Returns true iff `name` has a `.` and the lowercased suffix after the last
/// one is an accepted extension.
pub fn is_allowed(name: &str) -> bool {
    extension_of(name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Lowercased suffix after the final `.`, if any.
fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Build a fresh, collision-resistant storage name for an uploaded file.
///
/// The result is `{32 hex chars}_{sanitized stem}.{ext}`. Every call draws a
/// new random token, so the same input never yields the same name twice.
pub fn make_storage_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}_{}", token, sanitize_filename(original_name))
}

/// Reduce an untrusted filename to a single safe path component.
///
/// Only the final path component is kept (either separator style), whitespace
/// runs become `_`, characters outside `[A-Za-z0-9._-]` are dropped and dot
/// runs collapse to one. The extension is cleaned separately so it survives
/// even when the stem does not.
pub fn sanitize_filename(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (base, None),
    };

    let mut stem = clean_component(stem);
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }

    let ext = ext
        .map(|e| clean_component(e).replace('.', "").to_lowercase())
        .filter(|e| !e.is_empty());

    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn clean_component(raw: &str) -> String {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join("_");

    let mut out = String::with_capacity(joined.len());
    for ch in joined.chars() {
        let keep = ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.');
        if !keep || (ch == '.' && out.ends_with('.')) {
            continue;
        }
        out.push(ch);
    }

    out.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// True when `name` is a single path component that cannot escape the
/// storage root.
pub fn is_safe_storage_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// MIME type for a stored file, based on its extension.
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
