//! Text analytics over extracted text
//!
//! Pure functions: no I/O, defined on every input including empty text.

mod keywords;
mod stopwords;
mod summary;
mod tokenize;

pub use keywords::extract_keywords;
pub use stopwords::{is_stopword, ENGLISH_STOPWORDS};
pub use summary::summarize;
pub use tokenize::{sentences, words};

use crate::config::AnalysisConfig;

/// Default number of sentences in a summary
pub const DEFAULT_SUMMARY_SENTENCES: usize = 3;

/// Default number of ranked keywords
pub const DEFAULT_KEYWORD_COUNT: usize = 5;

/// Summary and keywords derived from one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Run both derivations with the configured sizes.
pub fn analyze(text: &str, config: &AnalysisConfig) -> Analysis {
    Analysis {
        summary: summarize(text, config.summary_sentences),
        keywords: extract_keywords(text, config.keyword_count),
    }
}
