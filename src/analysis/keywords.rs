//! Frequency-based keyword ranking

use std::collections::HashMap;

use super::stopwords::is_stopword;
use super::tokenize::words;

/// The `num_keywords` most frequent non-stopword tokens of `text`, most
/// frequent first. Equal counts keep first-occurrence order. Purely numeric
/// tokens are dropped.
pub fn extract_keywords(text: &str, num_keywords: usize) -> Vec<String> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for word in words(text) {
        if is_stopword(&word) || word.chars().all(|c| c.is_numeric()) {
            continue;
        }
        match index.get(&word) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(word.clone(), order.len());
                order.push((word, 1));
            }
        }
    }

    // Stable sort keeps first-occurrence order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));

    order
        .into_iter()
        .take(num_keywords)
        .map(|(word, _)| word)
        .collect()
}
