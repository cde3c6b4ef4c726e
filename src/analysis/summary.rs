//! Extractive summarization
//!
//! Sentences are scored with the LSA sentence weight. Building the
//! term-sentence matrix with smoothed term frequencies and keeping every
//! singular dimension, the weight of sentence `j` is
//! `sqrt(sum_i sigma_i^2 * v_ij^2)`, which equals the Euclidean norm of column
//! `j` of the matrix. That norm is computed directly, so no decomposition is
//! needed and the result is fully deterministic.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::tokenize::{sentences, words};

/// Weight given to any term present in a sentence, before frequency
const TF_SMOOTHING: f64 = 0.4;

/// Pick up to `sentence_count` of the most representative sentences of
/// `text`, returned in their original order joined by single spaces.
pub fn summarize(text: &str, sentence_count: usize) -> String {
    let all = sentences(text);
    if sentence_count == 0 || all.is_empty() {
        return String::new();
    }
    if all.len() <= sentence_count {
        return all.join(" ");
    }

    let weights: Vec<f64> = all.iter().map(|s| sentence_weight(s)).collect();

    let mut ranked: Vec<usize> = (0..all.len()).collect();
    ranked.sort_by(|&a, &b| {
        weights[b]
            .partial_cmp(&weights[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut chosen: Vec<usize> = ranked.into_iter().take(sentence_count).collect();
    chosen.sort_unstable();

    chosen
        .into_iter()
        .map(|i| all[i].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Norm of the sentence's smoothed term-frequency column
fn sentence_weight(sentence: &str) -> f64 {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words(sentence) {
        if word.chars().any(char::is_alphabetic) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let max = match counts.values().copied().max() {
        Some(max) => max as f64,
        None => return 0.0,
    };

    counts
        .values()
        .map(|&count| {
            let tf = TF_SMOOTHING + (1.0 - TF_SMOOTHING) * (count as f64 / max);
            tf * tf
        })
        .sum::<f64>()
        .sqrt()
}
