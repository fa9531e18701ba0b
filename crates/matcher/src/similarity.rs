//! Edit-distance similarity between two field values.
//!
//! Scores are percentages in `[0, 100]`: `(1 - d / max_len) * 100` where `d`
//! is the Levenshtein distance and `max_len` the longer input, both counted
//! in chars. Comparison is literal: no case folding, trimming, or Unicode
//! normalization.

use strsim::levenshtein;

fn distance_and_len(a: &str, b: &str) -> (usize, usize) {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return (0, 0);
    }
    (levenshtein(a, b), longest)
}

/// Similarity percentage between `a` and `b`. Two empty strings score 100.
pub fn similarity(a: &str, b: &str) -> f64 {
    match distance_and_len(a, b) {
        (_, 0) => 100.0,
        (distance, longest) => (1.0 - distance as f64 / longest as f64) * 100.0,
    }
}

/// `similarity(query, target) >= threshold`, decided in integer arithmetic so
/// that scores landing exactly on the threshold are never lost to rounding.
pub fn is_match(query: &str, target: &str, threshold: u8) -> bool {
    let (distance, longest) = distance_and_len(query, target);
    if longest == 0 {
        return true;
    }
    100 * (longest - distance) >= usize::from(threshold) * longest
}
