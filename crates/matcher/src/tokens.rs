//! Matching for comma-delimited multi-value fields (`authors`, `keywords`).
//!
//! Both sides are split on `,` exactly as stored. Surrounding whitespace is
//! part of a token, so `"a, b"` yields `"a"` and `" b"`.

use crate::similarity::{is_match, similarity};

/// Every query token must have at least one target token scoring at or
/// above `threshold`. Stops at the first unmatched query token.
pub fn tokens_match(query_csv: &str, target_csv: &str, threshold: u8) -> bool {
    query_csv
        .split(',')
        .all(|q| target_csv.split(',').any(|t| is_match(q, t, threshold)))
}

/// Mean of each query token's best acceptable score, or `None` when some
/// query token has no counterpart at `threshold`.
pub fn tokens_score(query_csv: &str, target_csv: &str, threshold: u8) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for q in query_csv.split(',') {
        let best = target_csv
            .split(',')
            .filter(|t| is_match(q, t, threshold))
            .map(|t| similarity(q, t))
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))?;
        total += best;
        count += 1;
    }
    Some(total / count as f64)
}
