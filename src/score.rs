//!
//! src/score.rs
//!
//! Edit-distance similarity used for ranking and tie-breaking
//! candidates. Never the sole match criterion.
//!

use strsim::levenshtein;

use crate::normalize::strip_to_alnum_lower;

/// Standard Levenshtein distance (insert, delete, substitute at unit
/// cost). Symmetric, zero on equal inputs, triangle inequality holds.
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein(a, b)
}

/// Edit distance over the comparison-normalized forms of two strings.
pub fn comparison_distance(a: &str, b: &str) -> usize {
    edit_distance(&strip_to_alnum_lower(a), &strip_to_alnum_lower(b))
}
