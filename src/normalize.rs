//!
//! src/normalize.rs
//!
//! Canonicalizes titles and artist names, both for outbound search
//! queries and for cross-platform equality comparison. Platforms
//! disagree on casing, punctuation, qualifier suffixes and censoring,
//! so raw equality produces false negatives without this pass.
//!

use once_cell::sync::Lazy;
use regex::Regex;

/// Collapse runs of whitespace into a single space.
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Asterisk-masked censored words ("f**k", "****"). Platforms censor
/// inconsistently, so masked words are deleted rather than kept.
static CENSOR_MASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9]*\*+[a-z0-9*]*").unwrap());

/// Keywords re-appended to search queries when the qualifier-stripping
/// step removed them but the original text carried the capitalized
/// form. (keyword, needle-in-original)
const SEARCH_HINTS: [(&str, &str); 8] = [
    ("remix", "Remix"),
    ("deluxe", "Deluxe"),
    ("acoustic", "Acoustic"),
    ("demo", "Demo"),
    ("radio", "Radio"),
    ("edit", "Edit"),
    ("edition", "Edition"),
    ("ep", "EP"),
];

/// Normalize a title or name.
///
/// Lower-cases, truncates dashed/parenthesized/colon qualifier
/// suffixes, strips punctuation and censoring masks. With
/// `for_searching` set, whitespace-delimited qualifier keywords the
/// stripping removed are re-appended so the outbound query still
/// finds the right edition.
pub fn normalize(text: &str, for_searching: bool) -> String {
    let mut cleaned = text.to_lowercase();

    // Qualifier suffixes: " - Live at ...", "(Remix)", "Title: Deluxe"
    if let Some(i) = cleaned.find(" - ") {
        cleaned.truncate(i);
    }
    if let Some(i) = cleaned.find('(') {
        cleaned.truncate(i);
    }
    if let Some(i) = cleaned.find(':') {
        cleaned.truncate(i);
    }

    cleaned = cleaned
        .replace(['/', '\\', '"', '\'', ','], "")
        .replace(". ", " ")
        .replace(" & ", " ");

    cleaned = CENSOR_MASK.replace_all(&cleaned, "").to_string();
    cleaned = MULTI_SPACE.replace_all(cleaned.trim(), " ").to_string();

    if for_searching {
        for (keyword, needle) in SEARCH_HINTS {
            // "Edit" would also fire on "Edition"; the edition hint
            // covers that case on its own.
            if keyword == "edit" && text.contains("Edition") {
                continue;
            }
            if text.contains(needle) && !cleaned.split_whitespace().any(|w| w == keyword) {
                cleaned.push(' ');
                cleaned.push_str(keyword);
            }
        }
    }

    cleaned.trim().to_string()
}

/// Normalize an artist name. Secondary "& co-artist" clauses are a
/// common source of cross-platform divergence and are dropped before
/// the shared normalization pass.
pub fn normalize_artist(name: &str, for_searching: bool) -> String {
    let primary = name.split(" & ").next().unwrap_or(name);
    normalize(primary, for_searching)
}

/// Comparison normalization: `[a-z0-9 ]` only, lower-cased, single
/// spaced. Used strictly for equality checks, never for search.
/// Idempotent.
pub fn strip_to_alnum_lower(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    MULTI_SPACE.replace_all(kept.trim(), " ").to_string()
}
