//!
//! src/link.rs
//!
//! Detects the source platform of a shared music link and extracts
//! the catalog entity id and kind from it
//!

use url::Url;

use crate::types::{EntityKind, Platform};

/// Substring-match the host for a known platform. Unresolvable hosts
/// map to `Unknown`, which is terminal for downstream stages but not
/// an error by itself.
pub fn detect_platform(raw: &str) -> Platform {
    let parsed = match Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return Platform::Unknown,
    };
    match parsed.host_str() {
        Some(host) if host.contains("spotify") => Platform::Spotify,
        Some(host) if host.contains("apple") => Platform::AppleMusic,
        _ => Platform::Unknown,
    }
}

/// Extract the catalog entity id from a link.
///
/// Spotify encodes the id as the last path component; Apple Music as
/// the query value following the final `=`. Fails silently to an
/// empty string when the expected structure is absent — callers must
/// check non-emptiness before issuing a direct lookup.
pub fn extract_entity_id(raw: &str, platform: Platform) -> String {
    match platform {
        Platform::Spotify => {
            let parsed = match Url::parse(raw) {
                Ok(u) => u,
                Err(_) => return String::new(),
            };
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .unwrap_or_default()
                .to_string()
        }
        Platform::AppleMusic => raw
            .rfind('=')
            .map(|i| raw[i + 1..].to_string())
            .unwrap_or_default(),
        Platform::Unknown => String::new(),
    }
}

/// Classify the link as song, album or artist from its path shape.
pub fn entity_kind(raw: &str, platform: Platform) -> Option<EntityKind> {
    let parsed = Url::parse(raw).ok()?;
    let path = parsed.path();
    match platform {
        Platform::Spotify => {
            if path.contains("/track/") {
                Some(EntityKind::Song)
            } else if path.contains("/album/") {
                Some(EntityKind::Album)
            } else if path.contains("/artist/") {
                Some(EntityKind::Artist)
            } else {
                None
            }
        }
        Platform::AppleMusic => {
            // Song links are album links carrying an `i=` track query
            let has_track_query = parsed.query_pairs().any(|(k, _)| k == "i");
            if has_track_query || path.contains("/song/") {
                Some(EntityKind::Song)
            } else if path.contains("/artist/") {
                Some(EntityKind::Artist)
            } else if path.contains("/album/") {
                Some(EntityKind::Album)
            } else {
                None
            }
        }
        Platform::Unknown => None,
    }
}
