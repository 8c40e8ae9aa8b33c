//!
//! src/types.rs
//!
//! Shared entity model: platforms, match levels, songs, albums,
//! artists, playlists and per-translation results
//!

use serde::{Deserialize, Serialize};

// International standard recording code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Isrc(pub String);

// Universal product code, the album-level analogue of an ISRC
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Upc(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Unknown,
    Spotify,
    AppleMusic,
}

impl Platform {
    /// The translation target for a given source platform.
    pub fn other(self) -> Platform {
        match self {
            Platform::Spotify => Platform::AppleMusic,
            Platform::AppleMusic => Platform::Spotify,
            Platform::Unknown => Platform::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Unknown => "unknown",
            Platform::Spotify => "spotify",
            Platform::AppleMusic => "apple_music",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Song,
    Album,
    Artist,
}

/// Resolver classification, totally ordered by confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    None,
    Close,
    Exact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub isrc: Option<Isrc>,
    pub explicit: bool,
    pub track_number: Option<u32>,
    pub url: String,
    pub artwork_url: Option<String>,
}

impl Song {
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("")
    }
}

/// Track listing entry inside an album payload. Only what the query
/// builder needs to pick a key song (explicit pressing detection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumTrack {
    pub id: String,
    pub title: String,
    pub explicit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub upc: Option<Upc>,
    pub label: String,
    pub track_count: u32,
    pub tracks: Vec<AlbumTrack>,
    pub url: String,
    pub artwork_url: Option<String>,
}

impl Album {
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub url: String,
    pub artwork_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Song(Song),
    Album(Album),
    Artist(Artist),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Song(_) => EntityKind::Song,
            Entity::Album(_) => EntityKind::Album,
            Entity::Artist(_) => EntityKind::Artist,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Song(s) => &s.id,
            Entity::Album(a) => &a.id,
            Entity::Artist(a) => &a.id,
        }
    }

    /// Title for songs and albums, name for artists.
    pub fn display_title(&self) -> &str {
        match self {
            Entity::Song(s) => &s.title,
            Entity::Album(a) => &a.title,
            Entity::Artist(a) => &a.name,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Entity::Song(s) => &s.url,
            Entity::Album(a) => &a.url,
            Entity::Artist(a) => &a.url,
        }
    }
}

/// Outcome of a single translation request. Kept out-of-band from the
/// immutable entity records and joined by playlist index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_url: Option<String>,
    pub best: Option<Entity>,
    pub alternates: Vec<Entity>,
    pub confidence: MatchLevel,
}

impl TranslationResult {
    /// The "no equivalent found" outcome.
    pub fn none() -> Self {
        Self {
            translated_url: None,
            best: None,
            alternates: Vec::new(),
            confidence: MatchLevel::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub song: Song,
    pub translation: Option<TranslationResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub creator: String,
    pub platform: Platform,
    pub original_url: String,
    pub converted: bool,
    pub entries: Vec<PlaylistEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_level_ordering() {
        assert!(MatchLevel::None < MatchLevel::Close);
        assert!(MatchLevel::Close < MatchLevel::Exact);
    }

    #[test]
    fn platform_other_is_an_involution() {
        assert_eq!(Platform::Spotify.other(), Platform::AppleMusic);
        assert_eq!(Platform::AppleMusic.other(), Platform::Spotify);
        assert_eq!(Platform::Unknown.other(), Platform::Unknown);
    }
}
