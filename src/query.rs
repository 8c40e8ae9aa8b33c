//!
//! src/query.rs
//!
//! Turns a known source entity into platform-agnostic search
//! parameters, in narrow (title + artist) and broad (title only)
//! variants
//!

use crate::normalize::{normalize, normalize_artist};
use crate::types::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub kind: EntityKind,
    /// Normalized title or name, search variant.
    pub term: String,
    /// Normalized primary artist. Absent on broad queries, which
    /// trade specificity for recall when artist metadata diverges.
    pub artist: Option<String>,
    pub broad: bool,
    /// For albums: the id of the one explicit track (else the first),
    /// carried so a caller can re-locate the exact edition when
    /// multiple pressings exist. The concrete catalog clients do not
    /// consume it yet; edition disambiguation currently rests on the
    /// resolver's track-count and label checks.
    pub key_song_id: Option<String>,
}

pub fn build_search_query(reference: &Entity, broad: bool) -> SearchQuery {
    match reference {
        Entity::Song(song) => SearchQuery {
            kind: EntityKind::Song,
            term: normalize(&song.title, true),
            artist: artist_term(song.primary_artist(), broad),
            broad,
            key_song_id: None,
        },
        Entity::Album(album) => {
            let key_song = album
                .tracks
                .iter()
                .find(|t| t.explicit)
                .or_else(|| album.tracks.first());
            SearchQuery {
                kind: EntityKind::Album,
                term: normalize(&album.title, true),
                artist: artist_term(album.primary_artist(), broad),
                broad,
                key_song_id: key_song.map(|t| t.id.clone()),
            }
        }
        Entity::Artist(artist) => SearchQuery {
            kind: EntityKind::Artist,
            term: normalize_artist(&artist.name, true),
            artist: None,
            broad,
            key_song_id: None,
        },
    }
}

fn artist_term(primary: &str, broad: bool) -> Option<String> {
    if broad || primary.is_empty() {
        None
    } else {
        Some(normalize_artist(primary, true))
    }
}
