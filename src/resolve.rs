//!
//! src/resolve.rs
//!
//! Match resolver: scans an ordered candidate list against a
//! reference entity and classifies the best candidate. One generic
//! scan parameterized by per-entity-kind predicates, not three
//! copies.
//!

use crate::normalize::{normalize, strip_to_alnum_lower};
use crate::score::{comparison_distance, edit_distance};
use crate::types::{Album, Artist, Entity, MatchLevel, Song};

/// Per-entity predicate triple driving the generic scan.
pub trait MatchRules<T> {
    /// Strong corroboration; stops the scan immediately.
    fn exact(&self, candidate: &T, reference: &T) -> bool;
    /// Softer multi-field corroboration, used when no exact match
    /// exists anywhere in the list.
    fn close(&self, candidate: &T, reference: &T) -> bool;
    /// Field the close-match bookmark disambiguates on.
    fn comparison_key(&self, entity: &T) -> String;
}

/// Scan `candidates` in platform order.
///
/// The first candidate satisfying the exact predicate wins with
/// `Exact`. Otherwise the close-match bookmark holds the first close
/// candidate seen, replaced only by one with a strictly lower edit
/// distance on the comparison key. An empty list or a clean miss
/// returns `(None, MatchLevel::None)`, which tells the caller the
/// search was too narrow.
pub fn resolve<'a, T, R: MatchRules<T>>(
    candidates: &'a [T],
    reference: &T,
    rules: &R,
) -> (Option<&'a T>, MatchLevel) {
    if candidates.is_empty() {
        return (None, MatchLevel::None);
    }

    let reference_key = rules.comparison_key(reference);
    let mut close_index: Option<usize> = None;
    let mut close_distance = usize::MAX;

    for (i, candidate) in candidates.iter().enumerate() {
        if rules.exact(candidate, reference) {
            return (Some(candidate), MatchLevel::Exact);
        }
        if rules.close(candidate, reference) {
            let distance = edit_distance(&rules.comparison_key(candidate), &reference_key);
            if close_index.is_none() || distance < close_distance {
                close_index = Some(i);
                close_distance = distance;
            }
        }
    }

    match close_index {
        Some(i) => (Some(&candidates[i]), MatchLevel::Close),
        None => (None, MatchLevel::None),
    }
}

/// Rules for heterogeneous candidate lists as returned by a catalog
/// search. Kind-mismatched pairs never match.
pub struct EntityRules {
    /// Loosen the artist name normalization (set on the broad retry).
    pub vague: bool,
}

impl MatchRules<Entity> for EntityRules {
    fn exact(&self, candidate: &Entity, reference: &Entity) -> bool {
        match (candidate, reference) {
            (Entity::Song(c), Entity::Song(r)) => song_exact(c, r),
            (Entity::Album(c), Entity::Album(r)) => album_exact(c, r),
            (Entity::Artist(c), Entity::Artist(r)) => artist_exact(c, r, self.vague),
            _ => false,
        }
    }

    fn close(&self, candidate: &Entity, reference: &Entity) -> bool {
        match (candidate, reference) {
            (Entity::Song(c), Entity::Song(r)) => song_close(c, r),
            (Entity::Album(c), Entity::Album(r)) => album_close(c, r),
            // Artists fall through to the lowest-distance bookmark
            (Entity::Artist(_), Entity::Artist(_)) => true,
            _ => false,
        }
    }

    fn comparison_key(&self, entity: &Entity) -> String {
        match entity {
            Entity::Song(s) => strip_to_alnum_lower(&s.title),
            Entity::Album(a) => strip_to_alnum_lower(&a.title),
            Entity::Artist(a) => artist_key(&a.name, self.vague),
        }
    }
}

/// Industry-code agreement is the primary signal, but a code
/// collision with a wildly different album is a false positive.
fn song_exact(candidate: &Song, reference: &Song) -> bool {
    match (&candidate.isrc, &reference.isrc) {
        (Some(c), Some(r)) if c == r => {
            candidate.album == reference.album
                || comparison_distance(&candidate.album, &reference.album) == 0
        }
        _ => false,
    }
}

fn song_close(candidate: &Song, reference: &Song) -> bool {
    strip_to_alnum_lower(&candidate.title) == strip_to_alnum_lower(&reference.title)
        && strip_to_alnum_lower(&candidate.album) == strip_to_alnum_lower(&reference.album)
        && strip_to_alnum_lower(candidate.primary_artist())
            == strip_to_alnum_lower(reference.primary_artist())
}

fn album_exact(candidate: &Album, reference: &Album) -> bool {
    strip_to_alnum_lower(&candidate.title) == strip_to_alnum_lower(&reference.title)
        && candidate.track_count == reference.track_count
        && candidate.label == reference.label
}

fn album_close(candidate: &Album, reference: &Album) -> bool {
    (candidate.title == reference.title && candidate.track_count == reference.track_count)
        || (strip_to_alnum_lower(&candidate.title) == strip_to_alnum_lower(&reference.title)
            && candidate.label == reference.label)
}

fn artist_exact(candidate: &Artist, reference: &Artist, vague: bool) -> bool {
    edit_distance(
        &artist_key(&candidate.name, vague),
        &artist_key(&reference.name, vague),
    ) == 0
}

fn artist_key(name: &str, vague: bool) -> String {
    if vague {
        strip_to_alnum_lower(name)
    } else {
        normalize(name, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Isrc;

    fn song(id: &str, title: &str, artist: &str, album: &str, isrc: Option<&str>) -> Entity {
        Entity::Song(Song {
            id: id.into(),
            title: title.into(),
            artists: vec![artist.into()],
            album: album.into(),
            isrc: isrc.map(|s| Isrc(s.into())),
            explicit: false,
            track_number: None,
            url: format!("https://example.test/{id}"),
            artwork_url: None,
        })
    }

    fn artist(id: &str, name: &str) -> Entity {
        Entity::Artist(Artist {
            id: id.into(),
            name: name.into(),
            url: String::new(),
            artwork_url: None,
        })
    }

    fn album(id: &str, title: &str, label: &str, track_count: u32) -> Entity {
        Entity::Album(Album {
            id: id.into(),
            title: title.into(),
            artists: vec!["Ed Sheeran".into()],
            upc: None,
            label: label.into(),
            track_count,
            tracks: vec![],
            url: format!("https://example.test/album/{id}"),
            artwork_url: None,
        })
    }

    #[test]
    fn empty_candidate_list_is_none() {
        let reference = song("r", "Perfect", "Ed Sheeran", "÷", None);
        let rules = EntityRules { vague: false };
        let (best, level) = resolve::<Entity, _>(&[], &reference, &rules);
        assert!(best.is_none());
        assert_eq!(level, MatchLevel::None);
    }

    #[test]
    fn matching_isrc_and_album_is_exact() {
        let reference = song("r", "Shape of You", "Ed Sheeran", "÷ (Deluxe)", Some("USUM71703861"));
        let candidates = vec![
            song("c0", "Shape of You - Acoustic", "Ed Sheeran", "Other", Some("XX0000000000")),
            song("c1", "Shape of You", "Ed Sheeran", "÷ (Deluxe)", Some("USUM71703861")),
        ];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Exact);
        assert_eq!(best.unwrap().id(), "c1");
    }

    #[test]
    fn isrc_match_with_comparison_equal_album_is_exact() {
        // "÷ (Deluxe)" vs "/ (Deluxe)" normalize to the same comparison form
        let reference = song("r", "Shape of You", "Ed Sheeran", "÷ (Deluxe)", Some("USUM71703861"));
        let candidates =
            vec![song("c1", "Shape of You", "Ed Sheeran", "/ (Deluxe)", Some("USUM71703861"))];
        let rules = EntityRules { vague: false };
        let (_, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Exact);
    }

    #[test]
    fn agreeing_fields_without_isrc_are_close() {
        // ISRC disagrees, so the industry-code path is off the table,
        // but title/artist/album still corroborate under normalization
        let reference = song("r", "Shape of You", "Ed Sheeran", "Divide (Deluxe)", Some("USUM71703861"));
        let candidates =
            vec![song("c1", "Shape of You", "Ed Sheeran", "Divide (Deluxe)", Some("GBAHS1700024"))];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Close);
        assert_eq!(best.unwrap().id(), "c1");
    }

    #[test]
    fn clean_miss_is_none() {
        let reference = song("r", "Perfect", "Ed Sheeran", "÷", Some("USUM71703862"));
        let candidates = vec![song("c1", "Something Else", "Someone", "Other", None)];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert!(best.is_none());
        assert_eq!(level, MatchLevel::None);
    }

    #[test]
    fn exact_wins_over_earlier_close() {
        let reference = song("r", "Perfect", "Ed Sheeran", "÷", Some("USUM71703862"));
        let candidates = vec![
            song("c0", "Perfect", "Ed Sheeran", "÷", None),
            song("c1", "Perfect", "Ed Sheeran", "÷", Some("USUM71703862")),
        ];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Exact);
        assert_eq!(best.unwrap().id(), "c1");
    }

    #[test]
    fn close_bookmark_keeps_first_unless_strictly_better() {
        let reference = song("r", "Perfect", "Ed Sheeran", "÷", None);
        // Both candidates satisfy the close predicate with identical
        // comparison keys; the first stays bookmarked
        let candidates = vec![
            song("c0", "Perfect", "Ed Sheeran", "÷", None),
            song("c1", "Perfect", "Ed Sheeran", "÷", None),
        ];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Close);
        assert_eq!(best.unwrap().id(), "c0");
    }

    #[test]
    fn album_agreeing_on_title_count_and_label_is_exact() {
        // Titles differ only in punctuation, so the comparison forms
        // agree; track count and label corroborate
        let reference = album("r", "Red (Deluxe Edition)", "Big Machine Records", 22);
        let candidates = vec![
            album("c0", "Red", "Big Machine Records", 16),
            album("c1", "Red [Deluxe Edition]", "Big Machine Records", 22),
        ];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Exact);
        assert_eq!(best.unwrap().id(), "c1");
    }

    #[test]
    fn album_with_same_raw_title_and_track_count_is_close() {
        // Labels differ across pressings, so the exact bar fails; raw
        // title plus track count still corroborate
        let reference = album("r", "÷ (Deluxe)", "Atlantic Records UK", 16);
        let candidates = vec![album("c0", "÷ (Deluxe)", "Asylum Records", 16)];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Close);
        assert_eq!(best.unwrap().id(), "c0");
    }

    #[test]
    fn album_with_normalized_title_and_label_is_close() {
        // Raw titles differ in punctuation and the track counts
        // disagree, so only the normalized-title-plus-label arm fires
        let reference = album("r", "Red (Deluxe Edition)", "Big Machine Records", 22);
        let candidates = vec![album("c0", "Red [Deluxe Edition]", "Big Machine Records", 21)];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Close);
        assert_eq!(best.unwrap().id(), "c0");
    }

    #[test]
    fn album_clean_miss_is_none() {
        let reference = album("r", "÷ (Deluxe)", "Atlantic Records UK", 16);
        let candidates = vec![album("c0", "x (Deluxe)", "Asylum Records", 12)];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert!(best.is_none());
        assert_eq!(level, MatchLevel::None);
    }

    #[test]
    fn artist_resolution_picks_lowest_edit_distance() {
        let reference = artist("r", "Ed Sheeran");
        let candidates = vec![
            artist("c0", "Ed Sheeran Tribute Band"),
            artist("c1", "Ed Sheera"),
            artist("c2", "Someone Else"),
        ];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Close);
        assert_eq!(best.unwrap().id(), "c1");
    }

    #[test]
    fn artist_zero_distance_is_exact() {
        let reference = artist("r", "Ed Sheeran");
        let candidates = vec![artist("c0", "ed sheeran")];
        let rules = EntityRules { vague: false };
        let (_, level) = resolve(&candidates, &reference, &rules);
        assert_eq!(level, MatchLevel::Exact);
    }

    #[test]
    fn vague_artist_matching_ignores_punctuation() {
        let reference = artist("r", "AC/DC");
        let candidates = vec![artist("c0", "AC-DC")];
        let strict = EntityRules { vague: false };
        let vague = EntityRules { vague: true };
        // Strict: "acdc" vs "ac-dc" survive normalize() differently
        let (_, strict_level) = resolve(&candidates, &reference, &strict);
        let (_, vague_level) = resolve(&candidates, &reference, &vague);
        assert_eq!(vague_level, MatchLevel::Exact);
        assert!(strict_level <= vague_level);
    }

    #[test]
    fn resolution_is_deterministic() {
        let reference = song("r", "Perfect", "Ed Sheeran", "÷", None);
        let candidates = vec![
            song("c0", "Perfect", "Ed Sheeran", "÷", None),
            song("c1", "Perfect Duet", "Ed Sheeran", "÷", None),
        ];
        let rules = EntityRules { vague: false };
        let first = resolve(&candidates, &reference, &rules);
        for _ in 0..10 {
            let again = resolve(&candidates, &reference, &rules);
            assert_eq!(first.1, again.1);
            assert_eq!(first.0.map(Entity::id), again.0.map(Entity::id));
        }
    }

    #[test]
    fn kind_mismatch_never_matches() {
        let reference = song("r", "Perfect", "Ed Sheeran", "÷", None);
        let candidates = vec![artist("c0", "Perfect")];
        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);
        assert!(best.is_none());
        assert_eq!(level, MatchLevel::None);
    }
}
