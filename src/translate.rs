//!
//! src/translate.rs
//!
//! Translation orchestrator: sequences link parsing, source fetch,
//! narrow search, resolution, and the single broadened retry, then
//! assembles the final result
//!

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::CatalogClient;
use crate::config::MatchingConfig;
use crate::errors::TranslateError;
use crate::link;
use crate::query::build_search_query;
use crate::resolve::{resolve, EntityRules};
use crate::types::{Entity, MatchLevel, Platform, TranslationResult};

pub struct Translator {
    clients: Vec<Arc<dyn CatalogClient>>,
    matching: MatchingConfig,
}

impl Translator {
    pub fn new(clients: Vec<Arc<dyn CatalogClient>>, matching: MatchingConfig) -> Self {
        Self { clients, matching }
    }

    pub fn client_for(&self, platform: Platform) -> Option<Arc<dyn CatalogClient>> {
        self.clients
            .iter()
            .find(|c| c.platform() == platform)
            .cloned()
    }

    /// Translate one music link to its equivalent on the other
    /// platform.
    ///
    /// Pipeline: parse link → direct source lookup → narrow search on
    /// the target → resolve → at most one broad retry when the narrow
    /// search came back empty-handed. Search-stage transport failures
    /// degrade to "no candidates"; only the source fetch is terminal.
    pub async fn translate(&self, url: &str) -> Result<TranslationResult, TranslateError> {
        let platform = link::detect_platform(url);
        if platform == Platform::Unknown {
            return Err(TranslateError::UnsupportedPlatform(url.to_string()));
        }
        let kind = link::entity_kind(url, platform)
            .ok_or_else(|| TranslateError::BadLink(format!("unrecognized link shape: {url}")))?;
        let id = link::extract_entity_id(url, platform);
        if id.is_empty() {
            return Err(TranslateError::BadLink(format!("no entity id in link: {url}")));
        }

        let source = self
            .client_for(platform)
            .ok_or_else(|| TranslateError::Config(format!("no client for {}", platform.as_str())))?;
        let target = self
            .client_for(platform.other())
            .ok_or_else(|| {
                TranslateError::Config(format!("no client for {}", platform.other().as_str()))
            })?;

        info!(
            platform = platform.as_str(),
            kind = ?kind,
            id = %id,
            "translate.start"
        );

        // No translation is possible without the canonical source
        // entity, so this failure is terminal for the request
        let reference = source
            .fetch_by_id(kind, &id)
            .await
            .map_err(|e| TranslateError::SourceFetch(e.to_string()))?;
        debug!(
            kind = ?reference.kind(),
            title = reference.display_title(),
            "translate.source"
        );

        let narrow = build_search_query(&reference, false);
        let candidates = match target.search(&narrow).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "translate.search.narrow.failed");
                Vec::new()
            }
        };
        debug!(count = candidates.len(), "translate.search.narrow");

        let rules = EntityRules { vague: false };
        let (best, level) = resolve(&candidates, &reference, &rules);

        // A None outcome from the narrow attempt triggers exactly one
        // broad retry; the retry's outcome is final either way
        if best.is_none() && level == MatchLevel::None {
            let broad = build_search_query(&reference, true);
            let broad_candidates = match target.search(&broad).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "translate.search.broad.failed");
                    Vec::new()
                }
            };
            debug!(count = broad_candidates.len(), "translate.search.broad");

            let rules = EntityRules { vague: self.matching.vague_on_broad };
            let (best, level) = resolve(&broad_candidates, &reference, &rules);
            let best = best.cloned();
            return Ok(Self::assemble(broad_candidates, best, level));
        }

        let best = best.cloned();
        let result = Self::assemble(candidates, best, level);
        info!(
            confidence = ?result.confidence,
            translated = result.translated_url.is_some(),
            "translate.done"
        );
        Ok(result)
    }

    /// Package the chosen candidate, the remaining alternates from the
    /// attempt that produced it, and the resolver's classification.
    fn assemble(
        candidates: Vec<Entity>,
        best: Option<Entity>,
        level: MatchLevel,
    ) -> TranslationResult {
        let chosen_id = best.as_ref().map(|b| b.id().to_string());
        let alternates = candidates
            .into_iter()
            .filter(|c| Some(c.id()) != chosen_id.as_deref())
            .collect();
        let translated_url = best
            .as_ref()
            .map(|b| b.url().to_string())
            .filter(|u| !u.is_empty());
        TranslationResult {
            translated_url,
            best,
            alternates,
            confidence: level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    use crate::errors::TranslateError;
    use crate::query::SearchQuery;
    use crate::types::{EntityKind, Isrc, Playlist, Song};

    fn song(id: &str, title: &str, artist: &str, album: &str, isrc: &str, platform: &str) -> Song {
        Song {
            id: id.into(),
            title: title.into(),
            artists: vec![artist.into()],
            album: album.into(),
            isrc: Some(Isrc(isrc.into())),
            explicit: false,
            track_number: None,
            url: format!("https://{platform}/track/{id}"),
            artwork_url: None,
        }
    }

    /// Scripted catalog: a fixed entity returned by id lookups plus
    /// canned candidate lists for narrow and broad searches.
    struct ScriptedCatalog {
        platform: Platform,
        by_id: Option<Entity>,
        narrow: Vec<Entity>,
        broad: Vec<Entity>,
        narrow_calls: AtomicUsize,
        broad_calls: AtomicUsize,
        queries: Mutex<Vec<SearchQuery>>,
    }

    impl ScriptedCatalog {
        fn new(platform: Platform, by_id: Option<Entity>, narrow: Vec<Entity>, broad: Vec<Entity>) -> Self {
            Self {
                platform,
                by_id,
                narrow,
                broad,
                narrow_calls: AtomicUsize::new(0),
                broad_calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CatalogClient for ScriptedCatalog {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn fetch_by_id(&self, _kind: EntityKind, _id: &str) -> Result<Entity, TranslateError> {
            self.by_id
                .clone()
                .ok_or_else(|| TranslateError::Http("scripted miss".into()))
        }

        async fn search(&self, query: &SearchQuery) -> Result<Vec<Entity>, TranslateError> {
            self.queries.lock().await.push(query.clone());
            if query.broad {
                self.broad_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.broad.clone())
            } else {
                self.narrow_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.narrow.clone())
            }
        }

        async fn fetch_playlist(&self, _id: &str) -> Result<Playlist, TranslateError> {
            Err(TranslateError::Http("not scripted".into()))
        }
    }

    fn translator(source: ScriptedCatalog, target: ScriptedCatalog) -> Translator {
        Translator::new(
            vec![Arc::new(source), Arc::new(target)],
            MatchingConfig::default(),
        )
    }

    #[tokio::test]
    async fn unknown_host_is_unsupported() {
        let source = ScriptedCatalog::new(Platform::Spotify, None, vec![], vec![]);
        let target = ScriptedCatalog::new(Platform::AppleMusic, None, vec![], vec![]);
        let t = translator(source, target);
        let err = t.translate("https://example.com/track/abc").await.unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedPlatform(_)));
    }

    #[tokio::test]
    async fn source_fetch_failure_is_terminal() {
        let source = ScriptedCatalog::new(Platform::Spotify, None, vec![], vec![]);
        let target = ScriptedCatalog::new(Platform::AppleMusic, None, vec![], vec![]);
        let t = translator(source, target);
        let err = t
            .translate("https://open.spotify.com/track/abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::SourceFetch(_)));
    }

    #[tokio::test]
    async fn narrow_exact_match_translates_without_retry() {
        let reference = song("src", "Shape of You", "Ed Sheeran", "÷", "USUM71703861", "open.spotify.com");
        let hit = song("tgt", "Shape of You", "Ed Sheeran", "÷", "USUM71703861", "music.apple.com");
        let other = song("alt", "Shape of You", "Cover Band", "Covers", "XX0000000000", "music.apple.com");

        let source = ScriptedCatalog::new(
            Platform::Spotify,
            Some(Entity::Song(reference)),
            vec![],
            vec![],
        );
        let target = ScriptedCatalog::new(
            Platform::AppleMusic,
            None,
            vec![Entity::Song(other), Entity::Song(hit)],
            vec![],
        );
        let t = translator(source, target);

        let result = t
            .translate("https://open.spotify.com/track/src")
            .await
            .unwrap();
        assert_eq!(result.confidence, MatchLevel::Exact);
        assert_eq!(
            result.translated_url.as_deref(),
            Some("https://music.apple.com/track/tgt")
        );
        // alternates exclude the chosen candidate
        assert_eq!(result.alternates.len(), 1);
        assert_eq!(result.alternates[0].id(), "alt");
    }

    #[tokio::test]
    async fn empty_narrow_search_broadens_exactly_once() {
        // Zero narrow candidates, zero broad candidates: exactly two
        // searches total and a None outcome, never a third attempt
        let reference = song("src", "Perfect", "Ed Sheeran", "÷", "USUM71703862", "open.spotify.com");
        let source = ScriptedCatalog::new(
            Platform::Spotify,
            Some(Entity::Song(reference)),
            vec![],
            vec![],
        );
        let target = Arc::new(ScriptedCatalog::new(Platform::AppleMusic, None, vec![], vec![]));
        let t = Translator::new(
            vec![
                Arc::new(source),
                target.clone() as Arc<dyn CatalogClient>,
            ],
            MatchingConfig::default(),
        );

        let result = t
            .translate("https://open.spotify.com/track/src")
            .await
            .unwrap();
        assert_eq!(result.confidence, MatchLevel::None);
        assert!(result.translated_url.is_none());
        assert!(result.best.is_none());
        assert_eq!(target.narrow_calls.load(Ordering::SeqCst), 1);
        assert_eq!(target.broad_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn broad_retry_outcome_is_final() {
        let reference = song("src", "Perfect", "Ed Sheeran", "÷", "USUM71703862", "open.spotify.com");
        let broad_hit = song("tgt", "Perfect", "Ed Sheeran", "÷", "USUM71703862", "music.apple.com");
        let source = ScriptedCatalog::new(
            Platform::Spotify,
            Some(Entity::Song(reference)),
            vec![],
            vec![],
        );
        let target = Arc::new(ScriptedCatalog::new(
            Platform::AppleMusic,
            None,
            vec![],
            vec![Entity::Song(broad_hit)],
        ));
        let t = Translator::new(
            vec![
                Arc::new(source),
                target.clone() as Arc<dyn CatalogClient>,
            ],
            MatchingConfig::default(),
        );

        let result = t
            .translate("https://open.spotify.com/track/src")
            .await
            .unwrap();
        assert_eq!(result.confidence, MatchLevel::Exact);
        assert_eq!(target.broad_calls.load(Ordering::SeqCst), 1);

        // The broad query drops the artist filter
        let queries = target.queries.lock().await;
        assert_eq!(queries.len(), 2);
        assert!(queries[0].artist.is_some());
        assert!(queries[1].artist.is_none());
    }

    #[tokio::test]
    async fn no_match_on_narrow_also_triggers_the_single_broad_retry() {
        // A narrow scan where no candidate clears the close bar is
        // still a None signal, so one broad retry happens and its
        // outcome is final
        let reference = song("src", "Perfect", "Ed Sheeran", "÷", "USUM71703862", "open.spotify.com");
        let miss = song("m1", "Something Else", "Someone", "Other", "ZZ9999999999", "music.apple.com");
        let source = ScriptedCatalog::new(
            Platform::Spotify,
            Some(Entity::Song(reference)),
            vec![],
            vec![],
        );
        let target = Arc::new(ScriptedCatalog::new(
            Platform::AppleMusic,
            None,
            vec![Entity::Song(miss.clone())],
            vec![Entity::Song(miss)],
        ));
        let t = Translator::new(
            vec![
                Arc::new(source),
                target.clone() as Arc<dyn CatalogClient>,
            ],
            MatchingConfig::default(),
        );

        let result = t
            .translate("https://open.spotify.com/track/src")
            .await
            .unwrap();
        assert_eq!(result.confidence, MatchLevel::None);
        // alternates come from the attempt that produced the outcome
        assert_eq!(result.alternates.len(), 1);
        assert_eq!(result.alternates[0].id(), "m1");
        assert_eq!(target.broad_calls.load(Ordering::SeqCst), 1);
    }
}
