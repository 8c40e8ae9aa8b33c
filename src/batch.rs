//!
//! src/batch.rs
//!
//! Playlist batch conversion: one concurrent translation task per
//! track, paced by a fixed dispatch delay, with a shared progress
//! counter for the caller to observe
//!

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::errors::TranslateError;
use crate::translate::Translator;
use crate::types::{MatchLevel, Platform, Playlist, TranslationResult};

/// Per-batch counter, incremented once per completed per-track
/// attempt (success or failure). Purely an observability side-channel;
/// it owns no playlist data.
#[derive(Debug, Default)]
pub struct ProgressCounter(AtomicUsize);

impl ProgressCounter {
    pub fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn value(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BatchConverter {
    translator: Arc<Translator>,
    dispatch_delay: Duration,
}

impl BatchConverter {
    pub fn new(translator: Arc<Translator>, dispatch_delay: Duration) -> Self {
        Self {
            translator,
            dispatch_delay,
        }
    }

    /// Fetch a playlist by platform + id, then convert it.
    pub async fn convert_by_id(
        &self,
        platform: Platform,
        playlist_id: &str,
        progress: &Arc<ProgressCounter>,
    ) -> Result<Playlist, TranslateError> {
        let client = self.translator.client_for(platform).ok_or_else(|| {
            TranslateError::Config(format!("no client for {}", platform.as_str()))
        })?;
        let mut playlist = client.fetch_playlist(playlist_id).await?;
        self.convert(&mut playlist, progress).await;
        Ok(playlist)
    }

    /// Translate every track of the playlist concurrently.
    ///
    /// Each task runs its own sequential pipeline and reports back
    /// with its entry index, so no two results contend for the same
    /// slot. A per-track failure leaves that entry untranslated with
    /// confidence None and never aborts the batch. The `converted`
    /// flag flips once, after all tracks were attempted, if at least
    /// one translation succeeded.
    pub async fn convert(&self, playlist: &mut Playlist, progress: &Arc<ProgressCounter>) {
        info!(
            playlist = %playlist.id,
            tracks = playlist.entries.len(),
            "batch.start"
        );

        let mut handles = Vec::with_capacity(playlist.entries.len());
        for (index, entry) in playlist.entries.iter().enumerate() {
            // Politeness pacing toward the catalog APIs
            sleep(self.dispatch_delay).await;

            let url = entry.song.url.clone();
            let translator = self.translator.clone();
            let progress = progress.clone();
            handles.push(tokio::spawn(async move {
                let outcome = match translator.translate(&url).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(index, error = %e, "batch.track.failed");
                        TranslationResult::none()
                    }
                };
                progress.increment();
                (index, outcome)
            }));
        }

        let mut any_translated = false;
        for handle in handles {
            match handle.await {
                Ok((index, outcome)) => {
                    if outcome.confidence > MatchLevel::None {
                        any_translated = true;
                    }
                    playlist.entries[index].translation = Some(outcome);
                }
                Err(e) => {
                    warn!(error = %e, "batch.task.join.failed");
                }
            }
        }

        if any_translated {
            playlist.converted = true;
        }
        info!(
            playlist = %playlist.id,
            completed = progress.value(),
            converted = playlist.converted,
            "batch.done"
        );
    }
}
