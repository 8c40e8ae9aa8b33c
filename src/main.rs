//!
//! src/main.rs
//!
//! CLI entrypoint: translate a single music reference URL between
//! streaming platforms, or convert a whole playlist track by track
//!

mod batch;
mod catalog;
mod config;
mod errors;
mod fetch;
mod link;
mod logging;
mod normalize;
mod query;
mod resolve;
mod score;
mod translate;
mod types;

use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::batch::{BatchConverter, ProgressCounter};
use crate::catalog::CatalogClient;
use crate::errors::TranslateError;
use crate::translate::Translator;
use crate::types::Platform;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlatformArg {
    Spotify,
    Apple,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Spotify => Platform::Spotify,
            PlatformArg::Apple => Platform::AppleMusic,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "rs-translator", version, about = "Translate song, album and artist links between Spotify and Apple Music")]
struct Cli {
    /// Link to a song, album or artist to translate
    url: Option<String>,

    /// Convert every track of the given playlist id instead
    #[arg(long, conflicts_with = "url")]
    playlist: Option<String>,

    /// Platform hosting the playlist
    #[arg(long, value_enum, requires = "playlist")]
    platform: Option<PlatformArg>,
}

#[tokio::main]
async fn main() -> Result<(), TranslateError> {
    let cli = Cli::parse();
    let cfgs = config::load_config()?;
    let _guard = logging::init_logging(&cfgs.logging)?;

    tracing::info!(
        service = "rs-translator",
        version = %env!("CARGO_PKG_VERSION"),
        "starting"
    );

    let spotify = fetch::SpotifyCatalog::new(&cfgs.http, &cfgs.spotify)?;
    let apple = fetch::AppleMusicCatalog::new(&cfgs.http, &cfgs.apple_music)?;

    let clients: Vec<Arc<dyn CatalogClient>> = vec![Arc::new(spotify), Arc::new(apple)];
    let translator = Arc::new(Translator::new(clients, cfgs.matching));

    match (cli.url, cli.playlist) {
        (Some(url), _) => {
            let result = translator.translate(&url).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        (None, Some(playlist_id)) => {
            let platform: Platform = cli
                .platform
                .map(Into::into)
                .ok_or_else(|| TranslateError::Config("--platform is required with --playlist".to_string()))?;

            let converter = BatchConverter::new(translator, cfgs.batch.dispatch_delay);
            let progress = Arc::new(ProgressCounter::new());
            let playlist = converter
                .convert_by_id(platform, &playlist_id, &progress)
                .await?;

            tracing::info!(
                playlist = %playlist.id,
                completed = progress.value(),
                converted = playlist.converted,
                "playlist conversion finished"
            );
            println!("{}", serde_json::to_string_pretty(&playlist)?);
        }
        (None, None) => {
            return Err(TranslateError::Config(
                "pass a URL to translate or --playlist with --platform".to_string(),
            ));
        }
    }

    Ok(())
}
