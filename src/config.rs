//!
//! src/config.rs
//!
//! Environment-driven configuration for the translator: platform
//! API credentials, http behavior, matching knobs, batch pacing
//! and logging
//!

use std::time;

use url::Url;

use crate::errors::TranslateError;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 8000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2000;
pub const HTTP_POOL_MAX_IDLE: usize = 16;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

pub const RETRY_MAX_ATTEMPTS: u8 = 3;
pub const RETRY_BASE_BACKOFF: u64 = 500;

pub const DEFAULT_SEARCH_LIMIT: u32 = 25;
pub const DEFAULT_DISPATCH_DELAY_MS: u64 = 100;

/// Wrapper over env::var to return an invalid environment var error
fn env_check(s: &str) -> Result<String, TranslateError> {
    match std::env::var(s) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(TranslateError::Config(format!("{s} was not set"))),
    }
}

fn env_to_uint(s: &str, default: u32) -> u32 {
    std::env::var(s)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_to_uint64(s: &str, default: u64) -> u64 {
    std::env::var(s)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Ensures that url is https
fn ensure_https(url: &Url) -> Result<(), String> {
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(format!("URL must be https: {url}"))
    }
}

fn ensure_host(url: &Url, expected_host: &str) -> Result<(), String> {
    match url.host_str() {
        Some(h) if h.eq_ignore_ascii_case(expected_host) => Ok(()),
        Some(h) => Err(format!(
            "Unexpected host for {url} (got {h}, expected {expected_host})"
        )),
        None => Err(format!("URL missing host: {url}")),
    }
}

fn parse_base(var: &str, default: &str, expected_host: &str) -> Result<Url, TranslateError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    let mut base = Url::parse(&raw)
        .map_err(|e| TranslateError::Config(format!("{var} invalid: {e}")))?;

    ensure_https(&base).map_err(TranslateError::Config)?;
    ensure_host(&base, expected_host).map_err(TranslateError::Config)?;

    if !base.path().ends_with('/') {
        let mut path = base.path().to_string();
        path.push('/');
        base.set_path(&path);
    }
    Ok(base)
}

/// Configuration that Spotify expects when hitting endpoints
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: Url,
    pub api_base: Url,
    pub search_limit: u32,
}

fn build_spotify() -> Result<SpotifyConfig, TranslateError> {
    let client_id = env_check("SPOTIFY_CLIENT_ID")?;
    let client_secret = env_check("SPOTIFY_CLIENT_SECRET")?;

    let token_url = std::env::var("SPOTIFY_TOKEN_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/api/token".to_string());
    let token_url = Url::parse(&token_url)
        .map_err(|e| TranslateError::Config(format!("SPOTIFY_TOKEN_URL invalid: {e}")))?;
    ensure_https(&token_url).map_err(TranslateError::Config)?;
    ensure_host(&token_url, "accounts.spotify.com").map_err(TranslateError::Config)?;

    let api_base = parse_base(
        "SPOTIFY_API_BASE",
        "https://api.spotify.com/v1/",
        "api.spotify.com",
    )?;

    let search_limit = env_to_uint("SPOTIFY_SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT);

    Ok(SpotifyConfig {
        client_id,
        client_secret,
        token_url,
        api_base,
        search_limit,
    })
}

/// Configuration for the Apple Music catalog api
#[derive(Debug, Clone)]
pub struct AppleMusicConfig {
    pub developer_token: String,
    pub api_base: Url,
    pub storefront: String,
    pub search_limit: u32,
}

fn build_apple_music() -> Result<AppleMusicConfig, TranslateError> {
    let developer_token = env_check("APPLE_MUSIC_DEVELOPER_TOKEN")?;

    let api_base = parse_base(
        "APPLE_MUSIC_API_BASE",
        "https://api.music.apple.com/v1/",
        "api.music.apple.com",
    )?;

    let storefront = std::env::var("APPLE_MUSIC_STOREFRONT").unwrap_or_else(|_| "us".to_string());
    let search_limit = env_to_uint("APPLE_MUSIC_SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT);

    Ok(AppleMusicConfig {
        developer_token,
        api_base,
        storefront,
        search_limit,
    })
}

/// Configuration for Http timeouts, retries, etc.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u8,
    pub base_backoff: time::Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_backoff: time::Duration::from_millis(RETRY_BASE_BACKOFF),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
            retry: RetryConfig::default(),
        }
    }
}

/// Configuration for the match resolver
#[derive(Debug, Clone, Copy)]
pub struct MatchingConfig {
    /// Loosen artist-name normalization on the broad retry.
    pub vague_on_broad: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { vague_on_broad: true }
    }
}

/// Configuration for playlist batch conversion
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Fixed delay before dispatching each per-track task. Politeness
    /// toward the catalog APIs, not a correctness requirement.
    pub dispatch_delay: time::Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            dispatch_delay: time::Duration::from_millis(DEFAULT_DISPATCH_DELAY_MS),
        }
    }
}

fn build_batch() -> BatchConfig {
    BatchConfig {
        dispatch_delay: time::Duration::from_millis(env_to_uint64(
            "BATCH_DISPATCH_DELAY_MS",
            DEFAULT_DISPATCH_DELAY_MS,
        )),
    }
}

/// Configuration for Logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "info,rs_translator=debug,reqwest=warn".to_string(),
            format: LogFormat::Pretty,
            with_ansi: true,
            include_file_line: true,
            include_target: true,
        }
    }
}

/// AppConfig which holds everything needed by the fetch and
/// translate modules
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub spotify: SpotifyConfig,
    pub apple_music: AppleMusicConfig,
    pub http: HttpConfig,
    pub matching: MatchingConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// Return all environment variables to caller at program start.
pub fn load_config() -> Result<AppConfig, TranslateError> {
    dotenvy::dotenv().ok();

    let spotify = build_spotify()?;
    let apple_music = build_apple_music()?;
    let http = HttpConfig::default();
    let matching = MatchingConfig::default();
    let batch = build_batch();
    let logging = LoggingConfig::default();

    Ok(AppConfig {
        spotify,
        apple_music,
        http,
        matching,
        batch,
        logging,
    })
}
