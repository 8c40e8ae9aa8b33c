//!
//! src/fetch.rs
//!
//! Concrete catalog clients for Spotify and Apple Music: request
//! building, retry handling, and decoding of API payloads into the
//! shared entity model
//!

use async_trait::async_trait;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use reqwest::{header, redirect, Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tokio::{sync::RwLock, time::sleep};
use tracing::warn;
use url::Url;

use crate::catalog::CatalogClient;
use crate::config::{AppleMusicConfig, HttpConfig, RetryConfig, SpotifyConfig};
use crate::errors::TranslateError;
use crate::query::SearchQuery;
use crate::types::{
    Album, AlbumTrack, Artist, Entity, EntityKind, Isrc, Platform, Playlist, PlaylistEntry, Song,
    Upc,
};

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

fn client_with_headers(
    http: &HttpConfig,
    headers: header::HeaderMap,
) -> Result<Client, TranslateError> {
    client_helper(http)
        .default_headers(headers)
        .build()
        .map_err(|e| TranslateError::Http(format!("build client: {e}")))
}

fn base_client(http: &HttpConfig) -> Result<Client, TranslateError> {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    client_with_headers(http, h)
}

fn join(base: &Url, path: &str) -> Result<Url, TranslateError> {
    base.join(path)
        .map_err(|e| TranslateError::Config(format!("join {path}: {e}")))
}

/// Simple function to generate random wait for http_with_retry
fn generate_backoff(ms: u64, attempt: u8, rng: &mut SmallRng) -> Duration {
    let exp = (1_u64 << attempt.min(6)) * ms;
    let jitter = rng.gen_range(50..=200) as u64;
    Duration::from_millis(exp + jitter)
}

pub async fn http_with_retry(
    request: RequestBuilder,
    retry: &RetryConfig,
) -> Result<Value, TranslateError> {
    let mut rng = SmallRng::from_entropy();
    let mut attempt = 0_u8;
    loop {
        let response = request
            .try_clone()
            .ok_or_else(|| TranslateError::Http("non-cloneable request".to_string()))?
            .send()
            .await;
        match response {
            Ok(resp) => {
                if resp.status().is_success() {
                    let v = resp.json::<Value>().await?;
                    return Ok(v);
                }
                let status = resp.status();
                let retryable = status.as_u16() == 429 || status.is_server_error();
                if !retryable || attempt >= retry.max_attempts {
                    return Err(TranslateError::Http(format!("status {status}")));
                }
                let backoff =
                    generate_backoff(retry.base_backoff.as_millis() as u64, attempt, &mut rng);
                warn!(status = %status, backoff_ms = backoff.as_millis() as u64, "http.retry");
                sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt >= retry.max_attempts {
                    return Err(e.into());
                }
                let backoff =
                    generate_backoff(retry.base_backoff.as_millis() as u64, attempt, &mut rng);
                warn!(backoff_ms = backoff.as_millis() as u64, "http.retry.error");
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

fn string_at<'a>(v: &'a Value, field: &str) -> &'a str {
    v[field].as_str().unwrap_or_default()
}

fn required_id(v: &Value, context: &str) -> Result<String, TranslateError> {
    v["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TranslateError::Parse(format!("{context} missing id")))
}

// ============================================================
// Spotify
// ============================================================

pub struct SpotifyCatalog {
    http: Client,
    cfg: SpotifyConfig,
    retry: RetryConfig,
    token: RwLock<Option<String>>,
}

impl SpotifyCatalog {
    pub fn new(http_config: &HttpConfig, cfg: &SpotifyConfig) -> Result<Self, TranslateError> {
        let http = base_client(http_config)?;
        Ok(Self {
            http,
            cfg: cfg.clone(),
            retry: http_config.retry.clone(),
            token: RwLock::new(None),
        })
    }

    pub fn token_request(&self) -> RequestBuilder {
        self.http
            .post(self.cfg.token_url.clone())
            .basic_auth(&self.cfg.client_id, Some(&self.cfg.client_secret))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
    }

    /// Client-credentials bearer token, fetched once and cached.
    async fn bearer(&self) -> Result<String, TranslateError> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }
        let value = http_with_retry(self.token_request(), &self.retry).await?;
        let token = value["access_token"]
            .as_str()
            .ok_or_else(|| TranslateError::Parse("token response missing access_token".into()))?
            .to_string();
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// GET /v1/{tracks|albums|artists|playlists}/{id}
    fn resource(&self, segment: &str, id: &str, bearer: &str) -> Result<RequestBuilder, TranslateError> {
        let url = join(&self.cfg.api_base, &format!("{segment}/{id}"))?;
        Ok(self.http.get(url).bearer_auth(bearer))
    }

    /// GET /v1/search?type=...&q=...&limit=
    fn search_request(
        &self,
        q: &str,
        entity_type: &str,
        bearer: &str,
    ) -> Result<RequestBuilder, TranslateError> {
        let url = join(&self.cfg.api_base, "search")?;
        Ok(self.http.get(url).bearer_auth(bearer).query(&[
            ("type", entity_type),
            ("q", q),
            ("limit", &self.cfg.search_limit.to_string()),
        ]))
    }

    fn song_from_track(v: &Value) -> Result<Song, TranslateError> {
        Ok(Song {
            id: required_id(v, "spotify track")?,
            title: string_at(v, "name").to_string(),
            artists: v["artists"]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|x| x["name"].as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            album: v["album"]["name"].as_str().unwrap_or_default().to_string(),
            isrc: v["external_ids"]["isrc"].as_str().map(|s| Isrc(s.to_string())),
            explicit: v["explicit"].as_bool().unwrap_or(false),
            track_number: v["track_number"].as_u64().map(|n| n as u32),
            url: v["external_urls"]["spotify"].as_str().unwrap_or_default().to_string(),
            artwork_url: v["album"]["images"][0]["url"].as_str().map(str::to_string),
        })
    }

    fn album_from_value(v: &Value) -> Result<Album, TranslateError> {
        let tracks = v["tracks"]["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| {
                        Some(AlbumTrack {
                            id: t["id"].as_str()?.to_string(),
                            title: string_at(t, "name").to_string(),
                            explicit: t["explicit"].as_bool().unwrap_or(false),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(Album {
            id: required_id(v, "spotify album")?,
            title: string_at(v, "name").to_string(),
            artists: v["artists"]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|x| x["name"].as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            upc: v["external_ids"]["upc"].as_str().map(|s| Upc(s.to_string())),
            label: string_at(v, "label").to_string(),
            track_count: v["total_tracks"].as_u64().unwrap_or(0) as u32,
            tracks,
            url: v["external_urls"]["spotify"].as_str().unwrap_or_default().to_string(),
            artwork_url: v["images"][0]["url"].as_str().map(str::to_string),
        })
    }

    fn artist_from_value(v: &Value) -> Result<Artist, TranslateError> {
        Ok(Artist {
            id: required_id(v, "spotify artist")?,
            name: string_at(v, "name").to_string(),
            url: v["external_urls"]["spotify"].as_str().unwrap_or_default().to_string(),
            artwork_url: v["images"][0]["url"].as_str().map(str::to_string),
        })
    }

    fn entity_from_value(kind: EntityKind, v: &Value) -> Result<Entity, TranslateError> {
        match kind {
            EntityKind::Song => Ok(Entity::Song(Self::song_from_track(v)?)),
            EntityKind::Album => Ok(Entity::Album(Self::album_from_value(v)?)),
            EntityKind::Artist => Ok(Entity::Artist(Self::artist_from_value(v)?)),
        }
    }
}

#[async_trait]
impl CatalogClient for SpotifyCatalog {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    async fn fetch_by_id(&self, kind: EntityKind, id: &str) -> Result<Entity, TranslateError> {
        let bearer = self.bearer().await?;
        let segment = match kind {
            EntityKind::Song => "tracks",
            EntityKind::Album => "albums",
            EntityKind::Artist => "artists",
        };
        let value = http_with_retry(self.resource(segment, id, &bearer)?, &self.retry).await?;
        Self::entity_from_value(kind, &value)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Entity>, TranslateError> {
        let bearer = self.bearer().await?;
        let q = match &query.artist {
            Some(artist) => format!("{} artist:{}", query.term, artist),
            None => query.term.clone(),
        };
        let (entity_type, items_key) = match query.kind {
            EntityKind::Song => ("track", "tracks"),
            EntityKind::Album => ("album", "albums"),
            EntityKind::Artist => ("artist", "artists"),
        };
        let value =
            http_with_retry(self.search_request(&q, entity_type, &bearer)?, &self.retry).await?;
        let items = value[items_key]["items"].as_array().cloned().unwrap_or_default();
        // Malformed entries are dropped, not fatal; order is preserved
        Ok(items
            .iter()
            .filter_map(|v| Self::entity_from_value(query.kind, v).ok())
            .collect())
    }

    async fn fetch_playlist(&self, id: &str) -> Result<Playlist, TranslateError> {
        let bearer = self.bearer().await?;
        let value = http_with_retry(self.resource("playlists", id, &bearer)?, &self.retry).await?;
        let entries = value["tracks"]["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| Self::song_from_track(&item["track"]).ok())
                    .map(|song| PlaylistEntry { song, translation: None })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(Playlist {
            id: required_id(&value, "spotify playlist")?,
            name: string_at(&value, "name").to_string(),
            creator: value["owner"]["display_name"].as_str().unwrap_or_default().to_string(),
            platform: Platform::Spotify,
            original_url: value["external_urls"]["spotify"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            converted: false,
            entries,
        })
    }
}

// ============================================================
// Apple Music
// ============================================================

pub struct AppleMusicCatalog {
    http: Client,
    cfg: AppleMusicConfig,
    retry: RetryConfig,
}

impl AppleMusicCatalog {
    pub fn new(http_config: &HttpConfig, cfg: &AppleMusicConfig) -> Result<Self, TranslateError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", cfg.developer_token);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&bearer)
                .map_err(|e| TranslateError::Config(format!("invalid developer token: {e}")))?,
        );
        let http = client_with_headers(http_config, headers)?;
        Ok(Self {
            http,
            cfg: cfg.clone(),
            retry: http_config.retry.clone(),
        })
    }

    /// GET /v1/catalog/{storefront}/{songs|albums|artists|playlists}/{id}
    fn resource(&self, segment: &str, id: &str) -> Result<RequestBuilder, TranslateError> {
        let url = join(
            &self.cfg.api_base,
            &format!("catalog/{}/{segment}/{id}", self.cfg.storefront),
        )?;
        Ok(self.http.get(url))
    }

    /// GET /v1/catalog/{storefront}/search?term=...&types=...&limit=
    fn search_request(&self, term: &str, types: &str) -> Result<RequestBuilder, TranslateError> {
        let url = join(&self.cfg.api_base, &format!("catalog/{}/search", self.cfg.storefront))?;
        Ok(self.http.get(url).query(&[
            ("term", term),
            ("types", types),
            ("limit", &self.cfg.search_limit.to_string()),
        ]))
    }

    /// Artwork urls are templates with {w}/{h} placeholders.
    fn artwork(v: &Value) -> Option<String> {
        v["attributes"]["artwork"]["url"]
            .as_str()
            .map(|s| s.replace("{w}", "640").replace("{h}", "640"))
    }

    fn song_from_value(v: &Value) -> Result<Song, TranslateError> {
        let attr = &v["attributes"];
        Ok(Song {
            id: required_id(v, "apple song")?,
            title: string_at(attr, "name").to_string(),
            artists: vec![string_at(attr, "artistName").to_string()],
            album: string_at(attr, "albumName").to_string(),
            isrc: attr["isrc"].as_str().map(|s| Isrc(s.to_string())),
            explicit: attr["contentRating"].as_str() == Some("explicit"),
            track_number: attr["trackNumber"].as_u64().map(|n| n as u32),
            url: string_at(attr, "url").to_string(),
            artwork_url: Self::artwork(v),
        })
    }

    fn album_from_value(v: &Value) -> Result<Album, TranslateError> {
        let attr = &v["attributes"];
        let tracks = v["relationships"]["tracks"]["data"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| {
                        Some(AlbumTrack {
                            id: t["id"].as_str()?.to_string(),
                            title: string_at(&t["attributes"], "name").to_string(),
                            explicit: t["attributes"]["contentRating"].as_str()
                                == Some("explicit"),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(Album {
            id: required_id(v, "apple album")?,
            title: string_at(attr, "name").to_string(),
            artists: vec![string_at(attr, "artistName").to_string()],
            upc: attr["upc"].as_str().map(|s| Upc(s.to_string())),
            label: string_at(attr, "recordLabel").to_string(),
            track_count: attr["trackCount"].as_u64().unwrap_or(0) as u32,
            tracks,
            url: string_at(attr, "url").to_string(),
            artwork_url: Self::artwork(v),
        })
    }

    fn artist_from_value(v: &Value) -> Result<Artist, TranslateError> {
        let attr = &v["attributes"];
        Ok(Artist {
            id: required_id(v, "apple artist")?,
            name: string_at(attr, "name").to_string(),
            url: string_at(attr, "url").to_string(),
            artwork_url: Self::artwork(v),
        })
    }

    fn entity_from_value(kind: EntityKind, v: &Value) -> Result<Entity, TranslateError> {
        match kind {
            EntityKind::Song => Ok(Entity::Song(Self::song_from_value(v)?)),
            EntityKind::Album => Ok(Entity::Album(Self::album_from_value(v)?)),
            EntityKind::Artist => Ok(Entity::Artist(Self::artist_from_value(v)?)),
        }
    }

    fn first_data(value: &Value, context: &str) -> Result<Value, TranslateError> {
        value["data"]
            .as_array()
            .and_then(|d| d.first())
            .cloned()
            .ok_or_else(|| TranslateError::Parse(format!("{context}: empty data")))
    }
}

#[async_trait]
impl CatalogClient for AppleMusicCatalog {
    fn platform(&self) -> Platform {
        Platform::AppleMusic
    }

    async fn fetch_by_id(&self, kind: EntityKind, id: &str) -> Result<Entity, TranslateError> {
        let segment = match kind {
            EntityKind::Song => "songs",
            EntityKind::Album => "albums",
            EntityKind::Artist => "artists",
        };
        let value = http_with_retry(self.resource(segment, id)?, &self.retry).await?;
        let data = Self::first_data(&value, segment);
        Self::entity_from_value(kind, &data?)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Entity>, TranslateError> {
        // Apple search takes one free-text term; the narrow variant
        // folds the artist into it
        let term = match &query.artist {
            Some(artist) => format!("{} {}", query.term, artist),
            None => query.term.clone(),
        };
        let types = match query.kind {
            EntityKind::Song => "songs",
            EntityKind::Album => "albums",
            EntityKind::Artist => "artists",
        };
        let value = http_with_retry(self.search_request(&term, types)?, &self.retry).await?;
        let items = value["results"][types]["data"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        Ok(items
            .iter()
            .filter_map(|v| Self::entity_from_value(query.kind, v).ok())
            .collect())
    }

    async fn fetch_playlist(&self, id: &str) -> Result<Playlist, TranslateError> {
        let value = http_with_retry(self.resource("playlists", id)?, &self.retry).await?;
        let data = Self::first_data(&value, "playlists")?;
        let attr = &data["attributes"];
        let entries = data["relationships"]["tracks"]["data"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| Self::song_from_value(t).ok())
                    .map(|song| PlaylistEntry { song, translation: None })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(Playlist {
            id: required_id(&data, "apple playlist")?,
            name: string_at(attr, "name").to_string(),
            creator: string_at(attr, "curatorName").to_string(),
            platform: Platform::AppleMusic,
            original_url: string_at(attr, "url").to_string(),
            converted: false,
            entries,
        })
    }
}
