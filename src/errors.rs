//!
//! src/errors.rs
//!
//! Defines enums and methods of error conversion
//! for errors the translator uses
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("bad link: {0}")]
    BadLink(String),
    #[error("source fetch failed: {0}")]
    SourceFetch(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        TranslateError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(e: serde_json::Error) -> Self {
        TranslateError::Parse(e.to_string())
    }
}
