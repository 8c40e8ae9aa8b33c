//!
//! src/catalog.rs
//!
//! Boundary trait for platform catalog lookups. The resolver and
//! orchestrator consume already-decoded entities through this seam;
//! concrete HTTP clients live in fetch.rs and tests inject scripted
//! implementations.
//!

use async_trait::async_trait;

use crate::errors::TranslateError;
use crate::query::SearchQuery;
use crate::types::{Entity, EntityKind, Platform, Playlist};

#[async_trait]
pub trait CatalogClient: Send + Sync {
    fn platform(&self) -> Platform;

    /// Direct lookup of one entity by its catalog id.
    async fn fetch_by_id(&self, kind: EntityKind, id: &str) -> Result<Entity, TranslateError>;

    /// Catalog search. Returns candidates in platform order, which
    /// the resolver's tie-break rules depend on.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Entity>, TranslateError>;

    /// Playlist lookup for batch conversion input.
    async fn fetch_playlist(&self, id: &str) -> Result<Playlist, TranslateError>;
}
