use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use yume_sync_models::{IdMapping, ProgressSnapshot, SourceListEntry, WatchlistEntry};

use crate::error::SourceError;

/// One result returned by the target catalog's search capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub poster: Option<String>,
}

/// Detail record for one catalog entry, carrying its own remote ids.
///
/// The ids are what candidate verification cross-checks against; no
/// uniqueness is guaranteed on title match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnimeInfo {
    pub anilist_id: Option<u64>,
    pub mal_id: Option<u64>,
    pub title: Option<String>,
    pub poster: Option<String>,
}

/// Remote list service: the source catalog holding the user's list.
#[async_trait]
pub trait ListSource: Send + Sync {
    async fn viewer_id(&self, access_token: &str) -> Result<u64, SourceError>;

    /// The user's full list, flattened across named sub-lists. An
    /// authenticated-but-empty (or private) list is `Ok(vec![])`, not
    /// an error; callers disambiguate via `viewer_id`.
    async fn full_list(&self, access_token: &str) -> Result<Vec<SourceListEntry>, SourceError>;
}

/// Target catalog search/detail capability. Latency-bound and
/// unreliable; callers own retries and caching.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn search(&self, title: &str) -> Result<Vec<SearchHit>, SourceError>;
    async fn anime_info(&self, anime_id: &str) -> Result<AnimeInfo, SourceError>;
}

/// Per-user watchlist persistence, read and written as one collection.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, SourceError>;
    async fn store(&self, user_id: &str, entries: &[WatchlistEntry]) -> Result<(), SourceError>;
}

/// Durable shared identifier store, keyed by anime id, with secondary
/// lookups by remote id. First match wins when duplicates exist.
#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn get(&self, anime_id: &str) -> Result<Option<IdMapping>, SourceError>;
    async fn find_by_anilist(&self, anilist_id: u64) -> Result<Option<IdMapping>, SourceError>;
    async fn find_by_mal(&self, mal_id: u64) -> Result<Option<IdMapping>, SourceError>;
    async fn upsert(&self, mapping: &IdMapping) -> Result<(), SourceError>;
    async fn all(&self) -> Result<Vec<IdMapping>, SourceError>;
}

/// Destination for progress snapshots, polled externally. A failed
/// write is logged by the caller, never fatal to a run.
pub trait ProgressSink: Send + Sync {
    fn store(&self, user_id: &str, snapshot: &ProgressSnapshot) -> Result<(), SourceError>;
}
