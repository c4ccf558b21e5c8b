//! In-memory collaborator implementations shared across unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use yume_sync_models::{IdMapping, ProgressSnapshot, SourceListEntry, WatchlistEntry};
use yume_sync_sources::{
    AnimeInfo, CatalogProvider, ListSource, MappingStore, ProgressSink, SearchHit, SourceError,
    WatchlistStore,
};

use crate::resolver::normalize_title;

#[derive(Default)]
pub(crate) struct MockListSource {
    entries: Vec<SourceListEntry>,
    list_error: Option<SourceError>,
    viewer_fails: bool,
}

impl MockListSource {
    pub fn with_entries(entries: Vec<SourceListEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            list_error: Some(error),
            ..Self::default()
        }
    }

    pub fn with_viewer_error(mut self) -> Self {
        self.viewer_fails = true;
        self
    }
}

#[async_trait]
impl ListSource for MockListSource {
    async fn viewer_id(&self, _token: &str) -> Result<u64, SourceError> {
        if self.viewer_fails {
            Err(SourceError::Transport("connection refused".into()))
        } else {
            Ok(7)
        }
    }

    async fn full_list(&self, _token: &str) -> Result<Vec<SourceListEntry>, SourceError> {
        match &self.list_error {
            Some(SourceError::Status(code)) => Err(SourceError::Status(*code)),
            Some(e) => Err(SourceError::Transport(e.to_string())),
            None => Ok(self.entries.clone()),
        }
    }
}

/// Scriptable catalog keyed by normalized search title and anime id.
#[derive(Default)]
pub(crate) struct MockCatalog {
    searches: Mutex<HashMap<String, Vec<SearchHit>>>,
    search_errors: Mutex<HashMap<String, ()>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    infos: Mutex<HashMap<String, AnimeInfo>>,
    search_calls: AtomicUsize,
    info_calls: AtomicUsize,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(self, normalized_title: &str, hits: Vec<SearchHit>) -> Self {
        if let Ok(mut searches) = self.searches.lock() {
            searches.insert(normalized_title.to_string(), hits);
        }
        self
    }

    pub fn with_search_error(self, normalized_title: &str) -> Self {
        if let Ok(mut errors) = self.search_errors.lock() {
            errors.insert(normalized_title.to_string(), ());
        }
        self
    }

    pub fn with_search_delay(self, normalized_title: &str, delay: Duration) -> Self {
        if let Ok(mut delays) = self.search_delays.lock() {
            delays.insert(normalized_title.to_string(), delay);
        }
        self
    }

    pub fn with_info(self, anime_id: &str, info: AnimeInfo) -> Self {
        if let Ok(mut infos) = self.infos.lock() {
            infos.insert(anime_id.to_string(), info);
        }
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for MockCatalog {
    async fn search(&self, title: &str) -> Result<Vec<SearchHit>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let key = normalize_title(title);

        let delay = self
            .search_delays
            .lock()
            .ok()
            .and_then(|delays| delays.get(&key).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self
            .search_errors
            .lock()
            .map(|errors| errors.contains_key(&key))
            .unwrap_or(false)
        {
            return Err(SourceError::Status(503));
        }
        Ok(self
            .searches
            .lock()
            .ok()
            .and_then(|searches| searches.get(&key).cloned())
            .unwrap_or_default())
    }

    async fn anime_info(&self, anime_id: &str) -> Result<AnimeInfo, SourceError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.infos
            .lock()
            .ok()
            .and_then(|infos| infos.get(anime_id).cloned())
            .ok_or_else(|| SourceError::Status(404))
    }
}

#[derive(Default)]
pub(crate) struct MemoryWatchlist {
    lists: Mutex<HashMap<String, Vec<WatchlistEntry>>>,
}

impl MemoryWatchlist {
    pub fn seed(&self, user_id: &str, entries: Vec<WatchlistEntry>) {
        if let Ok(mut lists) = self.lists.lock() {
            lists.insert(user_id.to_string(), entries);
        }
    }

    pub fn entries(&self, user_id: &str) -> Vec<WatchlistEntry> {
        self.lists
            .lock()
            .ok()
            .and_then(|lists| lists.get(user_id).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WatchlistStore for MemoryWatchlist {
    async fn load(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, SourceError> {
        Ok(self.entries(user_id))
    }

    async fn store(&self, user_id: &str, entries: &[WatchlistEntry]) -> Result<(), SourceError> {
        self.seed(user_id, entries.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryMappingStore {
    mappings: Mutex<HashMap<String, IdMapping>>,
    fail_writes: bool,
    fail_bulk_reads: bool,
}

impl MemoryMappingStore {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Per-id finds work, `all()` errors. Models a store that rejects
    /// full scans.
    pub fn find_only() -> Self {
        Self {
            fail_bulk_reads: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MappingStore for MemoryMappingStore {
    async fn get(&self, anime_id: &str) -> Result<Option<IdMapping>, SourceError> {
        Ok(self
            .mappings
            .lock()
            .ok()
            .and_then(|mappings| mappings.get(anime_id).cloned()))
    }

    async fn find_by_anilist(&self, anilist_id: u64) -> Result<Option<IdMapping>, SourceError> {
        Ok(self.mappings.lock().ok().and_then(|mappings| {
            mappings
                .values()
                .find(|m| m.anilist_id == anilist_id)
                .cloned()
        }))
    }

    async fn find_by_mal(&self, mal_id: u64) -> Result<Option<IdMapping>, SourceError> {
        Ok(self
            .mappings
            .lock()
            .ok()
            .and_then(|mappings| mappings.values().find(|m| m.mal_id == mal_id).cloned()))
    }

    async fn upsert(&self, mapping: &IdMapping) -> Result<(), SourceError> {
        if self.fail_writes {
            return Err(SourceError::Store("write refused".into()));
        }
        if let Ok(mut mappings) = self.mappings.lock() {
            mappings.insert(mapping.anime_id.clone(), mapping.clone());
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<IdMapping>, SourceError> {
        if self.fail_bulk_reads {
            return Err(SourceError::Store("bulk read refused".into()));
        }
        Ok(self
            .mappings
            .lock()
            .map(|mappings| mappings.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    stored: Mutex<Vec<ProgressSnapshot>>,
}

impl RecordingSink {
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.stored.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingSink {
    fn store(&self, _user_id: &str, snapshot: &ProgressSnapshot) -> Result<(), SourceError> {
        if let Ok(mut stored) = self.stored.lock() {
            stored.push(snapshot.clone());
        }
        Ok(())
    }
}
