use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use yume_sync_models::IdMapping;
use yume_sync_sources::MappingStore;

use crate::id_cache::IdCache;
use crate::id_cache_storage::IdCacheStorage;

/// Statistics over the local identifier cache.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub with_anilist_id: usize,
    pub with_mal_id: usize,
    pub unresolved: usize,
    pub dirty: bool,
}

/// Two-tier identifier resolution service.
///
/// Combines the fast local flat file (authoritative for the remainder
/// of a run) with the durable shared store. The durable store is slow
/// relative to a run's entry volume, so the hot path is in-memory after
/// `preload`; durable writes are best-effort per call.
pub struct IdResolver {
    cache: IdCache,
    storage: IdCacheStorage,
    durable: Option<Arc<dyn MappingStore>>,
}

impl IdResolver {
    pub fn open(cache_id_dir: &Path, durable: Option<Arc<dyn MappingStore>>) -> Result<Self> {
        let storage = IdCacheStorage::new(cache_id_dir);
        let cache = if storage.cache_exists() {
            storage.load()?
        } else {
            IdCache::new()
        };
        Ok(Self {
            cache,
            storage,
            durable,
        })
    }

    /// In-memory lookup: AniList id first, MAL id fallback.
    pub fn lookup(&self, anilist_id: u64, mal_id: u64) -> Option<Arc<IdMapping>> {
        self.cache.lookup(anilist_id, mal_id)
    }

    /// Lookup with durable-store fallback. A durable hit is pulled into
    /// the local cache so the rest of the run sees it.
    pub async fn lookup_or_durable(&mut self, anilist_id: u64, mal_id: u64) -> Option<Arc<IdMapping>> {
        if let Some(mapping) = self.cache.lookup(anilist_id, mal_id) {
            return Some(mapping);
        }
        let durable = self.durable.as_ref()?;

        if anilist_id != 0 {
            match durable.find_by_anilist(anilist_id).await {
                Ok(Some(mapping)) => {
                    self.cache.insert(mapping.clone());
                    return self.cache.get(&mapping.anime_id);
                }
                Ok(None) => {}
                Err(e) => warn!("Durable store lookup by anilist_id {} failed: {}", anilist_id, e),
            }
        }
        if mal_id != 0 {
            match durable.find_by_mal(mal_id).await {
                Ok(Some(mapping)) => {
                    self.cache.insert(mapping.clone());
                    return self.cache.get(&mapping.anime_id);
                }
                Ok(None) => {}
                Err(e) => warn!("Durable store lookup by mal_id {} failed: {}", mal_id, e),
            }
        }
        None
    }

    /// Idempotent upsert of one mapping.
    ///
    /// The local cache is written synchronously so the very next lookup
    /// in the same run sees it; the durable write never fails the
    /// calling resolution.
    pub async fn save(&mut self, mapping: IdMapping) {
        self.cache.insert(mapping.clone());

        if let Some(durable) = &self.durable {
            if let Err(e) = durable.upsert(&mapping).await {
                warn!(
                    "Failed to write id mapping {} to durable store: {} (local cache still stands)",
                    mapping.anime_id, e
                );
            }
        }
    }

    /// Build full in-memory indexes once per run: local entries take
    /// precedence, durable entries fill the gaps. Returns
    /// (local entries, entries merged in from the durable store).
    pub async fn preload(&mut self) -> (usize, usize) {
        let local = self.cache.len();
        let mut merged = 0usize;

        if let Some(durable) = &self.durable {
            match durable.all().await {
                Ok(mappings) => {
                    for mapping in mappings {
                        if self.cache.get(&mapping.anime_id).is_none() {
                            self.cache.insert(mapping);
                            merged += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to preload from durable store: {} (continuing with local cache only)", e);
                }
            }
        }

        debug!("Preloaded id cache: {} local entries, {} from durable store", local, merged);
        (local, merged)
    }

    /// Administrative resync of the local file from the durable store.
    /// Not on the sync hot path.
    pub async fn download_from_durable(&mut self) -> Result<usize> {
        let durable = self
            .durable
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no durable store configured"))?;

        let mappings = durable
            .all()
            .await
            .map_err(|e| anyhow::anyhow!("durable store read failed: {}", e))?;
        let count = mappings.len();
        for mapping in mappings {
            self.cache.insert(mapping);
        }
        self.storage.save(&self.cache)?;
        self.cache.mark_clean();

        info!("Downloaded {} id mappings from durable store to local cache", count);
        Ok(count)
    }

    /// Flush the local flat file if anything changed this run.
    pub fn save_if_dirty(&mut self) -> Result<()> {
        if !self.cache.is_dirty() {
            return Ok(());
        }
        self.storage.save(&self.cache)?;
        self.cache.mark_clean();
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.cache.all_entries();
        CacheStats {
            entries: entries.len(),
            with_anilist_id: entries.iter().filter(|m| m.anilist_id != 0).count(),
            with_mal_id: entries.iter().filter(|m| m.mal_id != 0).count(),
            unresolved: entries.iter().filter(|m| m.is_unresolved()).count(),
            dirty: self.cache.is_dirty(),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryMappingStore;

    #[tokio::test]
    async fn save_then_lookup_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = IdResolver::open(dir.path(), None).unwrap();

        resolver.save(IdMapping::new("one-piece-100", 21, 21, "One Piece")).await;

        let hit = resolver.lookup(21, 0).unwrap();
        assert_eq!(hit.anime_id, "one-piece-100");
        let fallback = resolver.lookup(0, 21).unwrap();
        assert_eq!(fallback.anime_id, "one-piece-100");
    }

    #[tokio::test]
    async fn lookup_survives_preload_from_durable_store_alone() {
        let durable = Arc::new(MemoryMappingStore::default());
        durable
            .upsert(&IdMapping::new("frieren-18542", 154587, 52991, "Frieren"))
            .await
            .unwrap();

        // Fresh local cache, no flat file on disk
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = IdResolver::open(dir.path(), Some(durable)).unwrap();
        assert!(resolver.lookup(154587, 0).is_none());

        let (local, merged) = resolver.preload().await;
        assert_eq!(local, 0);
        assert_eq!(merged, 1);
        assert_eq!(resolver.lookup(154587, 0).unwrap().anime_id, "frieren-18542");
        assert_eq!(resolver.lookup(0, 52991).unwrap().anime_id, "frieren-18542");
    }

    #[tokio::test]
    async fn durable_hit_is_pulled_into_the_local_cache() {
        let durable = Arc::new(MemoryMappingStore::default());
        durable
            .upsert(&IdMapping::new("frieren-18542", 154587, 52991, "Frieren"))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = IdResolver::open(dir.path(), Some(durable)).unwrap();
        assert!(resolver.lookup(154587, 0).is_none());

        let hit = resolver.lookup_or_durable(154587, 0).await.unwrap();
        assert_eq!(hit.anime_id, "frieren-18542");

        // Now cached: plain in-memory lookup sees it, via either id
        assert_eq!(resolver.lookup(154587, 0).unwrap().anime_id, "frieren-18542");
        assert_eq!(resolver.lookup(0, 52991).unwrap().anime_id, "frieren-18542");
    }

    #[tokio::test]
    async fn durable_fallback_finds_by_mal_id_when_anilist_id_is_unknown() {
        let durable = Arc::new(MemoryMappingStore::default());
        durable
            .upsert(&IdMapping::new("bleach-806", 0, 269, "Bleach"))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = IdResolver::open(dir.path(), Some(durable)).unwrap();

        let hit = resolver.lookup_or_durable(999, 269).await.unwrap();
        assert_eq!(hit.anime_id, "bleach-806");
        assert!(resolver.lookup(0, 269).is_some());
    }

    #[tokio::test]
    async fn preload_prefers_local_entries_over_durable() {
        let durable = Arc::new(MemoryMappingStore::default());
        durable
            .upsert(&IdMapping::new("naruto-677", 20, 0, "stale title"))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = IdResolver::open(dir.path(), Some(durable)).unwrap();
        resolver.save(IdMapping::new("naruto-677", 20, 20, "Naruto")).await;

        resolver.preload().await;
        let mapping = resolver.lookup(20, 0).unwrap();
        assert_eq!(mapping.title, "Naruto");
        assert_eq!(mapping.mal_id, 20);
    }

    #[tokio::test]
    async fn durable_write_failure_does_not_fail_save() {
        let durable = Arc::new(MemoryMappingStore::failing());
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = IdResolver::open(dir.path(), Some(durable)).unwrap();

        resolver.save(IdMapping::new("a-1", 1, 0, "")).await;
        // Local cache is authoritative for the remainder of the run
        assert!(resolver.lookup(1, 0).is_some());
    }

    #[tokio::test]
    async fn download_from_durable_persists_locally() {
        let durable = Arc::new(MemoryMappingStore::default());
        durable.upsert(&IdMapping::new("a-1", 1, 0, "A")).await.unwrap();
        durable.upsert(&IdMapping::new("b-2", 2, 0, "B")).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        {
            let mut resolver = IdResolver::open(dir.path(), Some(durable.clone())).unwrap();
            assert_eq!(resolver.download_from_durable().await.unwrap(), 2);
        }

        // A fresh resolver sees the downloaded entries from the flat file
        let resolver = IdResolver::open(dir.path(), None).unwrap();
        assert_eq!(resolver.len(), 2);
        assert!(resolver.lookup(2, 0).is_some());
    }
}
