use std::collections::HashMap;
use std::sync::Arc;
use yume_sync_models::IdMapping;

/// In-memory identifier cache with a multi-index structure.
///
/// O(1) lookups by anime id, AniList id, or MAL id without duplicating
/// entries: all indices point at the same `Arc<IdMapping>`. The anime id
/// is the primary key; remote-id indices tolerate duplicate mappings
/// (the last insert wins in the index, first match wins on lookup).
pub struct IdCache {
    by_anime: HashMap<String, Arc<IdMapping>>,
    by_anilist: HashMap<u64, Arc<IdMapping>>,
    by_mal: HashMap<u64, Arc<IdMapping>>,

    /// Track dirty state for incremental saves
    dirty: bool,
}

impl IdCache {
    pub fn new() -> Self {
        Self {
            by_anime: HashMap::new(),
            by_anilist: HashMap::new(),
            by_mal: HashMap::new(),
            dirty: false,
        }
    }

    /// Insert or update a mapping, merging with any existing entry for
    /// the same anime id. A known non-zero remote id is never replaced
    /// with zero (merge semantics live on `IdMapping`).
    pub fn insert(&mut self, mapping: IdMapping) {
        let canonical = if let Some(existing) = self.by_anime.get(&mapping.anime_id) {
            let mut merged = (**existing).clone();
            merged.merge(&mapping);
            Arc::new(merged)
        } else {
            Arc::new(mapping)
        };

        if canonical.anilist_id != 0 {
            self.by_anilist.insert(canonical.anilist_id, canonical.clone());
        }
        if canonical.mal_id != 0 {
            self.by_mal.insert(canonical.mal_id, canonical.clone());
        }
        self.by_anime.insert(canonical.anime_id.clone(), canonical);

        self.dirty = true;
    }

    pub fn get(&self, anime_id: &str) -> Option<Arc<IdMapping>> {
        self.by_anime.get(anime_id).cloned()
    }

    /// Find a mapping by remote ids. The AniList id takes priority; the
    /// MAL id is only consulted when the AniList id is zero or unknown.
    pub fn lookup(&self, anilist_id: u64, mal_id: u64) -> Option<Arc<IdMapping>> {
        if anilist_id != 0 {
            if let Some(mapping) = self.by_anilist.get(&anilist_id) {
                return Some(mapping.clone());
            }
        }
        if mal_id != 0 {
            if let Some(mapping) = self.by_mal.get(&mal_id) {
                return Some(mapping.clone());
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.by_anime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_anime.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Get all entries as a vector (for serialization)
    pub fn all_entries(&self) -> Vec<IdMapping> {
        self.by_anime.values().map(|m| (**m).clone()).collect()
    }
}

impl Default for IdCache {
    fn default() -> Self {
        Self::new()
    }
}
