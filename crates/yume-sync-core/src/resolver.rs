use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use yume_sync_config::SyncConfig;
use yume_sync_models::{IdMapping, SourceMedia};
use yume_sync_sources::{AnimeInfo, CatalogProvider, SearchHit};

use crate::id_resolver::IdResolver;

/// Knobs for candidate search and retry pacing.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub max_title_candidates: usize,
    pub max_results_checked: usize,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_title_candidates: 8,
            max_results_checked: 6,
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl ResolverConfig {
    pub fn from_sync(config: &SyncConfig) -> Self {
        Self {
            max_title_candidates: config.max_title_candidates,
            max_results_checked: config.max_results_checked,
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }
}

/// A catalog entry confirmed to be the same show as a remote list entry.
#[derive(Debug, Clone)]
pub struct ResolvedMatch {
    pub anime_id: String,
    pub title: String,
    pub poster: Option<String>,
}

/// Ordered, deduplicated search titles for one media entry.
///
/// Order matters: the preferred display title first, then the official
/// alternates, then up to two synonyms. Later duplicates are dropped so
/// a show titled identically in English and romaji costs one search.
pub fn generate_title_candidates(media: &SourceMedia, max: usize) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |title: &str| {
        let trimmed = title.trim();
        if !trimmed.is_empty() && !candidates.iter().any(|c| c == trimmed) {
            candidates.push(trimmed.to_string());
        }
    };

    if let Some(preferred) = &media.title.user_preferred {
        push(preferred);
    }
    if let Some(english) = &media.title.english {
        push(english);
    }
    if let Some(romaji) = &media.title.romaji {
        push(romaji);
    }
    if let Some(native) = &media.title.native {
        push(native);
    }
    for synonym in media.synonyms.iter().take(2) {
        push(synonym);
    }

    candidates.truncate(max);
    candidates
}

/// Lowercase, strip punctuation, collapse whitespace. Used only for
/// logging and cache keys; matching itself is by catalog ids.
pub fn normalize_title(title: &str) -> String {
    let lowered: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves remote list entries to local catalog ids by searching title
/// candidates and verifying each hit's catalog ids against the entry.
///
/// Search and info responses are memoized for the lifetime of the
/// resolver (one sync run), so retry passes and entries sharing a title
/// do not repeat network calls.
pub struct CandidateResolver {
    provider: Arc<dyn CatalogProvider>,
    ids: Arc<Mutex<IdResolver>>,
    config: ResolverConfig,
    search_cache: StdMutex<HashMap<String, Vec<SearchHit>>>,
    info_cache: StdMutex<HashMap<String, AnimeInfo>>,
}

impl CandidateResolver {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        ids: Arc<Mutex<IdResolver>>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            provider,
            ids,
            config,
            search_cache: StdMutex::new(HashMap::new()),
            info_cache: StdMutex::new(HashMap::new()),
        }
    }

    /// Resolve one entry, with retry passes over the full candidate list.
    ///
    /// A confirmed match is written through to the id cache before
    /// returning, so subsequent runs skip this entry entirely. `None`
    /// means every candidate was exhausted on every pass.
    pub async fn resolve(&self, media: &SourceMedia) -> Option<ResolvedMatch> {
        let candidates = generate_title_candidates(media, self.config.max_title_candidates);
        if candidates.is_empty() {
            warn!("Entry anilist_id={} has no usable titles", media.anilist_id);
            return None;
        }

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.backoff_base * 2u32.pow(attempt - 1);
                debug!(
                    "Retry pass {} for anilist_id={} after {:?}",
                    attempt, media.anilist_id, backoff
                );
                tokio::time::sleep(backoff).await;
            }

            for candidate in &candidates {
                match self.try_candidate(candidate, media).await {
                    Ok(Some(resolved)) => {
                        let mapping = IdMapping::new(
                            &resolved.anime_id,
                            media.anilist_id,
                            media.mal_id.unwrap_or(0),
                            &resolved.title,
                        );
                        self.ids.lock().await.save(mapping).await;
                        return Some(resolved);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            "Candidate '{}' for anilist_id={} failed: {}",
                            normalize_title(candidate),
                            media.anilist_id,
                            e
                        );
                    }
                }
            }
        }

        debug!(
            "Exhausted {} candidates for anilist_id={}",
            candidates.len(),
            media.anilist_id
        );
        None
    }

    /// Search one candidate title and verify the top hits by catalog id.
    ///
    /// A hit matches iff its AniList id equals the entry's, or both
    /// carry the same non-zero MAL id. Title similarity alone never
    /// confirms a match.
    async fn try_candidate(
        &self,
        candidate: &str,
        media: &SourceMedia,
    ) -> Result<Option<ResolvedMatch>, yume_sync_sources::SourceError> {
        let hits = self.cached_search(candidate).await?;

        for hit in hits.into_iter().take(self.config.max_results_checked) {
            let info = self.cached_info(&hit.id).await?;
            if Self::ids_match(media, &info) {
                return Ok(Some(ResolvedMatch {
                    anime_id: hit.id,
                    title: hit.name,
                    poster: info.poster,
                }));
            }
        }
        Ok(None)
    }

    fn ids_match(media: &SourceMedia, info: &AnimeInfo) -> bool {
        if media.anilist_id != 0 && info.anilist_id == Some(media.anilist_id) {
            return true;
        }
        match (media.mal_id, info.mal_id) {
            (Some(m), Some(i)) if m != 0 => m == i,
            _ => false,
        }
    }

    async fn cached_search(
        &self,
        title: &str,
    ) -> Result<Vec<SearchHit>, yume_sync_sources::SourceError> {
        let key = normalize_title(title);
        if let Ok(cache) = self.search_cache.lock() {
            if let Some(hits) = cache.get(&key) {
                return Ok(hits.clone());
            }
        }
        let hits = self.provider.search(title).await?;
        if let Ok(mut cache) = self.search_cache.lock() {
            cache.insert(key, hits.clone());
        }
        Ok(hits)
    }

    async fn cached_info(&self, anime_id: &str) -> Result<AnimeInfo, yume_sync_sources::SourceError> {
        if let Ok(cache) = self.info_cache.lock() {
            if let Some(info) = cache.get(anime_id) {
                return Ok(info.clone());
            }
        }
        let info = self.provider.anime_info(anime_id).await?;
        if let Ok(mut cache) = self.info_cache.lock() {
            cache.insert(anime_id.to_string(), info.clone());
        }
        Ok(info)
    }
}
