use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};
use yume_sync_config::SyncConfig;
use yume_sync_models::{SourceListEntry, WatchlistEntry};
use yume_sync_sources::{CatalogProvider, ListSource, ProgressSink, WatchlistStore};

use crate::id_resolver::IdResolver;
use crate::progress::SyncProgress;
use crate::resolver::{generate_title_candidates, CandidateResolver, ResolverConfig};

/// Ways a whole sync run can fail. Per-entry failures are not errors;
/// they land in the summary's failed count.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("could not fetch remote list: {0}")]
    ListUnavailable(String),
    #[error("remote list is empty or private")]
    ListEmptyOrPrivate,
    #[error("failed to write watchlist: {0}")]
    WatchlistWrite(String),
}

/// One entry that could not be resolved, for the summary report.
#[derive(Debug, Clone)]
pub struct FailedEntry {
    pub anilist_id: u64,
    pub mal_id: Option<u64>,
    pub reason: String,
    pub titles: Vec<String>,
}

const MAX_REPORTED_FAILURES: usize = 10;

/// Outcome of one completed sync run.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub total_count: usize,
    pub synced_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub cache_hits: usize,
    pub success_rate: f64,
    pub elapsed_secs: f64,
    pub failed_entries: Vec<FailedEntry>,
}

/// Drives one full reconciliation run: fetch the remote list, merge
/// entries already mapped, resolve the rest against the catalog under
/// bounded concurrency, and merge the results.
pub struct SyncOrchestrator {
    list_source: Arc<dyn ListSource>,
    provider: Arc<dyn CatalogProvider>,
    watchlist: Arc<dyn WatchlistStore>,
    ids: Arc<Mutex<IdResolver>>,
    sink: Option<Arc<dyn ProgressSink>>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        list_source: Arc<dyn ListSource>,
        provider: Arc<dyn CatalogProvider>,
        watchlist: Arc<dyn WatchlistStore>,
        ids: Arc<Mutex<IdResolver>>,
        sink: Option<Arc<dyn ProgressSink>>,
        config: SyncConfig,
    ) -> Self {
        Self {
            list_source,
            provider,
            watchlist,
            ids,
            sink,
            config,
        }
    }

    pub async fn sync(&self, user_id: &str, token: &str) -> Result<SyncSummary, SyncError> {
        let entries = self.fetch_remote_list(token).await?;
        info!("Fetched {} remote list entries for {}", entries.len(), user_id);

        {
            let mut ids = self.ids.lock().await;
            let (local, merged) = ids.preload().await;
            debug!("Id cache ready: {} local, {} merged from durable", local, merged);
        }

        let progress = Arc::new(SyncProgress::new(
            entries.len(),
            user_id,
            self.sink.clone(),
            self.config.progress_interval,
        ));

        let (hits, misses) = self.partition_cached(entries).await;
        info!("{} entries already mapped, {} need resolution", hits.len(), misses.len());

        let mut updates: Vec<WatchlistEntry> = Vec::with_capacity(hits.len());
        for (entry, anime_id, title_hint) in hits {
            updates.push(to_watchlist_entry(&entry, anime_id, &title_hint));
            progress.record_cached_hit().await;
        }
        if !updates.is_empty() {
            self.merge_into_watchlist(user_id, updates).await?;
        }

        let (resolved, failed_entries) = self.resolve_misses(misses, progress.clone()).await;
        if !resolved.is_empty() {
            self.merge_into_watchlist(user_id, resolved).await?;
        }

        if let Err(e) = self.ids.lock().await.save_if_dirty() {
            warn!("Failed to persist id cache after sync: {}", e);
        }
        progress.publish_now().await;

        let snap = progress.snapshot().await;
        let success_rate = if snap.total == 0 {
            100.0
        } else {
            snap.synced as f64 / snap.total as f64 * 100.0
        };
        Ok(SyncSummary {
            total_count: snap.total,
            synced_count: snap.synced,
            skipped_count: snap.skipped,
            failed_count: snap.failed,
            cache_hits: snap.cached_hits,
            success_rate,
            elapsed_secs: snap.elapsed_secs,
            failed_entries,
        })
    }

    /// Fetch the full remote list, telling an unreachable service apart
    /// from a genuinely empty or private list: if the list comes back
    /// empty but the viewer endpoint answers, the account is real and
    /// the list is empty or hidden.
    async fn fetch_remote_list(&self, token: &str) -> Result<Vec<SourceListEntry>, SyncError> {
        let entries = self
            .list_source
            .full_list(token)
            .await
            .map_err(|e| SyncError::ListUnavailable(e.to_string()))?;

        if entries.is_empty() {
            return match self.list_source.viewer_id(token).await {
                Ok(_) => Err(SyncError::ListEmptyOrPrivate),
                Err(e) => Err(SyncError::ListUnavailable(e.to_string())),
            };
        }
        Ok(entries)
    }

    /// Split entries into those already mapped and those that need
    /// catalog resolution. The in-memory cache is consulted first; a
    /// miss falls back to the durable store, covering mappings the
    /// preload could not fetch. Every input entry lands in exactly one
    /// of the two buckets.
    async fn partition_cached(
        &self,
        entries: Vec<SourceListEntry>,
    ) -> (Vec<(SourceListEntry, String, String)>, Vec<SourceListEntry>) {
        let mut ids = self.ids.lock().await;
        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for entry in entries {
            match ids
                .lookup_or_durable(entry.media.anilist_id, entry.media.mal_id.unwrap_or(0))
                .await
            {
                Some(mapping) => {
                    hits.push((entry, mapping.anime_id.clone(), mapping.title.clone()));
                }
                None => misses.push(entry),
            }
        }
        (hits, misses)
    }

    /// Resolve unmapped entries concurrently, bounded by a semaphore
    /// and a per-entry timeout so one slow lookup cannot stall the run.
    async fn resolve_misses(
        &self,
        misses: Vec<SourceListEntry>,
        progress: Arc<SyncProgress>,
    ) -> (Vec<WatchlistEntry>, Vec<FailedEntry>) {
        if misses.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let resolver = Arc::new(CandidateResolver::new(
            self.provider.clone(),
            self.ids.clone(),
            ResolverConfig::from_sync(&self.config),
        ));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests.max(1)));
        let entry_timeout = Duration::from_secs(self.config.entry_timeout_secs);

        let mut tasks = Vec::with_capacity(misses.len());
        for entry in misses {
            let resolver = resolver.clone();
            let semaphore = semaphore.clone();
            let progress = progress.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (entry, Err("semaphore closed".to_string())),
                };
                match tokio::time::timeout(entry_timeout, resolver.resolve(&entry.media)).await {
                    Ok(Some(resolved)) => {
                        progress.record_synced().await;
                        (entry, Ok(resolved))
                    }
                    Ok(None) => {
                        progress.record_failed().await;
                        (entry, Err("no catalog match".to_string()))
                    }
                    Err(_) => {
                        progress.record_failed().await;
                        (entry, Err(format!("timed out after {}s", entry_timeout.as_secs())))
                    }
                }
            }));
        }

        let mut resolved_updates = Vec::new();
        let mut failed = Vec::new();
        for outcome in futures::future::join_all(tasks).await {
            match outcome {
                Ok((entry, Ok(resolved))) => {
                    resolved_updates.push(to_watchlist_entry(&entry, resolved.anime_id, &resolved.title));
                }
                Ok((entry, Err(reason))) => {
                    if failed.len() < MAX_REPORTED_FAILURES {
                        failed.push(FailedEntry {
                            anilist_id: entry.media.anilist_id,
                            mal_id: entry.media.mal_id,
                            reason,
                            titles: generate_title_candidates(&entry.media, self.config.max_title_candidates),
                        });
                    }
                }
                Err(e) => {
                    warn!("Resolution task panicked: {}", e);
                    progress.record_failed().await;
                    if failed.len() < MAX_REPORTED_FAILURES {
                        failed.push(FailedEntry {
                            anilist_id: 0,
                            mal_id: None,
                            reason: format!("task failed: {}", e),
                            titles: Vec::new(),
                        });
                    }
                }
            }
        }
        (resolved_updates, failed)
    }

    /// Load the user's watchlist, merge updates in, store it back. One
    /// bulk write per batch keeps the store round-trips flat in the
    /// number of entries.
    async fn merge_into_watchlist(
        &self,
        user_id: &str,
        updates: Vec<WatchlistEntry>,
    ) -> Result<(), SyncError> {
        let current = self
            .watchlist
            .load(user_id)
            .await
            .map_err(|e| SyncError::WatchlistWrite(e.to_string()))?;
        let merged = merge_entries(current, updates);
        self.watchlist
            .store(user_id, &merged)
            .await
            .map_err(|e| SyncError::WatchlistWrite(e.to_string()))
    }
}

/// Non-destructive merge keyed by anime id: existing entries absorb the
/// incoming state, unknown ids are appended, nothing is removed.
pub fn merge_entries(current: Vec<WatchlistEntry>, updates: Vec<WatchlistEntry>) -> Vec<WatchlistEntry> {
    let mut merged = current;
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, e)| (e.anime_id.clone(), i))
        .collect();

    for update in updates {
        match index.get(&update.anime_id) {
            Some(&i) => merged[i].apply(&update),
            None => {
                index.insert(update.anime_id.clone(), merged.len());
                merged.push(update);
            }
        }
    }
    merged
}

fn to_watchlist_entry(entry: &SourceListEntry, anime_id: String, title_hint: &str) -> WatchlistEntry {
    let title = [
        entry.media.title.user_preferred.as_deref(),
        entry.media.title.english.as_deref(),
        entry.media.title.romaji.as_deref(),
        entry.media.title.native.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|t| !t.trim().is_empty())
    .unwrap_or(title_hint);

    let mut watchlist_entry = WatchlistEntry::new(anime_id, title, entry.status.into());
    watchlist_entry.watched_episodes = entry.progress;
    watchlist_entry.total_episodes = entry.media.episodes.unwrap_or(0);
    watchlist_entry
}
