pub mod auto_sync;
pub mod id_cache;
pub mod id_cache_storage;
pub mod id_resolver;
pub mod progress;
pub mod resolver;
pub mod sync;

pub use auto_sync::{AutoSyncManager, AutoSyncStatus};
pub use id_cache::IdCache;
pub use id_cache_storage::IdCacheStorage;
pub use id_resolver::{CacheStats, IdResolver};
pub use progress::SyncProgress;
pub use resolver::{generate_title_candidates, CandidateResolver, ResolvedMatch, ResolverConfig};
pub use sync::{FailedEntry, SyncError, SyncOrchestrator, SyncSummary};

#[cfg(test)]
pub(crate) mod testing;
