use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::sync::{SyncError, SyncOrchestrator, SyncSummary};

/// Where a user stands in the background sync schedule.
#[derive(Debug, Clone)]
pub struct AutoSyncStatus {
    pub running: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub due: bool,
}

/// Tracks per-user sync recency and gates background runs to one per
/// user per interval, with overlap protection.
pub struct AutoSyncManager {
    interval: Duration,
    state: Mutex<ManagerState>,
}

#[derive(Default)]
struct ManagerState {
    last: HashMap<String, DateTime<Utc>>,
    running: HashSet<String>,
}

impl AutoSyncManager {
    pub fn new(interval_hours: u64) -> Self {
        Self {
            interval: Duration::hours(interval_hours.max(1) as i64),
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// A user is due when they have never synced or the interval has
    /// elapsed, and no run of theirs is currently in flight.
    pub fn should_sync(&self, user_id: &str) -> bool {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.running.contains(user_id) {
            return false;
        }
        match state.last.get(user_id) {
            Some(last) => Utc::now() - *last >= self.interval,
            None => true,
        }
    }

    pub fn status(&self, user_id: &str) -> AutoSyncStatus {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        let running = state.running.contains(user_id);
        let last_sync = state.last.get(user_id).copied();
        let due = !running
            && match last_sync {
                Some(last) => Utc::now() - last >= self.interval,
                None => true,
            };
        AutoSyncStatus {
            running,
            last_sync,
            due,
        }
    }

    /// Run a sync for the user if one is due. Returns `None` when the
    /// user is not due or already syncing. Recency is recorded only on
    /// success so failed runs retry at the next opportunity.
    pub async fn run_if_due(
        &self,
        orchestrator: &SyncOrchestrator,
        user_id: &str,
        token: &str,
    ) -> Option<Result<SyncSummary, SyncError>> {
        if !self.begin(user_id) {
            debug!("Auto-sync not due for {}", user_id);
            return None;
        }

        info!("Starting background sync for {}", user_id);
        let result = orchestrator.sync(user_id, token).await;
        match &result {
            Ok(summary) => info!(
                "Background sync for {} done: {}/{} synced, {} failed",
                user_id, summary.synced_count, summary.total_count, summary.failed_count
            ),
            Err(e) => warn!("Background sync for {} failed: {}", user_id, e),
        }
        self.finish(user_id, result.is_ok());
        Some(result)
    }

    /// Atomically claim the user for a run. False when not due.
    fn begin(&self, user_id: &str) -> bool {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.running.contains(user_id) {
            return false;
        }
        let due = match state.last.get(user_id) {
            Some(last) => Utc::now() - *last >= self.interval,
            None => true,
        };
        if due {
            state.running.insert(user_id.to_string());
        }
        due
    }

    fn finish(&self, user_id: &str, success: bool) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.running.remove(user_id);
        if success {
            state.last.insert(user_id.to_string(), Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_due() {
        let manager = AutoSyncManager::new(24);
        assert!(manager.should_sync("u1"));
        let status = manager.status("u1");
        assert!(status.due);
        assert!(status.last_sync.is_none());
    }

    #[test]
    fn recently_synced_user_is_not_due() {
        let manager = AutoSyncManager::new(24);
        assert!(manager.begin("u1"));
        manager.finish("u1", true);

        assert!(!manager.should_sync("u1"));
        assert!(manager.status("u1").last_sync.is_some());
    }

    #[test]
    fn failed_run_does_not_update_recency() {
        let manager = AutoSyncManager::new(24);
        assert!(manager.begin("u1"));
        manager.finish("u1", false);

        assert!(manager.should_sync("u1"));
    }

    #[test]
    fn in_flight_run_blocks_a_second_claim() {
        let manager = AutoSyncManager::new(24);
        assert!(manager.begin("u1"));
        assert!(!manager.begin("u1"));
        assert!(manager.status("u1").running);
        // Another user is unaffected
        assert!(manager.should_sync("u2"));
    }
}
