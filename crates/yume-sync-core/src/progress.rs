use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use yume_sync_models::ProgressSnapshot;
use yume_sync_sources::ProgressSink;

#[derive(Debug, Default)]
struct Counters {
    processed: usize,
    synced: usize,
    skipped: usize,
    failed: usize,
    cached_hits: usize,
}

/// Shared progress tracker for one sync run.
///
/// Every entry lands in exactly one of synced, skipped, or failed;
/// `processed` advances once per entry regardless of outcome. Snapshots
/// are forwarded to the sink on an interval and at completion.
pub struct SyncProgress {
    total: usize,
    state: Mutex<Counters>,
    started: Instant,
    sink: Option<Arc<dyn ProgressSink>>,
    user_id: String,
    report_interval: usize,
}

impl SyncProgress {
    pub fn new(
        total: usize,
        user_id: impl Into<String>,
        sink: Option<Arc<dyn ProgressSink>>,
        report_interval: usize,
    ) -> Self {
        Self {
            total,
            state: Mutex::new(Counters::default()),
            started: Instant::now(),
            sink,
            user_id: user_id.into(),
            report_interval: report_interval.max(1),
        }
    }

    pub async fn record_synced(&self) {
        self.record(|c| c.synced += 1).await;
    }

    /// A cache hit counts as synced; the extra counter feeds the summary.
    pub async fn record_cached_hit(&self) {
        self.record(|c| {
            c.synced += 1;
            c.cached_hits += 1;
        })
        .await;
    }

    pub async fn record_skipped(&self) {
        self.record(|c| c.skipped += 1).await;
    }

    pub async fn record_failed(&self) {
        self.record(|c| c.failed += 1).await;
    }

    async fn record(&self, apply: impl FnOnce(&mut Counters)) {
        let snapshot = {
            let mut state = self.state.lock().await;
            apply(&mut state);
            state.processed += 1;
            if state.processed % self.report_interval == 0 || state.processed == self.total {
                Some(self.snapshot_of(&state))
            } else {
                None
            }
        };
        if let Some(snapshot) = snapshot {
            self.publish(&snapshot);
        }
    }

    fn snapshot_of(&self, state: &Counters) -> ProgressSnapshot {
        let elapsed = self.started.elapsed().as_secs_f64();
        let percentage = if self.total == 0 {
            100.0
        } else {
            state.processed as f64 / self.total as f64 * 100.0
        };
        let estimated_remaining_secs = if state.processed == 0 {
            0.0
        } else {
            let per_entry = elapsed / state.processed as f64;
            per_entry * (self.total - state.processed) as f64
        };
        ProgressSnapshot {
            total: self.total,
            processed: state.processed,
            synced: state.synced,
            skipped: state.skipped,
            failed: state.failed,
            cached_hits: state.cached_hits,
            percentage,
            elapsed_secs: elapsed,
            estimated_remaining_secs,
        }
    }

    pub async fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.lock().await;
        self.snapshot_of(&state)
    }

    /// Push the current state to the sink unconditionally.
    pub async fn publish_now(&self) {
        let snapshot = self.snapshot().await;
        self.publish(&snapshot);
    }

    fn publish(&self, snapshot: &ProgressSnapshot) {
        debug!(
            "Progress for {}: {}/{} ({:.1}%), {} synced, {} failed",
            self.user_id, snapshot.processed, snapshot.total, snapshot.percentage, snapshot.synced, snapshot.failed
        );
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.store(&self.user_id, snapshot) {
                warn!("Failed to publish progress for {}: {}", self.user_id, e);
            }
        }
    }
}
