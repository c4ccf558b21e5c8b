use serde::{Deserialize, Serialize};

/// Point-in-time view of a running sync, as handed to the progress sink
/// and ultimately a polling status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub processed: usize,
    pub synced: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cached_hits: usize,
    pub percentage: f64,
    pub elapsed_secs: f64,
    pub estimated_remaining_secs: f64,
}
