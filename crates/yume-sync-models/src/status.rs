use serde::{Deserialize, Serialize};

/// AniList media-list status as it appears on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteStatus {
    Current,
    Completed,
    Paused,
    Dropped,
    Planning,
    Repeating,
}

/// Status values used by the local watchlist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Watching,
    Completed,
    Paused,
    Dropped,
    PlanToWatch,
}

impl From<RemoteStatus> for WatchStatus {
    fn from(status: RemoteStatus) -> Self {
        match status {
            // Rewatching shows up as actively watching locally
            RemoteStatus::Current | RemoteStatus::Repeating => WatchStatus::Watching,
            RemoteStatus::Completed => WatchStatus::Completed,
            RemoteStatus::Paused => WatchStatus::Paused,
            RemoteStatus::Dropped => WatchStatus::Dropped,
            RemoteStatus::Planning => WatchStatus::PlanToWatch,
        }
    }
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Watching => "watching",
            WatchStatus::Completed => "completed",
            WatchStatus::Paused => "paused",
            WatchStatus::Dropped => "dropped",
            WatchStatus::PlanToWatch => "plan_to_watch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_status_maps_to_local() {
        assert_eq!(WatchStatus::from(RemoteStatus::Current), WatchStatus::Watching);
        assert_eq!(WatchStatus::from(RemoteStatus::Repeating), WatchStatus::Watching);
        assert_eq!(WatchStatus::from(RemoteStatus::Planning), WatchStatus::PlanToWatch);
        assert_eq!(WatchStatus::from(RemoteStatus::Dropped), WatchStatus::Dropped);
    }

    #[test]
    fn remote_status_deserializes_wire_format() {
        let status: RemoteStatus = serde_json::from_str("\"CURRENT\"").unwrap();
        assert_eq!(status, RemoteStatus::Current);
        let status: RemoteStatus = serde_json::from_str("\"PLANNING\"").unwrap();
        assert_eq!(status, RemoteStatus::Planning);
    }
}
