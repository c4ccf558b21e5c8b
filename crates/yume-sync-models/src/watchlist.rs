use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::WatchStatus;

/// One entry of a user's local watchlist.
///
/// Entries live in a single per-user ordered collection with `anime_id`
/// unique within it. The sync merge step and ordinary watchlist CRUD
/// both mutate these, so writers must read-modify-write the latest
/// state rather than replacing blindly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub anime_id: String,
    pub title: String,
    pub status: WatchStatus,
    pub watched_episodes: u32,
    #[serde(default)]
    pub total_episodes: u32,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watched: Option<DateTime<Utc>>,
}

impl WatchlistEntry {
    pub fn new(anime_id: impl Into<String>, title: impl Into<String>, status: WatchStatus) -> Self {
        Self {
            anime_id: anime_id.into(),
            title: title.into(),
            status,
            watched_episodes: 0,
            total_episodes: 0,
            updated_at: Utc::now(),
            last_watched: None,
        }
    }

    /// Apply an incoming sync update to this entry.
    ///
    /// Status and episode counts always overwrite; the title only when
    /// the incoming one is non-empty; `last_watched` is preserved.
    pub fn apply(&mut self, incoming: &WatchlistEntry) {
        self.status = incoming.status;
        self.watched_episodes = incoming.watched_episodes;
        self.total_episodes = incoming.total_episodes;
        if !incoming.title.is_empty() {
            self.title = incoming.title.clone();
        }
        self.updated_at = Utc::now();
    }
}
