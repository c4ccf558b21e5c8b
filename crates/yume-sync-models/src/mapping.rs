use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cross-catalog identifier mapping: local anime id ↔ AniList/MAL ids.
///
/// `anime_id` is the primary key. `anilist_id`/`mal_id` of 0 mean
/// "unknown"; in practice a remote id maps to exactly one anime id, but
/// the stores tolerate duplicates and first match wins on lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdMapping {
    pub anime_id: String,
    #[serde(default)]
    pub anilist_id: u64,
    #[serde(default)]
    pub mal_id: u64,
    #[serde(default)]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IdMapping {
    pub fn new(anime_id: impl Into<String>, anilist_id: u64, mal_id: u64, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            anime_id: anime_id.into(),
            anilist_id,
            mal_id,
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a newer observation into this mapping.
    ///
    /// A known non-zero id is never overwritten with zero, and the title
    /// hint only changes when the incoming one is non-empty.
    pub fn merge(&mut self, other: &IdMapping) {
        if other.anilist_id != 0 {
            self.anilist_id = other.anilist_id;
        }
        if other.mal_id != 0 {
            self.mal_id = other.mal_id;
        }
        if !other.title.is_empty() {
            self.title = other.title.clone();
        }
        self.updated_at = Utc::now();
    }

    /// True when neither remote id is known.
    pub fn is_unresolved(&self) -> bool {
        self.anilist_id == 0 && self.mal_id == 0
    }
}
