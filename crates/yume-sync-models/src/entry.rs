use serde::{Deserialize, Serialize};

use crate::status::RemoteStatus;

/// Alternate titles AniList carries for one media item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaTitle {
    #[serde(rename = "userPreferred")]
    pub user_preferred: Option<String>,
    pub english: Option<String>,
    pub romaji: Option<String>,
    pub native: Option<String>,
}

/// Media record embedded in a remote list entry.
///
/// `anilist_id` is the primary remote identifier; `mal_id` is the
/// secondary (MyAnimeList) identifier used as a fallback match key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceMedia {
    pub anilist_id: u64,
    pub mal_id: Option<u64>,
    pub episodes: Option<u32>,
    pub title: MediaTitle,
    pub synonyms: Vec<String>,
}

/// One item of the user's remote list, flattened out of whatever
/// named sub-list AniList grouped it under.
///
/// Constructed fresh on every sync run; never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceListEntry {
    pub entry_id: u64,
    pub list_name: String,
    pub status: RemoteStatus,
    pub progress: u32,
    pub score: Option<f64>,
    pub media: SourceMedia,
}
