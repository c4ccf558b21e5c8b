use serde::Deserialize;
use tracing::{debug, warn};
use yume_sync_models::{MediaTitle, RemoteStatus, SourceListEntry, SourceMedia};

use crate::error::SourceError;

pub(crate) const VIEWER_QUERY: &str = "query { Viewer { id name } }";

pub(crate) const LIST_QUERY: &str = r#"
query ($userId: Int) {
  MediaListCollection(userId: $userId, type: ANIME) {
    lists {
      name
      entries {
        id
        status
        progress
        score
        media {
          id
          idMal
          episodes
          title { romaji english native userPreferred }
          synonyms
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewerData {
    #[serde(rename = "Viewer")]
    pub viewer: Option<RawViewer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawViewer {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListData {
    #[serde(rename = "MediaListCollection")]
    pub collection: Option<MediaListCollection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaListCollection {
    pub lists: Option<Vec<MediaList>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaList {
    pub name: Option<String>,
    pub entries: Option<Vec<RawEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEntry {
    pub id: Option<u64>,
    pub status: Option<RemoteStatus>,
    pub progress: Option<u32>,
    pub score: Option<f64>,
    pub media: Option<RawMedia>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMedia {
    pub id: u64,
    #[serde(rename = "idMal")]
    pub id_mal: Option<u64>,
    pub episodes: Option<u32>,
    pub title: Option<MediaTitle>,
    pub synonyms: Option<Vec<String>>,
}

/// Unwrap the grouped `MediaListCollection` into one flat sequence,
/// dropping entries that carry no embedded media.
pub(crate) fn flatten_collection(data: ListData) -> Vec<SourceListEntry> {
    let mut out = Vec::new();

    let lists = data
        .collection
        .and_then(|c| c.lists)
        .unwrap_or_default();

    for list in lists {
        let list_name = list.name.unwrap_or_else(|| "Unknown".to_string());
        let entries = list.entries.unwrap_or_default();
        debug!("Flattening list '{}' with {} entries", list_name, entries.len());

        for raw in entries {
            let media = match raw.media {
                Some(media) => media,
                None => {
                    warn!("Entry {:?} has no media data, dropping", raw.id);
                    continue;
                }
            };

            out.push(SourceListEntry {
                entry_id: raw.id.unwrap_or(0),
                list_name: list_name.clone(),
                status: raw.status.unwrap_or(RemoteStatus::Current),
                progress: raw.progress.unwrap_or(0),
                score: raw.score,
                media: SourceMedia {
                    anilist_id: media.id,
                    mal_id: media.id_mal,
                    episodes: media.episodes,
                    title: media.title.unwrap_or_default(),
                    synonyms: media.synonyms.unwrap_or_default(),
                },
            });
        }
    }

    out
}

/// Parse a raw GraphQL list response into flattened entries.
pub(crate) fn parse_list_response(body: serde_json::Value) -> Result<Vec<SourceListEntry>, SourceError> {
    let response: GraphqlResponse<ListData> =
        serde_json::from_value(body).map_err(|e| SourceError::Decode(e.to_string()))?;

    if let Some(errors) = response.errors {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(SourceError::Decode(format!("GraphQL errors: {}", message)));
    }

    // A null MediaListCollection means the account's lists are private
    // or hold no anime entries; that is an empty result, not a failure.
    Ok(response.data.map(flatten_collection).unwrap_or_default())
}

pub(crate) fn parse_viewer_response(body: serde_json::Value) -> Result<RawViewer, SourceError> {
    let response: GraphqlResponse<ViewerData> =
        serde_json::from_value(body).map_err(|e| SourceError::Decode(e.to_string()))?;

    if let Some(errors) = response.errors {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(SourceError::Auth(message));
    }

    response
        .data
        .and_then(|d| d.viewer)
        .ok_or_else(|| SourceError::Auth("viewer not present in response".to_string()))
}
