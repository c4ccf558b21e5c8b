use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use yume_sync_models::SourceListEntry;

use crate::anilist::api;
use crate::error::SourceError;
use crate::traits::ListSource;

const DEFAULT_API_URL: &str = "https://graphql.anilist.co";

/// Retries on 429/5xx before giving up; other failures get one retry.
const MAX_RETRIES: u32 = 2;

/// Basic viewer identity, used for account display and empty-list
/// disambiguation.
#[derive(Debug, Clone)]
pub struct ViewerProfile {
    pub id: u64,
    pub name: String,
}

/// AniList GraphQL client: bearer-token auth, JSON over HTTPS,
/// rate-limit aware.
pub struct AniListClient {
    http: Client,
    api_url: String,
}

impl AniListClient {
    pub fn new(request_timeout: Duration) -> Result<Self, SourceError> {
        Self::with_api_url(DEFAULT_API_URL, request_timeout)
    }

    pub fn with_api_url(api_url: impl Into<String>, request_timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(SourceError::from)?;
        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    /// Perform one GraphQL request with backoff.
    ///
    /// 429 and 5xx wait `2^attempt × base` before retrying, which also
    /// absorbs upstream rate limiting; anything else is retried once.
    async fn graphql(
        &self,
        access_token: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, SourceError> {
        let payload = json!({ "query": query, "variables": variables });
        let mut attempt: u32 = 0;

        loop {
            let result = self
                .http
                .post(&self.api_url)
                .bearer_auth(access_token)
                .header("Accept", "application/json")
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if attempt < MAX_RETRIES {
                            let wait = Duration::from_secs(2u64 << attempt);
                            warn!("AniList rate limited, waiting {:?} before retry", wait);
                            tokio::time::sleep(wait).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(SourceError::RateLimited);
                    }

                    if status.is_server_error() {
                        if attempt < MAX_RETRIES {
                            let wait = Duration::from_secs(1u64 << attempt);
                            warn!("AniList returned {}, retrying in {:?}", status, wait);
                            tokio::time::sleep(wait).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(SourceError::Status(status.as_u16()));
                    }

                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(SourceError::Auth(format!("AniList rejected token ({})", status)));
                    }

                    if !status.is_success() {
                        return Err(SourceError::Status(status.as_u16()));
                    }

                    return resp
                        .json::<serde_json::Value>()
                        .await
                        .map_err(|e| SourceError::Decode(e.to_string()));
                }
                Err(e) => {
                    if attempt == 0 {
                        debug!("AniList request failed ({}), retrying once", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(SourceError::from(e));
                }
            }
        }
    }

    pub async fn viewer_profile(&self, access_token: &str) -> Result<ViewerProfile, SourceError> {
        let body = self.graphql(access_token, api::VIEWER_QUERY, json!({})).await?;
        let viewer = api::parse_viewer_response(body)?;
        Ok(ViewerProfile {
            id: viewer.id,
            name: viewer.name.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ListSource for AniListClient {
    async fn viewer_id(&self, access_token: &str) -> Result<u64, SourceError> {
        let body = self.graphql(access_token, api::VIEWER_QUERY, json!({})).await?;
        Ok(api::parse_viewer_response(body)?.id)
    }

    async fn full_list(&self, access_token: &str) -> Result<Vec<SourceListEntry>, SourceError> {
        let viewer_id = self.viewer_id(access_token).await?;
        let body = self
            .graphql(access_token, api::LIST_QUERY, json!({ "userId": viewer_id }))
            .await?;
        let entries = api::parse_list_response(body)?;
        debug!("Fetched {} entries from AniList for viewer {}", entries.len(), viewer_id);
        Ok(entries)
    }
}
