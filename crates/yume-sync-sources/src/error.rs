use thiserror::Error;

/// Errors surfaced by external collaborators (remote list service,
/// catalog providers, stores).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if let Some(status) = err.status() {
            SourceError::Status(status.as_u16())
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}
