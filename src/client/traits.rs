use crate::event::{ListEventsRequest, ListEventsResponse};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("audit trail API returned error status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Listing side of the audit trail API.
///
/// Implementations return events of the requested window ordered as asked,
/// at most `page_size` of them, plus a token when more pages exist.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn list_events(
        &self,
        request: &ListEventsRequest,
    ) -> Result<ListEventsResponse, ClientError>;
}
