//! Card source abstraction over the Chub.ai REST API.
//!
//! This module defines the [`CardSource`] trait that the download pipeline
//! talks to. [`ChubSource`] implements it over HTTP; [`MockSource`] serves
//! canned responses from memory for tests.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | search    | `GET /characters/search?search=..&nsfw=true&nsfl=true&first=100&page=1&sort=created_at&asc=false` |
//! | download  | `POST /characters/download` with `{format, fullPath, version}` |
//! | gallery   | `GET /gallery/project/{id}?nsfw=true&page=1&limit=24` |
//! | asset     | plain `GET` of a gallery image URL |

mod chub;
pub mod mock;

pub use chub::{ChubSource, CHUB_API_BASE};
pub use mock::MockSource;

use crate::models::{CardDownloadRequest, GalleryPage, GalleryQuery, SearchPage, SearchQuery};
use async_trait::async_trait;
use std::fmt;

/// The interface the download pipeline uses to reach the card API.
///
/// Every call is a single request: implementations must not retry.
#[async_trait]
pub trait CardSource: Send + Sync + fmt::Debug {
    /// Unique identifier for this source
    fn id(&self) -> &str;

    /// Whether requests carry a bearer credential.
    ///
    /// Private and NSFL cards are only visible to authenticated requests, so
    /// an empty search result means something different without one.
    fn has_credentials(&self) -> bool {
        false
    }

    /// Run a card search
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SourceError>;

    /// Download the card image, returning the raw response body
    async fn download_card(&self, request: &CardDownloadRequest) -> Result<Vec<u8>, SourceError>;

    /// List the gallery of a card
    async fn gallery(&self, query: &GalleryQuery) -> Result<GalleryPage, SourceError>;

    /// Fetch an arbitrary asset URL without credentials.
    ///
    /// Anything other than `200 OK` is reported as [`SourceError::Api`].
    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Body of a failed API response
#[derive(Debug, Clone, PartialEq)]
pub enum ApiDetail {
    /// The body parsed as JSON
    Json(serde_json::Value),

    /// Raw body text
    Text(String),
}

impl ApiDetail {
    /// Keep the body as structured JSON when it parses, raw text otherwise
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => ApiDetail::Json(value),
            Err(_) => ApiDetail::Text(body.to_string()),
        }
    }
}

impl fmt::Display for ApiDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiDetail::Json(value) => write!(f, "Error Details: {}", value),
            ApiDetail::Text(text) => write!(f, "Response Content: {}", text),
        }
    }
}

/// Errors that can occur when talking to a card source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or transport error (no HTTP response)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("API error (status {status})\n{detail}")]
    Api { status: u16, detail: ApiDetail },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_detail_json() {
        let detail = ApiDetail::from_body(r#"{"detail": "Not authenticated"}"#);
        assert_eq!(
            detail,
            ApiDetail::Json(serde_json::json!({"detail": "Not authenticated"}))
        );
    }

    #[test]
    fn test_api_detail_text() {
        let detail = ApiDetail::from_body("<html>Bad Gateway</html>");
        assert_eq!(detail, ApiDetail::Text("<html>Bad Gateway</html>".to_string()));
        assert_eq!(
            detail.to_string(),
            "Response Content: <html>Bad Gateway</html>"
        );
    }

    #[test]
    fn test_error_status() {
        let err = SourceError::Api {
            status: 403,
            detail: ApiDetail::Text(String::new()),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(SourceError::Network("down".into()).status(), None);
    }
}
