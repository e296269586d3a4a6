//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{
    CardBuilder, CardDownloadRequest, CardRecord, GalleryPage, GalleryQuery, SearchPage,
    SearchQuery,
};
use crate::sources::{ApiDetail, CardSource, SourceError};

/// A mock source for testing that returns predefined responses.
///
/// Unconfigured searches and galleries come back empty, an unconfigured card
/// image is an empty body, and unknown asset URLs answer `404`.
#[derive(Debug, Default)]
pub struct MockSource {
    credentials: bool,
    search_response: Mutex<Option<SearchPage>>,
    card_image: Mutex<Vec<u8>>,
    gallery_response: Mutex<Option<GalleryPage>>,
    gallery_status: Mutex<Option<u16>>,
    assets: Mutex<HashMap<String, AssetResponse>>,
    calls: Mutex<Vec<String>>,
}

/// What the mock answers for one asset URL
#[derive(Debug, Clone)]
enum AssetResponse {
    Body(Vec<u8>),
    Status(u16),
    Unreachable,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend requests carry a bearer token.
    pub fn with_credentials(mut self) -> Self {
        self.credentials = true;
        self
    }

    /// Set the search response to return.
    pub fn set_search_response(&self, response: SearchPage) {
        let mut guard = self.search_response.lock().unwrap();
        *guard = Some(response);
    }

    /// Set the bytes returned by the card download.
    pub fn set_card_image(&self, bytes: impl Into<Vec<u8>>) {
        let mut guard = self.card_image.lock().unwrap();
        *guard = bytes.into();
    }

    /// Set the gallery listing to return.
    pub fn set_gallery_response(&self, response: GalleryPage) {
        let mut guard = self.gallery_response.lock().unwrap();
        *guard = Some(response);
    }

    /// Fail the gallery listing with an API error status.
    pub fn set_gallery_error(&self, status: u16) {
        let mut guard = self.gallery_status.lock().unwrap();
        *guard = Some(status);
    }

    /// Serve `bytes` for `url`.
    pub fn set_asset(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let mut guard = self.assets.lock().unwrap();
        guard.insert(url.into(), AssetResponse::Body(bytes.into()));
    }

    /// Answer `url` with an error status.
    pub fn set_asset_status(&self, url: impl Into<String>, status: u16) {
        let mut guard = self.assets.lock().unwrap();
        guard.insert(url.into(), AssetResponse::Status(status));
    }

    /// Fail requests for `url` as if the host could not be reached.
    pub fn set_asset_unreachable(&self, url: impl Into<String>) {
        let mut guard = self.assets.lock().unwrap();
        guard.insert(url.into(), AssetResponse::Unreachable);
    }

    /// Clear the configured responses.
    pub fn clear_response(&self) {
        *self.search_response.lock().unwrap() = None;
        *self.gallery_response.lock().unwrap() = None;
        *self.gallery_status.lock().unwrap() = None;
        self.assets.lock().unwrap().clear();
    }

    /// Names of the calls made so far, in order (`search`, `download`,
    /// `gallery`, `asset:<url>`).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl CardSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn search(&self, _query: &SearchQuery) -> Result<SearchPage, SourceError> {
        self.record("search");
        let guard = self.search_response.lock().unwrap();
        Ok(guard.clone().unwrap_or_default())
    }

    async fn download_card(&self, _request: &CardDownloadRequest) -> Result<Vec<u8>, SourceError> {
        self.record("download");
        Ok(self.card_image.lock().unwrap().clone())
    }

    async fn gallery(&self, _query: &GalleryQuery) -> Result<GalleryPage, SourceError> {
        self.record("gallery");
        if let Some(status) = *self.gallery_status.lock().unwrap() {
            return Err(SourceError::Api {
                status,
                detail: ApiDetail::Text("gallery unavailable".to_string()),
            });
        }
        let guard = self.gallery_response.lock().unwrap();
        Ok(guard.clone().unwrap_or_default())
    }

    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.record(format!("asset:{}", url));
        let guard = self.assets.lock().unwrap();
        match guard.get(url) {
            Some(AssetResponse::Body(bytes)) => Ok(bytes.clone()),
            Some(AssetResponse::Status(status)) => Err(SourceError::Api {
                status: *status,
                detail: ApiDetail::Text(String::new()),
            }),
            Some(AssetResponse::Unreachable) => Err(SourceError::Network(format!(
                "Failed to fetch {}: connection refused",
                url
            ))),
            None => Err(SourceError::Api {
                status: 404,
                detail: ApiDetail::Text("not found".to_string()),
            }),
        }
    }
}

/// Helper function to create a mock card for testing.
pub fn make_card(id: u64, name: &str) -> CardRecord {
    let slug = name.to_lowercase().replace(' ', "-");
    CardBuilder::new(id, format!("tester/{}", slug), name)
        .description(format!("About {}", name))
        .build()
}
