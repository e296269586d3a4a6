//! Chub.ai card source implementation.
//!
//! Talks to the public Chub.ai API. A bearer token (the browser's
//! `URQL_TOKEN`) is optional and unlocks private and NSFL cards.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{CardDownloadRequest, GalleryPage, GalleryQuery, SearchPage, SearchQuery};
use crate::sources::{ApiDetail, CardSource, SourceError};
use crate::utils::HttpClient;

pub const CHUB_API_BASE: &str = "https://api.chub.ai/api";

/// Chub.ai card source
#[derive(Clone)]
pub struct ChubSource {
    client: Arc<HttpClient>,
    base_url: String,
    api_token: Option<String>,
}

impl std::fmt::Debug for ChubSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChubSource")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ChubSource {
    /// Anonymous source against the public API
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: CHUB_API_BASE.to_string(),
            api_token: None,
        })
    }

    /// Build a source from the settings read at the start of an operation
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::with_user_agent(&config.api.user_agent)?;
        Ok(Self {
            client: Arc::new(client),
            base_url: CHUB_API_BASE.to_string(),
            api_token: None,
        }
        .with_base_url(config.api.base_url.as_str())
        .with_token(config.settings.api_token()))
    }

    /// Point the source at another API root (mock servers, mirrors)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Attach a bearer token; blank tokens are ignored
    pub fn with_token<S: AsRef<str>>(mut self, token: Option<S>) -> Self {
        self.api_token = token
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, turning transport failures into [`SourceError::Network`]
    /// and non-2xx statuses into [`SourceError::Api`].
    async fn send(request: RequestBuilder, what: &str) -> Result<Response, SourceError> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to {}: {}", what, e)))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(response)
    }

    async fn api_error(response: Response) -> SourceError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        SourceError::Api {
            status,
            detail: ApiDetail::from_body(&text),
        }
    }

    async fn json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, SourceError> {
        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse {} response: {}", what, e)))
    }
}

#[async_trait]
impl CardSource for ChubSource {
    fn id(&self) -> &str {
        "chub"
    }

    fn has_credentials(&self) -> bool {
        self.api_token.is_some()
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SourceError> {
        let url = self.endpoint("/characters/search");
        tracing::debug!(url = %url, search = %query.search, "searching cards");

        let request = self
            .client
            .client()
            .get(&url)
            .query(&query.to_params())
            .header(ACCEPT, "application/json");

        let response = Self::send(self.authorize(request), "search cards").await?;
        Self::json(response, "search").await
    }

    async fn download_card(&self, request: &CardDownloadRequest) -> Result<Vec<u8>, SourceError> {
        let url = self.endpoint("/characters/download");
        tracing::debug!(url = %url, full_path = %request.full_path, "downloading card image");

        let builder = self
            .client
            .client()
            .post(&url)
            .header(ACCEPT, "*/*")
            .header(CONTENT_TYPE, "application/json")
            .json(request);

        let response = Self::send(self.authorize(builder), "download card").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read card image: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn gallery(&self, query: &GalleryQuery) -> Result<GalleryPage, SourceError> {
        let url = self.endpoint(&format!("/gallery/project/{}", query.project_id));
        tracing::debug!(url = %url, "listing gallery");

        let request = self
            .client
            .client()
            .get(&url)
            .query(&query.to_params())
            .header(ACCEPT, "application/json");

        let response = Self::send(self.authorize(request), "fetch gallery").await?;
        Self::json(response, "gallery").await
    }

    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch {}: {}", url, e)))?;

        if response.status() != StatusCode::OK {
            return Err(Self::api_error(response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn source_for(server: &mockito::ServerGuard) -> ChubSource {
        ChubSource::new().unwrap().with_base_url(server.url())
    }

    #[test]
    fn test_source_creation() {
        let source = ChubSource::new().unwrap();
        assert_eq!(source.base_url(), CHUB_API_BASE);
        assert!(!source.has_credentials());
    }

    #[test]
    fn test_blank_token_ignored() {
        let source = ChubSource::new().unwrap().with_token(Some("   "));
        assert!(!source.has_credentials());

        let source = ChubSource::new().unwrap().with_token(Some(" abc "));
        assert!(source.has_credentials());
        assert!(!format!("{:?}", source).contains("abc"));
    }

    #[tokio::test]
    async fn test_search_sends_expected_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/characters/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search".into(), "Aria Test".into()),
                Matcher::UrlEncoded("nsfw".into(), "true".into()),
                Matcher::UrlEncoded("nsfl".into(), "true".into()),
                Matcher::UrlEncoded("first".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("sort".into(), "created_at".into()),
                Matcher::UrlEncoded("asc".into(), "false".into()),
            ]))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "count": 1,
                    "nodes": [{"id": 5, "fullPath": "me/aria-test", "name": "Aria Test"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let source = source_for(&server).with_token(Some("secret"));
        let page = source.search(&SearchQuery::new("Aria Test")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.count, 1);
        assert_eq!(page.nodes[0].full_path, "me/aria-test");
    }

    #[tokio::test]
    async fn test_search_without_token_sends_no_auth_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/characters/search")
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"count": 0, "nodes": []}"#)
            .create_async()
            .await;

        let page = source_for(&server)
            .search(&SearchQuery::new("nobody"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.count, 0);
    }

    #[tokio::test]
    async fn test_api_error_with_json_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/characters/search")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"detail": "bad token"}"#)
            .create_async()
            .await;

        let err = source_for(&server)
            .search(&SearchQuery::new("x"))
            .await
            .unwrap_err();

        match err {
            SourceError::Api { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, ApiDetail::Json(json!({"detail": "bad token"})));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_error_with_text_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/characters/search")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = source_for(&server)
            .search(&SearchQuery::new("x"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("Response Content: Bad Gateway"));
    }

    #[tokio::test]
    async fn test_download_posts_card_spec_body() {
        let mut server = mockito::Server::new_async().await;
        let png = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        let mock = server
            .mock("POST", "/characters/download")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "format": "card_spec_v2",
                "fullPath": "me/aria-test",
                "version": "main"
            })))
            .with_status(200)
            .with_body(png.clone())
            .create_async()
            .await;

        let bytes = source_for(&server)
            .download_card(&CardDownloadRequest::card_spec_v2("me/aria-test"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, png);
    }

    #[tokio::test]
    async fn test_gallery_listing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/gallery/project/42")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("nsfw".into(), "true".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("limit".into(), "24".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"count": 1, "nodes": [{"primary_image_path": "http://x/g1.jpg"}]}"#)
            .create_async()
            .await;

        let page = source_for(&server)
            .gallery(&GalleryQuery::new(42))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.nodes[0].primary_image_path, "http://x/g1.jpg");
    }

    #[tokio::test]
    async fn test_fetch_asset_is_anonymous_and_requires_200() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/img/ok.jpg")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("jpeg-bytes")
            .create_async()
            .await;
        server
            .mock("GET", "/img/moved.jpg")
            .with_status(204)
            .create_async()
            .await;

        let source = source_for(&server).with_token(Some("secret"));

        let ok = source
            .fetch_asset(&format!("{}/img/ok.jpg", server.url()))
            .await
            .unwrap();
        assert_eq!(ok, b"jpeg-bytes");

        let err = source
            .fetch_asset(&format!("{}/img/moved.jpg", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(204));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let source = ChubSource::new()
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = source.search(&SearchQuery::new("x")).await.unwrap_err();
        assert!(matches!(err, SourceError::Network(_)));
    }
}
