//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;

use crate::sources::SourceError;

/// User agent sent when the configuration does not override it
pub const DEFAULT_USER_AGENT: &str = concat!("ChubCardDownloader/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client.
///
/// No request or connect timeout is configured: downloads rely on the
/// transport defaults and are never retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent
    pub fn new() -> Result<Self, SourceError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent() {
        assert!(DEFAULT_USER_AGENT.starts_with("ChubCardDownloader/"));
    }

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new().is_ok());
        assert!(HttpClient::with_user_agent("custom/1.0").is_ok());
    }
}
