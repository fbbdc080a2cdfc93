//! Tether Apify Client
//!
//! A small, type-safe HTTP client for the Apify v2 API, used as the
//! [`tether_core::ProviderGateway`] of the Tether session core.
//!
//! The API token is held by the client instance only and sent as a bearer
//! token on every request.
//!
//! # Example
//!
//! ```no_run
//! use tether_client::ApifyClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApifyClient::new("apify_api_xxx");
//!
//!     for actor in client.list_actors().await? {
//!         println!("{} {}", actor.id, actor.name);
//!     }
//!     Ok(())
//! }
//! ```

mod actors;
pub mod error;
mod gateway;
mod models;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use models::map_status;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::models::Envelope;

/// Public Apify API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.apify.com";

/// HTTP client for the Apify API
///
/// Methods are grouped into:
/// - Actor catalog (list, get with input schema sources)
/// - Run lifecycle (start, status, dataset items)
#[derive(Clone)]
pub struct ApifyClient {
    /// Base URL of the API (e.g., "https://api.apify.com")
    base_url: String,
    /// API token sent as bearer credential
    token: String,
    /// HTTP client instance
    client: Client,
}

impl ApifyClient {
    /// Create a client for the public Apify API
    ///
    /// # Arguments
    /// * `token` - The Apify API token
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_client(DEFAULT_BASE_URL, token, Client::new())
    }

    /// Create a client with a custom base URL and HTTP client
    ///
    /// This allows pointing at a proxy and configuring timeouts, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use tether_client::ApifyClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ApifyClient::with_client("http://localhost:8080", "token", http_client);
    /// assert_eq!(client.base_url(), "http://localhost:8080");
    /// ```
    pub fn with_client(base_url: impl Into<String>, token: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize the raw JSON body
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error_message(&error_text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose payload is wrapped in `{ "data": ... }`
    async fn handle_data<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let envelope: Envelope<T> = self.handle_response(response).await?;
        Ok(envelope.data)
    }
}

impl std::fmt::Debug for ApifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApifyClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Extracts `error.message` from an Apify error body, or returns the body as is
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Encodes an id for use as one URL path segment
///
/// Actor ids may be given as `username/name`, which the API spells `username~name`.
fn path_segment(id: &str) -> String {
    id.replace('/', "~")
}
