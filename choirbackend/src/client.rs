//! HTTP client for the backend-as-a-service
//!
//! The backend exposes three services under one base URL:
//! - `/rest/v1/{table}`: row-oriented record store (see [`crate::records`])
//! - `/storage/v1/object/{bucket}/...`: object storage (see [`crate::storage`])
//! - `/auth/v1/user`: the authenticated user (see [`crate::auth`])
//!
//! Every request carries the project API key; user-scoped requests also
//! carry the session access token as a bearer token.
//!
//! # Example
//!
//! ```no_run
//! use choirbackend::BackendClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BackendClient::builder()
//!         .base_url("https://project.example.co")
//!         .anon_key("public-anon-key")
//!         .access_token("user-session-jwt")
//!         .build()?;
//!
//!     let user = client.auth().current_user().await?;
//!     println!("Signed in as {}", user.email.unwrap_or_default());
//!     Ok(())
//! }
//! ```

use crate::auth::Auth;
use crate::error::{Error, Result};
use crate::records::Table;
use crate::storage::Bucket;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default backend base URL (local development stack)
pub const DEFAULT_BASE_URL: &str = "http://localhost:54321";

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "ChoirPortal/0.1 (choirbackend)";

/// Backend HTTP client
///
/// Cheap to clone: the underlying `reqwest::Client` shares its connection
/// pool between clones.
#[derive(Debug, Clone)]
pub struct BackendClient {
    pub(crate) client: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl BackendClient {
    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from the ChoirPortal configuration
    #[cfg(feature = "choirconfig")]
    pub fn from_config(config: &choirconfig::Config) -> Result<Self> {
        use crate::config_ext::BackendConfigExt;

        let mut builder = Self::builder()
            .base_url(config.get_backend_url()?)
            .anon_key(config.get_backend_anon_key()?)
            .timeout(Duration::from_secs(config.get_backend_timeout_secs()?));

        if let Some(token) = config.get_backend_access_token()? {
            builder = builder.access_token(token);
        }

        builder.build()
    }

    /// Get the base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true when a user session token is configured
    pub fn has_session(&self) -> bool {
        self.access_token.is_some()
    }

    /// Returns a copy of this client bound to another session token
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Handle on a record-store table
    pub fn table(&self, name: impl Into<String>) -> Table {
        Table::new(self.clone(), name)
    }

    /// Handle on an object-storage bucket
    pub fn bucket(&self, name: impl Into<String>) -> Bucket {
        Bucket::new(self.clone(), name)
    }

    /// Handle on the auth service
    pub fn auth(&self) -> Auth {
        Auth::new(self.clone())
    }

    /// Build an absolute URL from a service path (`/rest/v1/...`)
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request with the API key and bearer headers set
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and decode the JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let text = Self::check_status(response).await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            Error::Json(e)
        })
    }

    /// Send a request whose body is not needed
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Turns non-2xx responses into errors, returning the body text otherwise
    async fn check_status(response: Response) -> Result<String> {
        let status = response.status();
        debug!("Response status: {}", status);

        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }

        let message = Self::error_message(&text);
        warn!("Backend error ({}): {}", status.as_u16(), message);
        Err(Error::from_status_code(status.as_u16(), message))
    }

    /// Extracts the human-readable message of a backend error body
    ///
    /// The record store answers `{"message": ...}`, storage answers
    /// `{"error": ..., "message": ...}` and auth answers `{"msg": ...}` or
    /// `{"error_description": ...}`.
    pub(crate) fn error_message(body: &str) -> String {
        if let Ok(json) = serde_json::from_str::<Value>(body) {
            for key in ["message", "msg", "error_description", "error"] {
                if let Some(message) = json.get(key).and_then(|m| m.as_str()) {
                    return message.to_string();
                }
            }
        }
        if body.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            body.trim().to_string()
        }
    }
}

/// Builder for configuring a BackendClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    timeout: Duration,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            anon_key: String::new(),
            access_token: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the project API key
    pub fn anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = key.into();
        self
    }

    /// Set the user session token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<BackendClient> {
        // Reject malformed base URLs early rather than on the first request
        url::Url::parse(&self.base_url)?;

        let client = if let Some(client) = self.client {
            client
        } else {
            Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout)
                .build()?
        };

        Ok(BackendClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            anon_key: self.anon_key,
            access_token: self.access_token.filter(|t| !t.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();
        assert_eq!(builder.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            builder.timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert!(builder.access_token.is_none());
    }

    #[test]
    fn test_build_trims_trailing_slash() {
        let client = BackendClient::builder()
            .base_url("https://example.co/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://example.co");
        assert_eq!(client.url("/rest/v1/music"), "https://example.co/rest/v1/music");
    }

    #[test]
    fn test_build_rejects_bad_url() {
        let result = BackendClient::builder().base_url("not a url").build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_blank_token_is_no_session() {
        let client = BackendClient::builder().access_token("  ").build().unwrap();
        assert!(!client.has_session());
        assert!(client.with_access_token("jwt").has_session());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            BackendClient::error_message(r#"{"code":"23505","message":"duplicate key"}"#),
            "duplicate key"
        );
        assert_eq!(
            BackendClient::error_message(r#"{"msg":"invalid JWT"}"#),
            "invalid JWT"
        );
        assert_eq!(
            BackendClient::error_message(r#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#),
            "Object not found"
        );
        assert_eq!(BackendClient::error_message("plain failure"), "plain failure");
        assert_eq!(BackendClient::error_message(""), "Unknown error");
    }
}
