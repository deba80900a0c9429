//! REST client for the storefront API service.
//!
//! # Architecture
//!
//! - The API service owns all persistence, business rules and payments
//! - Every response is decoded into an explicit wire contract (`wire`) and
//!   converted to one canonical `emporium_core` type at the boundary
//! - Products are cached in memory via `moka`; cart, order and payment data
//!   are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use emporium_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api);
//!
//! let product = client.get_product(&product_id).await?;
//! client.add_to_cart(&product.id, NonZeroU32::MIN).await?;
//! let items = client.fetch_cart().await?;
//! ```

mod auth;
mod cache;
mod cart;
mod catalog;
mod orders;
pub mod wire;

pub use auth::{AuthSession, Credentials, MIN_PASSWORD_LEN, NewAccount, PasswordChange};
pub use catalog::{NewProduct, ProductImage, ProductQuery};

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::ApiConfig;

use cache::{CacheKey, CacheValue};
use wire::{Envelope, ErrorBody};

/// Longest body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to the API service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, TLS, broken body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The session is missing or not allowed to do this (401/403).
    #[error("Unauthorized{}", detail(.0))]
    Unauthorized(Option<String>),

    /// The addressed resource does not exist (404).
    #[error("Not found{}", detail(.0))]
    NotFound(Option<String>),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("API returned {status}{}", detail(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response parsed but broke the agreed contract.
    #[error("Contract violation: {0}")]
    Contract(String),

    /// An endpoint URL could not be built from the configured base.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The request was refused before it was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Human-readable message supplied by the server, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message) | Self::NotFound(message) | Self::Status { message, .. } => {
                message.as_deref()
            }
            Self::InvalidInput(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Whether the failure means there is no usable session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map_or_else(String::new, |m| format!(": {m}"))
}

fn truncate(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; all clones share one connection pool and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.product_cache_capacity)
            .time_to_live(config.product_cache_ttl)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                cache,
            }),
        }
    }

    /// A client for the same service acting as the session behind `token`.
    ///
    /// The connection pool and product cache are shared with `self`.
    #[must_use]
    pub fn with_token(&self, token: SecretString) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: self.inner.client.clone(),
                base_url: self.inner.base_url.clone(),
                token: Some(token),
                cache: self.inner.cache.clone(),
            }),
        }
    }

    /// Whether requests carry a session token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.token.is_some()
    }

    /// Build an endpoint URL by appending path segments to the base URL.
    ///
    /// Segments are percent-encoded, so server-issued ids are safe to pass.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with authentication attached.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        let builder = self.inner.client.request(method, url);
        Ok(match &self.inner.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Send a request and return the body of a 2xx response.
    ///
    /// Non-success statuses are mapped to [`ApiError`] here.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            debug!(
                status = %status,
                body = %truncate(&body, LOG_BODY_LIMIT),
                "API returned non-success status"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        Ok(body)
    }

    /// Send a request and decode the response envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let body = self.send(request).await?;

        serde_json::from_str::<Envelope<T>>(&body).map_err(|e| {
            error!(
                error = %e,
                body = %truncate(&body, LOG_BODY_LIMIT),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose response payload is irrelevant.
    ///
    /// Any 2xx counts as success, with or without a body.
    async fn execute_unit(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let body = self.send(request).await?;
        debug!(body = %truncate(&body, LOG_BODY_LIMIT), "Request acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::new(Url::parse(base).unwrap()))
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("http://localhost:4000/api/v1");
        let url = client.endpoint(&["cart", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/v1/cart/abc");
    }

    #[test]
    fn test_endpoint_handles_trailing_slash_and_encoding() {
        let client = client("http://localhost:4000/api/");
        let url = client.endpoint(&["cart", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/cart/a%20b%2Fc");
    }

    #[test]
    fn test_error_display_includes_server_message() {
        let err = ApiError::Status {
            status: 409,
            message: Some("Insufficient stock".to_string()),
        };
        assert_eq!(err.to_string(), "API returned 409: Insufficient stock");
        assert_eq!(err.server_message(), Some("Insufficient stock"));
    }

    #[test]
    fn test_with_token_authenticates_and_shares_cache() {
        let anonymous = client("http://localhost:4000/api");
        assert!(!anonymous.is_authenticated());

        let signed_in = anonymous.with_token(SecretString::from("jwt-abc".to_string()));
        assert!(signed_in.is_authenticated());
        assert!(!anonymous.is_authenticated());
        assert_eq!(signed_in.inner.base_url, anonymous.inner.base_url);
        assert!(!format!("{signed_in:?}").contains("jwt-abc"));
    }

    #[test]
    fn test_error_display_without_message() {
        assert_eq!(ApiError::NotFound(None).to_string(), "Not found");
        assert_eq!(
            ApiError::Unauthorized(Some("  ".to_string())).to_string(),
            "Unauthorized"
        );
        assert_eq!(ApiError::RateLimited(60).server_message(), None);
        assert_eq!(
            ApiError::RateLimited(60).to_string(),
            "Rate limited, retry after 60 seconds"
        );
    }
}
