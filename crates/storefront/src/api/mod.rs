//! Commerce REST API client.
//!
//! # Architecture
//!
//! - [`ApiClient`] owns the `reqwest` connection pool, the base URL and an
//!   in-memory `moka` cache for read-only lookups (brands, product details).
//!   It is cheap to clone and shared by every request.
//! - [`Api`] binds an `ApiClient` to one [`KeyValueStore`], the holder of the
//!   visitor's persisted session. Every call reads the token from storage and
//!   sends it as `Authorization: Bearer <token>` plus a raw `token` header. A
//!   401 response clears the persisted session before the error is returned.
//! - Raw JSON is decoded into tolerant wire types (`wire`) and converted into
//!   the domain types in [`types`].
//!
//! The remote API is the source of truth: nothing here merges or reconciles
//! state; callers re-read after every mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! use freshmart_storefront::api::{Api, ApiClient};
//! use freshmart_storefront::storage::MemoryStorage;
//!
//! let client = ApiClient::new(&config.api)?;
//! let api = Api::new(client, MemoryStorage::new());
//!
//! let page = api.list_products(&ProductQuery::default()).await?;
//! let product = api.get_product(&page.products[0].id).await?;
//! ```

mod auth;
mod brands;
mod cache;
mod cart;
mod client;
mod conversions;
mod products;
pub mod types;
mod wire;
mod wishlist;

pub use client::{ApiClient, ClientBuildError};
pub use types::*;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::storage::{KeyValueStore, keys};

use wire::ErrorBody;

/// Header carrying the raw token for endpoints that do not read `Authorization`.
pub const TOKEN_HEADER: &str = "token";

/// Errors returned by commerce API calls.
///
/// `Display` is the human-readable message shown to shoppers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("Network error. Please check your connection and try again.")]
    Network(#[source] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a generic one.
        message: String,
    },

    /// The API rejected the session (401). Persisted session state was cleared.
    #[error("{0}")]
    Unauthorized(String),

    /// The requested resource does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// The response body was not the expected JSON.
    #[error("Unexpected response from the store. Please try again.")]
    Decode(#[source] serde_json::Error),

    /// Input was rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::Network(_) | Self::Decode(_) | Self::Validation(_) => None,
        }
    }

    /// Whether the failure came from the transport rather than the API.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// The API client bound to one visitor's persisted state.
#[derive(Debug, Clone)]
pub struct Api<S> {
    client: ApiClient,
    storage: S,
}

impl<S: KeyValueStore> Api<S> {
    /// Bind `client` to `storage`.
    #[must_use]
    pub const fn new(client: ApiClient, storage: S) -> Self {
        Self { client, storage }
    }

    /// The shared transport.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The visitor's persisted state.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// The persisted bearer token, if any.
    pub async fn token(&self) -> Option<SecretString> {
        self.storage
            .get(keys::TOKEN)
            .await
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }

    /// Remove the persisted token and user.
    ///
    /// Failures are logged and otherwise ignored: a half-cleared session still
    /// reads as logged out because both keys are required.
    pub async fn clear_session(&self) {
        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key).await {
                tracing::error!(key, error = %e, "Failed to clear session key");
            }
        }
    }

    /// Send a request built by `build`, attaching the persisted token.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder + Send,
    ) -> Result<T, ApiError> {
        let mut request = self.client.request(method.clone(), path);
        if let Some(token) = self.token().await {
            let token = token.expose_secret();
            request = request.bearer_auth(token).header(TOKEN_HEADER, token);
        }

        let response = build(request).send().await.map_err(|e| {
            tracing::error!(%method, path, error = %e, "Network error");
            ApiError::Network(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::Network)?;

        if !status.is_success() {
            let message = error_message(&body)
                .unwrap_or_else(|| default_status_message(status).to_string());
            tracing::warn!(%method, path, status = status.as_u16(), %message, "API request failed");

            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    // Strip the session; callers observe the logged-out state.
                    self.clear_session().await;
                    ApiError::Unauthorized(message)
                }
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                %method,
                path,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to decode API response"
            );
            ApiError::Decode(e)
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::GET, path, |r| r).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        self.execute(method, path, move |r| r.json(&body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::DELETE, path, |r| r).await
    }
}

/// Extract the server's message from an error body.
///
/// The API reports failures either as `{"message": "..."}` or, for validation
/// errors, as `{"message": "fail", "errors": {"msg": "..."}}`.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let detail = parsed.errors.and_then(|e| e.msg);
    match parsed.message {
        Some(message) if !message.is_empty() && message != "fail" => Some(message),
        _ => detail.filter(|m| !m.is_empty()),
    }
}

const fn default_status_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        401 => "Your session has expired. Please log in again.",
        404 => "The requested item was not found.",
        400..=499 => "The request was rejected. Please check your input.",
        _ => "The store is unavailable right now. Please try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_message() {
        let body = r#"{"statusMsg":"fail","message":"Incorrect email or password"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Incorrect email or password")
        );
    }

    #[test]
    fn test_error_message_falls_back_to_validation_detail() {
        let body = r#"{"message":"fail","errors":{"value":"x","msg":"Invalid email","param":"email"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Invalid email"));
    }

    #[test]
    fn test_error_message_non_json() {
        assert!(error_message("<html>Bad gateway</html>").is_none());
    }

    #[test]
    fn test_api_error_display_is_message() {
        let err = ApiError::Status {
            status: 400,
            message: "Coupon is invalid".to_string(),
        };
        assert_eq!(err.to_string(), "Coupon is invalid");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_default_status_messages() {
        assert_eq!(
            default_status_message(StatusCode::BAD_GATEWAY),
            "The store is unavailable right now. Please try again."
        );
        assert!(default_status_message(StatusCode::UNAUTHORIZED).contains("log in"));
    }
}
