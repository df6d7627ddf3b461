//! Shared HTTP transport for the commerce API.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder};
use thiserror::Error;

use crate::config::ApiConfig;

use super::cache::{CacheKey, CacheValue};

/// Errors building the HTTP client.
#[derive(Debug, Error)]
#[error("failed to build HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

// =============================================================================
// ApiClient
// =============================================================================

/// Connection pool, base URL and lookup cache shared by every [`Api`](super::Api).
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    image_base_url: String,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("cached", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("freshmart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// The API base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Resolve an image reference to an absolute URL.
    ///
    /// Absolute URLs pass through; relative paths are joined to the image host.
    #[must_use]
    pub fn image_url(&self, image: &str) -> String {
        resolve_image_url(&self.inner.image_base_url, image)
    }

    pub(super) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        self.inner.http.request(method, url)
    }

    // =========================================================================
    // Cache
    // =========================================================================

    pub(super) async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.as_ref()?.get(key).await;
        if value.is_some() {
            tracing::debug!(?key, "Cache hit");
        }
        value
    }

    pub(super) async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    /// Drop every cached lookup.
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
        }
    }
}

pub(crate) fn resolve_image_url(base: &str, image: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        image.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            image.trim_start_matches('/')
        )
    }
}
