//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;

use crate::api::{Api, ApiClient, ClientBuildError};
use crate::config::StorefrontConfig;
use crate::storage::SessionStorage;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds configuration and the shared API
/// transport; per-visitor state lives in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    client: ApiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ClientBuildError> {
        let client = ApiClient::new(&config.api)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, client }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shared API transport.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// The API bound to one visitor's session.
    #[must_use]
    pub fn api(&self, session: Session) -> Api<SessionStorage> {
        Api::new(self.inner.client.clone(), SessionStorage::new(session))
    }
}
