//! Session-backed storage for the web storefront.
//!
//! Each browser gets its own `tower-sessions` session, so the three persisted
//! keys live per visitor exactly as they would in the visitor's local storage.

use tower_sessions::Session;

use super::{KeyValueStore, StorageError};

/// [`KeyValueStore`] over the current request's session.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    session: Session,
}

impl SessionStorage {
    /// Wrap the session extracted for this request.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The wrapped session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl KeyValueStore for SessionStorage {
    async fn get(&self, key: &str) -> Option<String> {
        match self.session.get::<String>(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read session value");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.session.insert(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.session.remove_value(key).await?;
        Ok(())
    }
}
