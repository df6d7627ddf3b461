//! Persisted local state.
//!
//! A [`KeyValueStore`] is the storefront's equivalent of browser local storage:
//! a flat map of string keys to string values that outlives a single request or
//! command. Exactly three keys are used (see [`keys`]).
//!
//! # Backends
//!
//! - [`SessionStorage`] - one `tower-sessions` session per browser (web)
//! - [`FileStorage`] - a JSON object file on disk (cli)
//! - [`MemoryStorage`] - an in-process map (tests and ephemeral use)
//!
//! Values are stored as raw strings. Typed access goes through [`load_json`] and
//! [`save_json`]; malformed JSON on read is treated as absent.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

mod file;
mod memory;
mod session;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use session::SessionStorage;

/// Fixed storage keys.
pub mod keys {
    /// Raw bearer token of the logged-in user.
    pub const TOKEN: &str = "token";

    /// JSON-encoded user of the logged-in session.
    pub const USER: &str = "user";

    /// JSON array of wishlist product snapshots (local fallback).
    pub const WISHLIST: &str = "wishlist";
}

/// Errors writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the storage file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session backend rejected the operation.
    #[error("session storage error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A value could not be encoded as JSON.
    #[error("failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A string key-value store holding the client's persisted state.
///
/// Reads never fail: a backend that cannot read reports the key as absent.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Option<String>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Read and decode a JSON value, treating malformed JSON as absent.
pub async fn load_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore,
{
    let raw = store.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed stored value");
            None
        }
    }
}

/// Encode a value as JSON and store it.
///
/// # Errors
///
/// Returns an error if the value cannot be encoded or the backend rejects the write.
pub async fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + Sync,
    S: KeyValueStore,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_json_round_trips_through_store() {
        let store = MemoryStorage::new();
        save_json(&store, keys::WISHLIST, &vec!["a", "b"])
            .await
            .expect("save");

        let items: Option<Vec<String>> = load_json(&store, keys::WISHLIST).await;
        assert_eq!(items, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[tokio::test]
    async fn test_load_json_treats_malformed_as_absent() {
        let store = MemoryStorage::new();
        store.set(keys::USER, "{not json").await.expect("set");

        let user: Option<serde_json::Value> = load_json(&store, keys::USER).await;
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_load_json_missing_key() {
        let store = MemoryStorage::new();
        let value: Option<Vec<u8>> = load_json(&store, "missing").await;
        assert!(value.is_none());
    }
}
