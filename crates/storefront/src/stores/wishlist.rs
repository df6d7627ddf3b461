//! Wishlist store with a local fallback.
//!
//! Authenticated visitors use the server wishlist. When that fails, or when no
//! one is logged in, the list under the local `wishlist` key is used instead.
//! The two lists are never merged.

use freshmart_core::ProductId;
use tracing::{debug, instrument, warn};

use crate::api::{Api, Product, WishlistItem};
use crate::storage::{KeyValueStore, StorageError, keys, load_json, save_json};

/// Notice shown when an authenticated visitor is served from local storage.
pub const DEGRADED_NOTICE: &str = "API unavailable - using local storage";

/// Notice shown to anonymous visitors.
pub const LOCAL_NOTICE: &str = "Login to sync with cloud";

/// A result tagged with the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sourced<T> {
    /// Served by the server.
    Remote(T),
    /// Served from local storage. `degraded` is set when the server was
    /// tried and failed.
    Local { data: T, degraded: bool },
}

impl<T> Sourced<T> {
    /// The wrapped value.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Remote(data) | Self::Local { data, .. } => data,
        }
    }

    #[must_use]
    pub const fn data(&self) -> &T {
        match self {
            Self::Remote(data) | Self::Local { data, .. } => data,
        }
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The notice to show alongside the data, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Remote(_) => None,
            Self::Local { degraded: true, .. } => Some(DEGRADED_NOTICE),
            Self::Local {
                degraded: false, ..
            } => Some(LOCAL_NOTICE),
        }
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        match self {
            Self::Remote(data) => Sourced::Remote(f(data)),
            Self::Local { data, degraded } => Sourced::Local {
                data: f(data),
                degraded,
            },
        }
    }
}

/// The wishlist of one visitor.
#[derive(Debug, Clone)]
pub struct WishlistStore<S> {
    api: Api<S>,
}

impl<S: KeyValueStore> WishlistStore<S> {
    #[must_use]
    pub const fn new(api: Api<S>) -> Self {
        Self { api }
    }

    /// Whether the server wishlist is tried first.
    pub async fn is_authenticated(&self) -> bool {
        self.api.token().await.is_some()
    }

    /// All wishlist items.
    #[instrument(skip(self))]
    pub async fn get_items(&self) -> Sourced<Vec<WishlistItem>> {
        let degraded = if self.is_authenticated().await {
            match self.api.get_wishlist().await {
                Ok(items) => return Sourced::Remote(items),
                Err(e) => {
                    warn!(error = %e, "Wishlist API failed; using local storage");
                    true
                }
            }
        } else {
            false
        };

        Sourced::Local {
            data: self.local_items().await,
            degraded,
        }
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns an error only when the local fallback cannot be written.
    #[instrument(skip_all, fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product) -> Result<Sourced<String>, StorageError> {
        self.add_item(WishlistItem::from(product)).await
    }

    /// Add a product snapshot.
    ///
    /// Locally, an id already present is not inserted again.
    ///
    /// # Errors
    ///
    /// Returns an error only when the local fallback cannot be written.
    #[instrument(skip_all, fields(product_id = %item.id))]
    pub async fn add_item(&self, item: WishlistItem) -> Result<Sourced<String>, StorageError> {
        let degraded = if self.is_authenticated().await {
            match self.api.add_to_wishlist(&item.id).await {
                Ok(message) => return Ok(Sourced::Remote(message)),
                Err(e) => {
                    warn!(error = %e, "Wishlist API add failed; writing local storage");
                    true
                }
            }
        } else {
            false
        };

        let mut items = self.local_items().await;
        if items.iter().any(|i| i.id == item.id) {
            debug!("Already in local wishlist");
        } else {
            items.push(item);
            self.save_local(&items, degraded).await?;
        }

        let message = if degraded {
            "Product added to local wishlist (API unavailable)"
        } else {
            "Product added to local wishlist"
        };
        Ok(Sourced::Local {
            data: message.to_string(),
            degraded,
        })
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns an error only when the local fallback cannot be written.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<Sourced<String>, StorageError> {
        let degraded = if self.is_authenticated().await {
            match self.api.remove_from_wishlist(product_id).await {
                Ok(message) => return Ok(Sourced::Remote(message)),
                Err(e) => {
                    warn!(error = %e, "Wishlist API remove failed; writing local storage");
                    true
                }
            }
        } else {
            false
        };

        let mut items = self.local_items().await;
        items.retain(|i| &i.id != product_id);
        self.save_local(&items, degraded).await?;

        let message = if degraded {
            "Product removed from local wishlist (API unavailable)"
        } else {
            "Product removed from local wishlist"
        };
        Ok(Sourced::Local {
            data: message.to_string(),
            degraded,
        })
    }

    /// Whether `product_id` is in the wishlist. Reads the whole list each time.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn is_in_wishlist(&self, product_id: &ProductId) -> Sourced<bool> {
        self.get_items()
            .await
            .map(|items| items.iter().any(|i| &i.id == product_id))
    }

    async fn local_items(&self) -> Vec<WishlistItem> {
        load_json(self.api.storage(), keys::WISHLIST)
            .await
            .unwrap_or_default()
    }

    async fn save_local(&self, items: &[WishlistItem], degraded: bool) -> Result<(), StorageError> {
        if degraded {
            // No reconciliation happens later; the server copy now differs.
            warn!(
                size = items.len(),
                "Local wishlist diverging from server while logged in"
            );
        }
        save_json(self.api.storage(), keys::WISHLIST, &items).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::ApiConfig;
    use crate::storage::MemoryStorage;
    use rust_decimal::Decimal;

    fn store() -> (WishlistStore<MemoryStorage>, MemoryStorage) {
        let client = ApiClient::new(&ApiConfig::with_base_url("http://127.0.0.1:9")).unwrap();
        let storage = MemoryStorage::new();
        (WishlistStore::new(Api::new(client, storage.clone())), storage)
    }

    fn item(id: &str) -> WishlistItem {
        WishlistItem {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Decimal::from(12),
            image_cover: None,
            images: vec![],
            category: None,
            brand: None,
        }
    }

    #[tokio::test]
    async fn test_anonymous_add_is_local_and_deduplicated() {
        let (wishlist, _) = store();

        let first = wishlist.add_item(item("p1")).await.unwrap();
        assert_eq!(first.notice(), Some(LOCAL_NOTICE));
        wishlist.add_item(item("p1")).await.unwrap();
        wishlist.add_item(item("p2")).await.unwrap();

        let items = wishlist.get_items().await;
        assert!(!items.is_remote());
        let ids: Vec<&str> = items.data().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_remove_local() {
        let (wishlist, _) = store();
        wishlist.add_item(item("p1")).await.unwrap();
        wishlist.add_item(item("p2")).await.unwrap();

        wishlist.remove(&ProductId::new("p1")).await.unwrap();

        let items = wishlist.get_items().await.into_inner();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_str(), "p2");
    }

    #[tokio::test]
    async fn test_malformed_local_wishlist_reads_empty() {
        let (wishlist, storage) = store();
        storage.set(keys::WISHLIST, "{oops").await.unwrap();

        assert!(wishlist.get_items().await.data().is_empty());
        assert!(!wishlist.is_in_wishlist(&ProductId::new("p1")).await.into_inner());
    }

    #[tokio::test]
    async fn test_authenticated_unreachable_api_degrades() {
        let (wishlist, storage) = store();
        storage.set(keys::TOKEN, "abc").await.unwrap();

        let added = wishlist.add_item(item("p1")).await.unwrap();
        assert_eq!(added.notice(), Some(DEGRADED_NOTICE));

        let items = wishlist.get_items().await;
        assert_eq!(
            items.notice(),
            Some("API unavailable - using local storage")
        );
        assert_eq!(items.data().len(), 1);
    }
}
