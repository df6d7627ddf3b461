//! Wishlist remote/local fallback against the mock commerce API.

#![allow(clippy::unwrap_used)]

use freshmart_core::ProductId;
use freshmart_integration_tests::{EMAIL, MockCommerceApi, PASSWORD};
use freshmart_storefront::api::{Credentials, Product};
use freshmart_storefront::storage::{KeyValueStore, MemoryStorage, keys};
use freshmart_storefront::stores::{
    AuthStore, DEGRADED_NOTICE, LOCAL_NOTICE, OptimisticToggles, Sourced, WishlistStore,
};
use secrecy::SecretString;

async fn login(mock: &MockCommerceApi, storage: &MemoryStorage) {
    AuthStore::new(mock.api(storage.clone()))
        .login(&Credentials {
            email: EMAIL.to_string(),
            password: SecretString::from(PASSWORD),
        })
        .await
        .unwrap();
}

async fn product(mock: &MockCommerceApi, id: &str) -> Product {
    mock.api(MemoryStorage::new())
        .get_product(&ProductId::new(id))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_remote_wishlist_when_logged_in() {
    let mock = MockCommerceApi::start().await;
    let storage = MemoryStorage::new();
    login(&mock, &storage).await;
    let wishlist = WishlistStore::new(mock.api(storage.clone()));

    let outcome = wishlist.add(&product(&mock, "tea").await).await.unwrap();

    assert!(outcome.is_remote());
    assert_eq!(mock.server_wishlist(), vec!["tea"]);
    let items = wishlist.get_items().await;
    assert!(items.is_remote());
    assert_eq!(items.data().first().unwrap().title, "Green Tea");
    assert!(!storage.contains(keys::WISHLIST));
}

#[tokio::test]
async fn test_api_failure_falls_back_to_local_without_duplicates() {
    let mock = MockCommerceApi::start().await;
    let storage = MemoryStorage::new();
    login(&mock, &storage).await;
    mock.set_wishlist_down(true);
    let wishlist = WishlistStore::new(mock.api(storage.clone()));
    let tea = product(&mock, "tea").await;

    let first = wishlist.add(&tea).await.unwrap();
    wishlist.add(&tea).await.unwrap();

    assert_eq!(first.notice(), Some(DEGRADED_NOTICE));
    let items = wishlist.get_items().await;
    assert!(matches!(items, Sourced::Local { degraded: true, .. }));
    assert_eq!(items.data().len(), 1);
    assert_eq!(items.data().first().unwrap().id, ProductId::new("tea"));
    assert!(mock.server_wishlist().is_empty());
}

#[tokio::test]
async fn test_local_wishlist_is_not_merged_when_api_recovers() {
    let mock = MockCommerceApi::start().await;
    let storage = MemoryStorage::new();
    login(&mock, &storage).await;
    let wishlist = WishlistStore::new(mock.api(storage.clone()));

    mock.set_wishlist_down(true);
    wishlist.add(&product(&mock, "milk").await).await.unwrap();
    mock.set_wishlist_down(false);

    let items = wishlist.get_items().await;
    assert!(items.is_remote());
    assert!(items.data().is_empty());
    assert!(storage.contains(keys::WISHLIST));
}

#[tokio::test]
async fn test_logged_out_uses_local_storage() {
    let mock = MockCommerceApi::start().await;
    let storage = MemoryStorage::new();
    let wishlist = WishlistStore::new(mock.api(storage.clone()));

    let outcome = wishlist.add(&product(&mock, "choc").await).await.unwrap();
    assert_eq!(outcome.notice(), Some(LOCAL_NOTICE));
    assert!(
        *wishlist
            .is_in_wishlist(&ProductId::new("choc"))
            .await
            .data()
    );

    wishlist.remove(&ProductId::new("choc")).await.unwrap();
    assert!(wishlist.get_items().await.data().is_empty());
    assert!(mock.requests_to("GET", "/wishlist").is_empty());
}

#[tokio::test]
async fn test_malformed_local_wishlist_reads_as_empty() {
    let mock = MockCommerceApi::start().await;
    let storage = MemoryStorage::new();
    storage.set(keys::WISHLIST, "{\"oops\":").await.unwrap();
    let wishlist = WishlistStore::new(mock.api(storage));

    assert!(wishlist.get_items().await.data().is_empty());
}

#[tokio::test]
async fn test_failed_toggle_reverts_only_that_product() {
    let mock = MockCommerceApi::start().await;
    let storage = MemoryStorage::new();
    let wishlist = WishlistStore::new(mock.api(storage));
    let toggles = OptimisticToggles::new();
    toggles.set(ProductId::new("milk"), true);

    // A product the API does not know cannot be snapshotted.
    let result = toggles
        .toggle(ProductId::new("ghost"), |wished| {
            let wishlist = wishlist.clone();
            let api = mock.api(MemoryStorage::new());
            async move {
                if wished {
                    let product = api
                        .get_product(&ProductId::new("ghost"))
                        .await
                        .map_err(|e| e.to_string())?;
                    wishlist.add(&product).await.map_err(|e| e.to_string())?;
                }
                Ok::<_, String>(())
            }
        })
        .await;

    assert!(result.is_err());
    assert!(!toggles.get(&ProductId::new("ghost")));
    assert!(toggles.get(&ProductId::new("milk")));
}
