//! Listing, search debounce and pagination against the mock commerce API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use freshmart_core::{BrandId, ProductId, ProductSort};
use freshmart_integration_tests::{MockCommerceApi, PRODUCT_COUNT};
use freshmart_storefront::storage::MemoryStorage;
use freshmart_storefront::stores::{ListingState, debounce};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

const PAGE_SIZE: u32 = 12;

fn product_queries(mock: &MockCommerceApi) -> Vec<std::collections::HashMap<String, String>> {
    mock.requests_to("GET", "/products")
        .into_iter()
        .map(|r| r.query)
        .collect()
}

#[tokio::test]
async fn test_listing_derives_pages_from_results() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());
    let mut listing = ListingState::new(PAGE_SIZE);

    listing.fetch(&api).await;

    assert_eq!(listing.results(), PRODUCT_COUNT as u64);
    assert_eq!(listing.total_pages(), 3);
    assert_eq!(listing.products().len(), PAGE_SIZE as usize);
    assert_eq!(listing.showing_range(), (1, 12));
    assert!(!listing.has_previous());
    assert!(listing.has_next());
}

#[tokio::test]
async fn test_last_page_disables_next() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());
    let mut listing = ListingState::new(PAGE_SIZE);

    listing.set_page(3);
    listing.fetch(&api).await;

    assert_eq!(listing.products().len(), 6);
    assert_eq!(listing.showing_range(), (25, 30));
    assert!(!listing.has_next());
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());
    let mut listing = ListingState::new(PAGE_SIZE);

    listing.set_page(9);
    listing.fetch(&api).await;

    assert!(listing.products().is_empty());
    assert!(listing.error().is_none());
    assert!(!listing.has_next());
    assert_eq!(listing.showing_range(), (0, 0));
}

#[tokio::test]
async fn test_sort_change_resets_to_first_page() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());
    let mut listing = ListingState::new(PAGE_SIZE);
    listing.set_page(3);
    listing.fetch(&api).await;

    listing.set_sort(ProductSort::PriceDesc);
    listing.fetch(&api).await;

    let last = product_queries(&mock).pop().unwrap();
    assert_eq!(last.get("page").map(String::as_str), Some("1"));
    assert_eq!(last.get("sort").map(String::as_str), Some("-price"));
    assert_eq!(
        listing.products().first().unwrap().id,
        ProductId::new("p26")
    );
}

#[tokio::test]
async fn test_search_change_resets_to_first_page() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());
    let mut listing = ListingState::new(PAGE_SIZE);
    listing.set_page(3);

    listing.set_search("milk");
    listing.fetch(&api).await;

    let last = product_queries(&mock).pop().unwrap();
    assert_eq!(last.get("page").map(String::as_str), Some("1"));
    assert_eq!(last.get("keyword").map(String::as_str), Some("milk"));
    assert_eq!(listing.results(), 2);
    assert_eq!(listing.total_pages(), 1);
}

#[tokio::test]
async fn test_filters_reach_the_api() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());
    let mut listing = ListingState::new(PAGE_SIZE);

    listing.set_brand(Some(BrandId::new("b1")));
    listing.set_price_range(Some(Decimal::from(20)), Some(Decimal::from(80)));
    listing.fetch(&api).await;

    let last = product_queries(&mock).pop().unwrap();
    assert_eq!(last.get("brand").map(String::as_str), Some("b1"));
    assert_eq!(last.get("price[gte]").map(String::as_str), Some("20"));
    assert_eq!(last.get("price[lte]").map(String::as_str), Some("80"));
}

#[tokio::test]
async fn test_debounced_typing_fetches_once_for_final_query() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());
    let mut listing = ListingState::new(PAGE_SIZE);

    let (tx, rx) = mpsc::channel(8);
    let mut queries = debounce(Duration::from_millis(200), rx);
    for typed in ["m", "mi", "mil", "milk"] {
        tx.send(typed.to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let query = queries.recv().await.unwrap();
    listing.set_search(query);
    listing.fetch(&api).await;
    drop(tx);
    assert!(queries.recv().await.is_none());

    let keywords: Vec<String> = product_queries(&mock)
        .into_iter()
        .filter_map(|q| q.get("keyword").cloned())
        .collect();
    assert_eq!(keywords, vec!["milk"]);
    assert_eq!(listing.results(), 2);
}

#[tokio::test]
async fn test_unreachable_api_shows_retryable_error() {
    let mock = MockCommerceApi::start().await;
    let client = freshmart_storefront::api::ApiClient::new(
        &freshmart_storefront::config::ApiConfig::with_base_url("http://127.0.0.1:9"),
    )
    .unwrap();
    let api = freshmart_storefront::api::Api::new(client, MemoryStorage::new());
    let mut listing = ListingState::new(PAGE_SIZE);

    listing.fetch(&api).await;

    assert_eq!(
        listing.error(),
        Some("Failed to load products. Please try again.")
    );
    assert!(listing.products().is_empty());
    assert_eq!(listing.total_pages(), 1);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_product_lookups_are_cached() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());

    api.list_brands().await.unwrap();
    let brands = api.list_brands().await.unwrap();
    assert_eq!(brands.len(), 2);
    assert_eq!(mock.requests_to("GET", "/brands").len(), 1);

    api.client().invalidate_cache();
    api.list_brands().await.unwrap();
    assert_eq!(mock.requests_to("GET", "/brands").len(), 2);
}

#[tokio::test]
async fn test_single_brand_lookup_is_cached() {
    let mock = MockCommerceApi::start().await;
    let api = mock.api(MemoryStorage::new());

    let brand = api.get_brand(&BrandId::new("b2")).await.unwrap();
    api.get_brand(&BrandId::new("b2")).await.unwrap();

    assert_eq!(brand.name, "Nestle");
    assert_eq!(mock.requests_to("GET", "/brands/b2").len(), 1);
    assert!(api.get_brand(&BrandId::new("zz")).await.is_err());
}
