//! Storefront pages rendered against the mock commerce API.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use freshmart_integration_tests::{EMAIL, MockCommerceApi, NAME, PASSWORD};
use freshmart_storefront::config::{CatalogConfig, StorefrontConfig};
use freshmart_storefront::state::AppState;
use tower::ServiceExt;

fn storefront(mock: &MockCommerceApi) -> Router {
    let config = StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        api: mock.config(),
        catalog: CatalogConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
    };
    freshmart_storefront::app(AppState::new(config).unwrap())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .last()
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, cookie, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

async fn logged_in(app: &Router) -> String {
    let form = format!("email={}&password={PASSWORD}", urlencoding_email(EMAIL));
    let (status, cookie, _) = send(app, post_form("/login", &form, None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    cookie.unwrap()
}

fn urlencoding_email(email: &str) -> String {
    email.replace('@', "%40")
}

#[tokio::test]
async fn test_health_check() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    let (status, _, body) = send(&app, get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_protected_pages_ask_for_login() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    for path in ["/cart", "/wishlist"] {
        let (status, _, body) = send(&app, get(path, None)).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(body.contains("Login Required"), "{path}");
        assert!(body.contains("href=\"/login\""), "{path}");
    }
    assert!(mock.requests_to("GET", "/cart").is_empty());
}

#[tokio::test]
async fn test_product_listing_renders_cards_and_pagination() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    let (status, _, body) = send(&app, get("/products?sort=price", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Pantry Item 01"));
    assert!(body.contains("Showing 1 to 24 of 30 products"));
    let request = mock.requests_to("GET", "/products").into_iter().next().unwrap();
    let query = request.query;
    assert_eq!(query.get("limit").map(String::as_str), Some("24"));
    assert_eq!(query.get("sort").map(String::as_str), Some("price"));
}

#[tokio::test]
async fn test_search_fragment_filters_products() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    let (status, _, body) = send(&app, get("/products/search?q=milk", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Fresh Milk"));
    assert!(body.contains("Milk Chocolate"));
    assert!(!body.contains("Pantry Item"));
    assert!(!body.contains("<html"));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    let (status, _, _) = send(&app, get("/products/nope", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_out_of_stock_product_disables_add_to_cart() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    let (status, _, body) = send(&app, get("/products/cheese", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Aged Cheese"));
    assert!(body.contains("Out of Stock"));
}

#[tokio::test]
async fn test_brands_page_counts_brands() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    let (status, _, body) = send(&app, get("/brands", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("2 Brands Available"));
    assert!(body.contains("Juhayna"));
    assert!(body.contains("/products?brand=b1"));
}

#[tokio::test]
async fn test_login_then_cart_shows_empty_cart() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);
    let cookie = logged_in(&app).await;

    let (status, _, body) = send(&app, get("/cart", Some(&cookie))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("Welcome, {NAME}")));
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_wrong_password_rerenders_login_with_message() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);
    let form = format!("email={}&password=wrong", urlencoding_email(EMAIL));

    let (status, _, body) = send(&app, post_form("/login", &form, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Incorrect email or password"));
}

#[tokio::test]
async fn test_checkout_lists_missing_fields() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    let (status, _, body) = send(
        &app,
        post_form("/checkout", "first_name=Mona&email=not-an-email", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Last name is required"));
    assert!(body.contains("Please enter a valid email address"));
    assert!(!body.contains("Order placed successfully!"));
}

#[tokio::test]
async fn test_failed_cart_update_keeps_existing_lines() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);
    let mut cookie = logged_in(&app).await;

    let (status, rotated, _) = send(&app, post_form("/cart/add", "product_id=milk", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    cookie = rotated.unwrap_or(cookie);

    // Tea was never added, so the API rejects the update.
    let (status, _, body) = send(
        &app,
        post_form("/cart/update", "product_id=tea&quantity=2", Some(&cookie)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Fresh Milk"));
    assert!(!body.contains("Your cart is empty"));
    assert!(body.contains(r#"class="notice error""#));
    assert!(body.contains("No product in your cart with this id"));
}

#[tokio::test]
async fn test_wishlist_toggle_falls_back_when_api_is_down() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);
    let cookie = logged_in(&app).await;
    mock.set_wishlist_down(true);

    let (status, _, body) = send(
        &app,
        post_form(
            "/wishlist/toggle",
            "product_id=milk&wished=false&title=Fresh+Milk&price=40",
            Some(&cookie),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"aria-pressed="true""#));
    assert!(body.contains("API unavailable - using local storage"));
}

#[tokio::test]
async fn test_wishlist_toggle_uses_card_snapshot_when_lookup_fails() {
    let mock = MockCommerceApi::start().await;
    let app = storefront(&mock);

    let (status, _, body) = send(
        &app,
        post_form(
            "/wishlist/toggle",
            "product_id=ghost&wished=false&title=Ghost+Pepper&price=15",
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"aria-pressed="true""#));
    assert!(body.contains("Login to sync with cloud"));
    assert!(body.contains(r#"value="Ghost Pepper""#));
}
