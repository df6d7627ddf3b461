//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (q, sort, page, category, brand, price_gte, price_lte)
//! GET  /products/search        - Listing results fragment (HTMX live search)
//! GET  /products/{id}          - Product detail
//!
//! # Brands
//! GET  /brands                 - Brand grid
//!
//! # Cart (login required, HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit (returns notice, triggers cart-updated)
//! POST /cart/update            - Set quantity (returns cart contents fragment)
//! POST /cart/remove            - Remove a line (returns cart contents fragment)
//! POST /cart/clear             - Empty the cart (returns cart contents fragment)
//! POST /cart/coupon            - Apply a coupon (returns cart contents fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Shipping form and order summary
//! POST /checkout               - Validate and confirm the order
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /signup                 - Signup page
//! POST /signup                 - Signup action
//! POST /logout                 - Logout action
//!
//! # Wishlist
//! GET  /wishlist               - Wishlist page (login required)
//! POST /wishlist/toggle        - Optimistic heart toggle (fragment)
//! POST /wishlist/remove        - Remove an item (fragment)
//! ```

pub mod auth;
pub mod brands;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::{ApiClient, User};
use crate::middleware::security_headers::PLACEHOLDER_ORIGIN;
use crate::state::AppState;

// =============================================================================
// Shared View Data
// =============================================================================

/// Layout data every full page renders with.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Text for the `<title>` element and page heading.
    pub title: String,
    /// The logged-in user, if any. Cart and wishlist links only show for them.
    pub user: Option<User>,
}

impl PageContext {
    #[must_use]
    pub fn new(title: impl Into<String>, user: Option<User>) -> Self {
        Self {
            title: title.into(),
            user,
        }
    }

    /// Whether the visitor is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Placeholder image carrying `text`, for items without a picture.
#[must_use]
pub fn placeholder_image(width: u32, height: u32, text: &str) -> String {
    format!(
        "{PLACEHOLDER_ORIGIN}/{width}x{height}/f3f4f6/6b7280?text={}",
        urlencoding::encode(text)
    )
}

/// Absolute URL for an optional image, falling back to a placeholder.
#[must_use]
pub fn image_src(client: &ApiClient, image: Option<&str>, alt: &str, size: (u32, u32)) -> String {
    match image.map(str::trim).filter(|i| !i.is_empty()) {
        Some(image) => client.image_url(image),
        None => placeholder_image(size.0, size.1, alt),
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/search", get(products::search))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/coupon", post(cart::coupon))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .nest("/products", product_routes())
        .route("/brands", get(brands::index))
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .nest("/wishlist", wishlist_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not call the commerce API.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    #[test]
    fn test_placeholder_image_encodes_text() {
        assert_eq!(
            placeholder_image(400, 300, "Fresh Milk & Eggs"),
            "https://via.placeholder.com/400x300/f3f4f6/6b7280?text=Fresh%20Milk%20%26%20Eggs"
        );
    }

    #[test]
    fn test_image_src_falls_back_for_blank_images() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        assert!(image_src(&client, Some("  "), "Tea", (300, 300)).starts_with(PLACEHOLDER_ORIGIN));
        assert!(image_src(&client, None, "Tea", (300, 300)).ends_with("text=Tea"));
        assert_eq!(
            image_src(&client, Some("uploads/tea.png"), "Tea", (300, 300)),
            "https://ecommerce.routemisr.com/uploads/tea.png"
        );
    }

    #[test]
    fn test_page_context() {
        let page = PageContext::new("Cart", None);
        assert_eq!(page.title, "Cart");
        assert!(!page.is_logged_in());
    }
}
