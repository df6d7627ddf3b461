//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation goes through [`CartStore`], which re-reads the cart from
//! the commerce API afterwards, so each fragment renders the server's view.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use freshmart_core::ProductId;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{PageContext, image_src};
use crate::api::{ApiClient, Cart, CartLine};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::storage::SessionStorage;
use crate::stores::{CartError, CartStore, LoadStatus};

const LINE_IMAGE: (u32, u32) = (100, 100);

/// Tells the page to refresh the cart badge.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub title: String,
    pub image: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price: Decimal,
    pub count: u32,
    /// Quantities the minus and plus buttons submit.
    pub fewer: u32,
    pub more: u32,
    pub line_total: Decimal,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: Decimal,
    /// Set only when a coupon lowered the total.
    pub discounted_total: Option<Decimal>,
    pub total: Decimal,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, client: &ApiClient) -> Self {
        let lines: Vec<CartLineView> = cart
            .lines
            .iter()
            .map(|line| CartLineView::new(line, client))
            .collect();
        let item_count = if cart.num_of_cart_items > 0 {
            cart.num_of_cart_items
        } else {
            cart.lines.iter().map(|l| l.count).sum()
        };

        Self {
            lines,
            item_count,
            subtotal: cart.total_cart_price,
            discounted_total: cart.total_price_after_discount,
            total: cart.displayed_total(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl CartLineView {
    fn new(line: &CartLine, client: &ApiClient) -> Self {
        let title = line
            .product
            .title
            .clone()
            .unwrap_or_else(|| "Product".to_string());
        Self {
            product_id: line.product.id.to_string(),
            image: image_src(
                client,
                line.product.image_cover.as_deref(),
                &title,
                LINE_IMAGE,
            ),
            title,
            category: line.product.category.as_ref().map(|c| c.name.clone()),
            brand: line.product.brand.as_ref().map(|b| b.name.clone()),
            price: line.price,
            count: line.count,
            fewer: line.count.saturating_sub(1),
            more: line.count.saturating_add(1),
            line_total: line.line_total(),
        }
    }
}

/// Inline message shown above the cart or next to a button.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

impl From<Result<String, CartError>> for Notice {
    fn from(result: Result<String, CartError>) -> Self {
        match result {
            Ok(message) => Self::success(message),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data. A quantity of zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub coupon: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub notice: Option<Notice>,
}

/// Cart contents fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "cart/_contents.html")]
pub struct CartContentsTemplate {
    pub cart: CartView,
    pub notice: Option<Notice>,
}

/// Notice fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    pub notice: Notice,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

/// The visitor's cart, freshly read.
pub(super) async fn load_cart(state: &AppState, session: Session) -> CartStore<SessionStorage> {
    let mut store = CartStore::new(state.api(session));
    store.fetch().await;
    store
}

/// The store's error, if the last read failed.
fn load_error(store: &CartStore<SessionStorage>) -> Option<Notice> {
    match store.state().status {
        LoadStatus::Error => store.state().error.clone().map(Notice::error),
        _ => None,
    }
}

/// Render the contents fragment after a mutation.
///
/// A failed mutation returns before the store re-reads the cart, so the
/// cart is fetched here to show what the server still holds.
async fn contents(
    state: &AppState,
    store: &mut CartStore<SessionStorage>,
    result: Result<String, CartError>,
) -> Response {
    if result.is_err() {
        store.fetch().await;
    }
    let notice = Notice::from(result);
    let notice = load_error(store).unwrap_or(notice);
    (
        AppendHeaders([CART_UPDATED]),
        CartContentsTemplate {
            cart: CartView::new(store.cart(), state.client()),
            notice: Some(notice),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let store = load_cart(&state, session).await;
    CartShowTemplate {
        page: PageContext::new("Shopping Cart", Some(user)),
        cart: CartView::new(store.cart(), state.client()),
        notice: load_error(&store),
    }
}

/// Add one unit to the cart (HTMX).
///
/// Returns a notice next to the button and triggers a badge refresh.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let mut store = CartStore::new(state.api(session));
    let product_id = ProductId::new(form.product_id);
    let result = store.add_item(&product_id).await;
    let added = result.is_ok();
    if added {
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product_id.as_str())]),
        );
    }
    let notice = NoticeTemplate {
        notice: Notice::from(result),
    };

    if added {
        (AppendHeaders([CART_UPDATED]), notice).into_response()
    } else {
        notice.into_response()
    }
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let mut store = CartStore::new(state.api(session));
    let result = store
        .update_quantity(&ProductId::new(form.product_id), form.quantity)
        .await;
    contents(&state, &mut store, result).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let mut store = CartStore::new(state.api(session));
    let result = store.remove_item(&ProductId::new(form.product_id)).await;
    contents(&state, &mut store, result).await
}

/// Empty the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Response {
    let mut store = CartStore::new(state.api(session));
    let result = store.clear_cart().await;
    contents(&state, &mut store, result).await
}

/// Apply a coupon code (HTMX).
///
/// A rejected coupon leaves the cart as it was; the fragment re-renders the
/// current snapshot with the server's message.
#[instrument(skip(state, session))]
pub async fn coupon(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Response {
    let mut store = CartStore::new(state.api(session));
    let result = store.apply_coupon(&form.coupon).await;
    contents(&state, &mut store, result).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let store = load_cart(&state, session).await;
    CartCountTemplate {
        count: CartView::new(store.cart(), state.client()).item_count,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::CartProduct;
    use crate::config::ApiConfig;

    fn line(id: &str, count: u32, price: u32) -> CartLine {
        CartLine {
            id: None,
            product: CartProduct {
                id: ProductId::new(id),
                title: Some(format!("Product {id}")),
                image_cover: Some(format!("uploads/{id}.png")),
                category: None,
                brand: None,
                quantity: None,
            },
            count,
            price: Decimal::from(price),
        }
    }

    fn client() -> ApiClient {
        ApiClient::new(&ApiConfig::default()).unwrap()
    }

    #[test]
    fn test_cart_view_totals() {
        let cart = Cart {
            id: None,
            lines: vec![line("a", 2, 50), line("b", 1, 20)],
            num_of_cart_items: 3,
            total_cart_price: Decimal::from(120),
            total_price_after_discount: Some(Decimal::from(100)),
        };
        let view = CartView::new(&cart, &client());
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, Decimal::from(120));
        assert_eq!(view.discounted_total, Some(Decimal::from(100)));
        assert_eq!(view.total, Decimal::from(100));
        let first = view.lines.first().unwrap();
        assert_eq!(first.line_total, Decimal::from(100));
        assert_eq!(first.image, "https://ecommerce.routemisr.com/uploads/a.png");
    }

    #[test]
    fn test_cart_view_without_discount_shows_cart_price() {
        let cart = Cart {
            lines: vec![line("a", 1, 30)],
            total_cart_price: Decimal::from(30),
            ..Cart::default()
        };
        let view = CartView::new(&cart, &client());
        assert_eq!(view.item_count, 1);
        assert!(view.discounted_total.is_none());
        assert_eq!(view.total, Decimal::from(30));
    }

    #[test]
    fn test_contents_fragment_renders_lines() {
        let cart = Cart {
            lines: vec![line("a", 2, 50)],
            num_of_cart_items: 2,
            total_cart_price: Decimal::from(100),
            ..Cart::default()
        };
        let html = CartContentsTemplate {
            cart: CartView::new(&cart, &client()),
            notice: Some(Notice::error("Coupon not found")),
        }
        .render()
        .unwrap();
        assert!(html.contains("Product a"));
        assert!(html.contains("EGP 100.00"));
        assert!(html.contains("Coupon not found"));
    }

    #[test]
    fn test_empty_contents_fragment() {
        let html = CartContentsTemplate {
            cart: CartView::new(&Cart::empty(), &client()),
            notice: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("Your cart is empty"));
    }
}
