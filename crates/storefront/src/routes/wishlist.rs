//! Wishlist route handlers.
//!
//! The heart on product cards is an optimistic toggle: while the request is
//! in flight the page shows the flipped heart (see `.htmx-request` in the
//! stylesheet), and the fragment returned is the settled state, reverted
//! when the mutation fails.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use freshmart_core::{Price, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use super::{PageContext, image_src};
use crate::api::{ApiClient, WishlistItem};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::stores::{OptimisticToggles, Sourced, WishlistStore};

const ITEM_IMAGE: (u32, u32) = (300, 300);

// =============================================================================
// View Types
// =============================================================================

/// Wishlist item display data for templates.
#[derive(Debug, Clone)]
pub struct WishlistItemView {
    pub id: String,
    pub title: String,
    pub image: String,
    pub price: String,
    pub category: Option<String>,
    pub brand: Option<String>,
}

impl WishlistItemView {
    #[must_use]
    pub fn new(item: &WishlistItem, client: &ApiClient) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            image: image_src(client, item.image_cover.as_deref(), &item.title, ITEM_IMAGE),
            price: Price::from_amount(item.price).display(),
            category: item.category.as_ref().map(|c| c.name.clone()),
            brand: item.brand.as_ref().map(|b| b.name.clone()),
        }
    }
}

/// The list plus where it came from.
#[derive(Debug, Clone)]
pub struct WishlistView {
    pub items: Vec<WishlistItemView>,
    /// Storage-mode note, e.g. "API unavailable - using local storage".
    pub source_notice: Option<&'static str>,
    /// Outcome of the last action.
    pub message: Option<String>,
}

impl WishlistView {
    fn new(items: &Sourced<Vec<WishlistItem>>, client: &ApiClient) -> Self {
        Self {
            items: items
                .data()
                .iter()
                .map(|item| WishlistItemView::new(item, client))
                .collect(),
            source_notice: items.notice(),
            message: None,
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Heart toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: String,
    /// Whether the heart was filled when clicked.
    #[serde(default)]
    pub wished: bool,
    /// Card data, used as the local snapshot when the product lookup fails.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image: String,
}

impl ToggleForm {
    /// A wishlist snapshot from the card fields, if they are usable.
    fn snapshot(&self) -> Option<WishlistItem> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        let price = self.price.trim().parse::<Decimal>().ok()?;
        Some(WishlistItem {
            id: ProductId::new(self.product_id.clone()),
            title: title.to_string(),
            price,
            image_cover: Some(self.image.trim().to_string()).filter(|i| !i.is_empty()),
            images: Vec::new(),
            category: None,
            brand: None,
        })
    }
}

/// Remove form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub page: PageContext,
    pub wishlist: WishlistView,
}

/// Wishlist items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/_items.html")]
pub struct WishlistItemsTemplate {
    pub wishlist: WishlistView,
}

/// Heart button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/_heart.html")]
pub struct HeartTemplate {
    pub product_id: String,
    pub title: String,
    /// Plain decimal amount.
    pub price: String,
    pub image: String,
    pub in_wishlist: bool,
    /// Empty when there is nothing to say.
    pub notice: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the wishlist page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let items = WishlistStore::new(state.api(session)).get_items().await;
    WishlistShowTemplate {
        page: PageContext::new("My Wishlist", Some(user)),
        wishlist: WishlistView::new(&items, state.client()),
    }
}

/// Flip a product's heart (HTMX).
///
/// Adding needs a product snapshot for the local fallback. The product is
/// looked up first (usually a cache hit); when that fails the card's own
/// title and price stand in.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ToggleForm>,
) -> Response {
    let api = state.api(session);
    let wishlist = WishlistStore::new(api.clone());
    let product_id = ProductId::new(form.product_id.clone());
    let fallback = form.snapshot();

    let toggles = OptimisticToggles::new();
    toggles.set(product_id.clone(), form.wished);

    let mut source_notice = None;
    let notice_slot = &mut source_notice;
    let target = product_id.clone();
    let result = toggles
        .toggle(product_id.clone(), |wished| async move {
            let outcome = if wished {
                let item = match api.get_product(&target).await {
                    Ok(product) => WishlistItem::from(&product),
                    Err(e) => {
                        warn!(error = %e, "Product lookup failed; using card snapshot");
                        fallback.ok_or(e)?
                    }
                };
                wishlist.add_item(item).await?
            } else {
                wishlist.remove(&target).await?
            };
            *notice_slot = outcome.notice();
            Ok::<_, AppError>(())
        })
        .await;

    let notice = match result {
        Ok(_) => source_notice.unwrap_or_default().to_string(),
        Err(e) => {
            warn!(error = %e, "Wishlist toggle failed; reverting");
            "Could not update your wishlist. Please try again.".to_string()
        }
    };

    HeartTemplate {
        in_wishlist: toggles.get(&product_id),
        product_id: product_id.into_inner(),
        title: form.title,
        price: form.price,
        image: form.image,
        notice,
    }
    .into_response()
}

/// Remove an item and re-render the list (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveForm>,
) -> Result<Response, AppError> {
    let store = WishlistStore::new(state.api(session));
    let outcome = store.remove(&ProductId::new(form.product_id)).await?;

    let items = store.get_items().await;
    let mut view = WishlistView::new(&items, state.client());
    view.message = Some(outcome.into_inner());

    Ok(WishlistItemsTemplate { wishlist: view }.into_response())
}
