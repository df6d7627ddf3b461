//! Product route handlers.
//!
//! The listing is stateless on the server: every request rebuilds a
//! [`ListingState`] from the query string. The filter form carries no page
//! field, so changing the search text, sort or filters always lands on page 1.

use std::collections::HashSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use freshmart_core::{BrandId, CategoryId, ProductId, ProductSort};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};
use url::form_urlencoded;

use super::{PageContext, image_src};
use crate::api::{ApiClient, Product};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::stores::{CartStore, ListingState, PageLink, WishlistStore};

const CARD_IMAGE: (u32, u32) = (400, 300);
const DETAIL_IMAGE: (u32, u32) = (600, 600);

// =============================================================================
// View Types
// =============================================================================

/// Product card display data for templates.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub title: String,
    pub image: String,
    pub price: String,
    /// The effective price as a plain number, for the wishlist snapshot.
    pub amount: String,
    /// Pre-discount price, shown struck through when on sale.
    pub original_price: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    /// Average rating to one decimal.
    pub rating: Option<String>,
    pub ratings_quantity: u32,
    pub stock_badge: Option<&'static str>,
    pub purchasable: bool,
    pub in_wishlist: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, client: &ApiClient, in_wishlist: bool) -> Self {
        let stock = product.stock_status();
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            image: image_src(
                client,
                product.image_cover.as_deref(),
                &product.title,
                CARD_IMAGE,
            ),
            price: product.effective_price().display(),
            amount: product.effective_price().amount.to_string(),
            original_price: product.is_on_sale().then(|| product.price().display()),
            category: product.category.as_ref().map(|c| c.name.clone()),
            brand: product.brand.as_ref().map(|b| b.name.clone()),
            rating: product.ratings_average.map(|r| format!("{r:.1}")),
            ratings_quantity: product.ratings_quantity,
            stock_badge: stock.badge(),
            purchasable: stock.is_purchasable(),
            in_wishlist,
        }
    }
}

/// One sort choice in the sort select.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// One brand choice in the brand filter.
#[derive(Debug, Clone)]
pub struct BrandOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// One entry of the page-number bar. Gaps have no URL.
#[derive(Debug, Clone)]
pub struct PageLinkView {
    pub label: String,
    pub url: Option<String>,
    pub current: bool,
}

/// Everything the listing and its results fragment render.
#[derive(Debug, Clone)]
pub struct ListingView {
    pub products: Vec<ProductCard>,
    pub search: String,
    pub category: String,
    pub price_gte: String,
    pub price_lte: String,
    pub sort_options: Vec<SortOption>,
    pub brand_options: Vec<BrandOption>,
    pub page: u32,
    pub total_pages: u32,
    pub results: u64,
    pub showing_from: u64,
    pub showing_to: u64,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
    pub page_links: Vec<PageLinkView>,
    pub error: Option<String>,
    /// Reloads the same page; backs the "Try again" control.
    pub retry_url: String,
}

/// Product detail display data for templates.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub card: ProductCard,
    pub description: String,
    pub images: Vec<String>,
    pub sold: Option<u64>,
    pub quantity: Option<i64>,
    /// Units already in the visitor's cart.
    pub in_cart: u32,
}

// =============================================================================
// Query Types
// =============================================================================

/// Listing query parameters.
///
/// Everything arrives as text so a malformed value is ignored instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price_gte: Option<String>,
    pub price_lte: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_price(value: Option<&str>) -> Option<Decimal> {
    non_blank(value).and_then(|v| v.parse().ok())
}

impl ListingQuery {
    /// Apply the query to fresh listing state.
    ///
    /// Filters go first and the page last, so an explicit page survives the
    /// page-1 reset the filter setters perform.
    #[must_use]
    pub fn to_state(&self, page_size: u32) -> ListingState {
        let mut listing = ListingState::new(page_size);
        listing.set_search(self.q.as_deref().unwrap_or_default().trim());
        listing.set_sort(ProductSort::parse_or_default(
            self.sort.as_deref().unwrap_or_default(),
        ));
        listing.set_category(non_blank(self.category.as_deref()).map(CategoryId::new));
        listing.set_brand(non_blank(self.brand.as_deref()).map(BrandId::new));
        listing.set_price_range(
            parse_price(self.price_gte.as_deref()),
            parse_price(self.price_lte.as_deref()),
        );
        if let Some(page) = non_blank(self.page.as_deref()).and_then(|p| p.parse().ok()) {
            listing.set_page(page);
        }
        listing
    }
}

/// URL of `page` with the listing's current controls.
#[must_use]
pub fn listing_url(listing: &ListingState, page: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if !listing.search().is_empty() {
        query.append_pair("q", listing.search());
    }
    if listing.sort() != ProductSort::default() {
        query.append_pair("sort", listing.sort().as_api_str());
    }
    if let Some(category) = listing.category() {
        query.append_pair("category", category.as_str());
    }
    if let Some(brand) = listing.brand() {
        query.append_pair("brand", brand.as_str());
    }
    let (min, max) = listing.price_range();
    if let Some(min) = min {
        query.append_pair("price_gte", &min.to_string());
    }
    if let Some(max) = max {
        query.append_pair("price_lte", &max.to_string());
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }

    let query = query.finish();
    if query.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{query}")
    }
}

impl ListingView {
    fn new(listing: &ListingState, client: &ApiClient, wishlist: &HashSet<ProductId>) -> Self {
        let (showing_from, showing_to) = listing.showing_range();
        let (min, max) = listing.price_range();
        let page_links = listing
            .page_links()
            .into_iter()
            .map(|link| match link {
                PageLink::Page(number) => PageLinkView {
                    label: number.to_string(),
                    url: Some(listing_url(listing, number)),
                    current: number == listing.page(),
                },
                PageLink::Gap => PageLinkView {
                    label: "…".to_string(),
                    url: None,
                    current: false,
                },
            })
            .collect();

        Self {
            products: listing
                .products()
                .iter()
                .map(|p| ProductCard::new(p, client, wishlist.contains(&p.id)))
                .collect(),
            search: listing.search().to_string(),
            category: listing.category().map(ToString::to_string).unwrap_or_default(),
            price_gte: min.map(|m| m.to_string()).unwrap_or_default(),
            price_lte: max.map(|m| m.to_string()).unwrap_or_default(),
            sort_options: ProductSort::ALL
                .iter()
                .map(|sort| SortOption {
                    value: sort.as_api_str(),
                    label: sort.label(),
                    selected: *sort == listing.sort(),
                })
                .collect(),
            brand_options: Vec::new(),
            page: listing.page(),
            total_pages: listing.total_pages(),
            results: listing.results(),
            showing_from,
            showing_to,
            previous_url: listing
                .has_previous()
                .then(|| listing_url(listing, listing.page() - 1)),
            next_url: listing
                .has_next()
                .then(|| listing_url(listing, listing.page() + 1)),
            page_links,
            error: listing.error().map(ToString::to_string),
            retry_url: listing_url(listing, listing.page()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub listing: ListingView,
    /// Quiet period before the live search fires.
    pub debounce_ms: u128,
}

/// Listing results fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "products/_results.html")]
pub struct ProductsResultsTemplate {
    pub listing: ListingView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetail,
}

// =============================================================================
// Handlers
// =============================================================================

/// Product ids in the visitor's wishlist, from whichever source answers.
pub(super) async fn wishlist_ids(state: &AppState, session: Session) -> HashSet<ProductId> {
    WishlistStore::new(state.api(session))
        .get_items()
        .await
        .into_inner()
        .into_iter()
        .map(|item| item.id)
        .collect()
}

async fn load_listing(
    state: &AppState,
    session: Session,
    query: &ListingQuery,
) -> (ListingState, HashSet<ProductId>) {
    let api = state.api(session.clone());
    let mut listing = query.to_state(state.config().catalog.page_size);
    listing.fetch(&api).await;
    let wishlist = wishlist_ids(state, session).await;
    (listing, wishlist)
}

/// Display product listing page.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let api = state.api(session.clone());
    let (listing, wishlist) = load_listing(&state, session, &query).await;

    let mut view = ListingView::new(&listing, state.client(), &wishlist);
    match api.list_brands().await {
        Ok(brands) => {
            view.brand_options = brands
                .into_iter()
                .map(|brand| BrandOption {
                    selected: listing.brand() == Some(&brand.id),
                    id: brand.id.into_inner(),
                    name: brand.name,
                })
                .collect();
        }
        Err(e) => warn!(error = %e, "Failed to load brand filter"),
    }

    ProductsIndexTemplate {
        page: PageContext::new("Products", user),
        listing: view,
        debounce_ms: state.config().catalog.search_debounce.as_millis(),
    }
}

/// Listing results fragment for the live search box (HTMX).
#[instrument(skip(state, session))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let (listing, wishlist) = load_listing(&state, session, &query).await;
    ProductsResultsTemplate {
        listing: ListingView::new(&listing, state.client(), &wishlist),
    }
}

/// Display product detail page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let api = state.api(session.clone());
    let product_id = ProductId::new(id);
    let product = api.get_product(&product_id).await?;

    let in_wishlist = WishlistStore::new(api.clone())
        .is_in_wishlist(&product_id)
        .await
        .into_inner();

    let in_cart = if user.is_some() {
        let mut cart = CartStore::new(api);
        cart.fetch().await;
        cart.item_quantity(&product_id)
    } else {
        0
    };

    let client = state.client();
    let mut images: Vec<String> = product
        .images
        .iter()
        .map(|image| image_src(client, Some(image), &product.title, DETAIL_IMAGE))
        .collect();
    if images.is_empty() {
        images.push(image_src(
            client,
            product.image_cover.as_deref(),
            &product.title,
            DETAIL_IMAGE,
        ));
    }

    let detail = ProductDetail {
        card: ProductCard::new(&product, client, in_wishlist),
        description: product.description.clone(),
        images,
        sold: product.sold,
        quantity: product.quantity,
        in_cart,
    };

    Ok(ProductShowTemplate {
        page: PageContext::new(product.title, user),
        product: detail,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ProductPage;
    use crate::config::ApiConfig;

    fn product(id: &str, price: u32, sale: Option<u32>) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            slug: id.to_string(),
            description: String::new(),
            price: Decimal::from(price),
            price_after_discount: sale.map(Decimal::from),
            image_cover: None,
            images: vec![],
            category: None,
            brand: None,
            ratings_average: Some(4.34),
            ratings_quantity: 12,
            sold: None,
            quantity: Some(3),
        }
    }

    #[test]
    fn test_query_keeps_explicit_page() {
        let query = ListingQuery {
            q: Some("milk".to_string()),
            sort: Some("-price".to_string()),
            page: Some("3".to_string()),
            ..ListingQuery::default()
        };
        let listing = query.to_state(24);
        assert_eq!(listing.page(), 3);
        assert_eq!(listing.search(), "milk");
        assert_eq!(listing.sort(), ProductSort::PriceDesc);
    }

    #[test]
    fn test_query_ignores_malformed_values() {
        let query = ListingQuery {
            page: Some("three".to_string()),
            price_gte: Some("cheap".to_string()),
            sort: Some("random".to_string()),
            ..ListingQuery::default()
        };
        let listing = query.to_state(24);
        assert_eq!(listing.page(), 1);
        assert_eq!(listing.price_range(), (None, None));
        assert_eq!(listing.sort(), ProductSort::Newest);
    }

    #[test]
    fn test_listing_url_omits_defaults() {
        let listing = ListingQuery::default().to_state(24);
        assert_eq!(listing_url(&listing, 1), "/products");
        assert_eq!(listing_url(&listing, 2), "/products?page=2");
    }

    #[test]
    fn test_listing_url_carries_controls() {
        let query = ListingQuery {
            q: Some("green tea".to_string()),
            sort: Some("price".to_string()),
            brand: Some("b1".to_string()),
            ..ListingQuery::default()
        };
        let listing = query.to_state(24);
        assert_eq!(
            listing_url(&listing, 4),
            "/products?q=green+tea&sort=price&brand=b1&page=4"
        );
    }

    #[test]
    fn test_card_shows_sale_and_stock() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        let card = ProductCard::new(&product("p1", 100, Some(80)), &client, true);
        assert_eq!(card.price, "EGP 80.00");
        assert_eq!(card.original_price.as_deref(), Some("EGP 100.00"));
        assert_eq!(card.stock_badge, Some("Low Stock"));
        assert_eq!(card.rating.as_deref(), Some("4.3"));
        assert!(card.in_wishlist);
        assert!(card.image.contains("text=Product%20p1"));
    }

    #[test]
    fn test_view_pagination_on_last_page() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        let mut listing = ListingQuery {
            page: Some("2".to_string()),
            ..ListingQuery::default()
        }
        .to_state(24);
        listing.apply_page(ProductPage {
            products: vec![product("p25", 10, None)],
            results: 25,
            metadata: None,
        });

        let view = ListingView::new(&listing, &client, &HashSet::new());
        assert_eq!(view.total_pages, 2);
        assert!(view.next_url.is_none());
        assert_eq!(view.previous_url.as_deref(), Some("/products"));
        assert_eq!((view.showing_from, view.showing_to), (25, 25));
        assert!(view.page_links.iter().any(|l| l.current && l.label == "2"));
    }
}
