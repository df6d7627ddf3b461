//! Cart store.
//!
//! The cart lives on the server; this store holds the last snapshot it
//! returned. State changes go through [`reduce`], and every mutation ends with
//! a full re-read so the snapshot always mirrors the server.

use freshmart_core::ProductId;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::api::{Api, ApiError, Cart};
use crate::storage::KeyValueStore;

use super::AuthStore;

// =============================================================================
// State
// =============================================================================

/// Where the store is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Cart store state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartState {
    pub status: LoadStatus,
    pub cart: Cart,
    pub error: Option<String>,
}

/// State transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    SetLoading,
    SetCart(Cart),
    SetError(String),
    Clear,
}

/// Apply `action` to `state`.
///
/// Loading and errors keep the previous snapshot so a failed refresh does not
/// blank the page.
#[must_use]
pub fn reduce(state: CartState, action: CartAction) -> CartState {
    match action {
        CartAction::SetLoading => CartState {
            status: LoadStatus::Loading,
            error: None,
            ..state
        },
        CartAction::SetCart(cart) => CartState {
            status: LoadStatus::Loaded,
            cart,
            error: None,
        },
        CartAction::SetError(message) => CartState {
            status: LoadStatus::Error,
            error: Some(message),
            ..state
        },
        CartAction::Clear => CartState {
            status: LoadStatus::Idle,
            cart: Cart::empty(),
            error: None,
        },
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors from cart actions. `Display` is the message shown to the shopper.
#[derive(Debug, Error)]
pub enum CartError {
    /// No session; nothing was sent.
    #[error("{0}")]
    LoginRequired(&'static str),

    /// The API call failed.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl CartError {
    fn failed(source: ApiError, fallback: &str) -> Self {
        // Transport and decode errors carry a generic message; prefer the
        // action-specific one.
        let message = match &source {
            ApiError::Network(_) | ApiError::Decode(_) => fallback.to_string(),
            other => other.to_string(),
        };
        Self::Failed { message, source }
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// The cart of one visitor.
#[derive(Debug)]
pub struct CartStore<S> {
    api: Api<S>,
    auth: AuthStore<S>,
    state: CartState,
}

impl<S: KeyValueStore> CartStore<S> {
    #[must_use]
    pub fn new(api: Api<S>) -> Self {
        Self {
            auth: AuthStore::new(api.clone()),
            api,
            state: CartState::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Last snapshot.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.state.cart
    }

    fn dispatch(&mut self, action: CartAction) {
        debug!(?action, "Cart action");
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    /// Whether a token and user are persisted.
    pub async fn has_session(&self) -> bool {
        self.auth.current().await.is_some()
    }

    async fn require_session(&self, message: &'static str) -> Result<(), CartError> {
        if self.has_session().await {
            Ok(())
        } else {
            Err(CartError::LoginRequired(message))
        }
    }

    /// Re-read the cart from the server.
    ///
    /// Without a session the state is cleared and nothing is sent. A missing
    /// cart (404) is an empty cart.
    #[instrument(skip(self))]
    pub async fn fetch(&mut self) {
        if !self.has_session().await {
            self.dispatch(CartAction::Clear);
            return;
        }

        self.dispatch(CartAction::SetLoading);
        match self.api.get_cart().await {
            Ok(cart) => self.dispatch(CartAction::SetCart(cart)),
            Err(ApiError::NotFound(_)) => self.dispatch(CartAction::SetCart(Cart::empty())),
            Err(ApiError::Unauthorized(_)) => self.dispatch(CartAction::Clear),
            Err(e) => {
                let message = CartError::failed(e, "Failed to load cart").to_string();
                self.dispatch(CartAction::SetError(message));
            }
        }
    }

    /// Add one unit of `product_id`.
    ///
    /// # Errors
    ///
    /// Fails without a session, or with the server's message.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&mut self, product_id: &ProductId) -> Result<String, CartError> {
        self.require_session("Please log in to add items to cart")
            .await?;
        let message = self
            .api
            .add_to_cart(product_id)
            .await
            .map_err(|e| CartError::failed(e, "Failed to add item to cart"))?;
        self.fetch().await;
        Ok(message)
    }

    /// Remove the line holding `product_id`.
    ///
    /// # Errors
    ///
    /// Fails without a session, or with the server's message.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&mut self, product_id: &ProductId) -> Result<String, CartError> {
        self.require_session("Please log in to manage cart").await?;
        let message = self
            .api
            .remove_cart_item(product_id)
            .await
            .map_err(|e| CartError::failed(e, "Failed to remove item from cart"))?;
        self.fetch().await;
        Ok(message)
    }

    /// Set the count of `product_id`. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Fails without a session, or with the server's message.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<String, CartError> {
        self.require_session("Please log in to manage cart").await?;
        let Ok(count @ 1..) = u32::try_from(quantity) else {
            return self.remove_item(product_id).await;
        };

        let message = self
            .api
            .update_cart_count(product_id, count)
            .await
            .map_err(|e| CartError::failed(e, "Failed to update item quantity"))?;
        self.fetch().await;
        Ok(message)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Fails without a session, or with the server's message.
    #[instrument(skip(self))]
    pub async fn clear_cart(&mut self) -> Result<String, CartError> {
        self.require_session("Please log in to manage cart").await?;
        let message = self
            .api
            .clear_cart()
            .await
            .map_err(|e| CartError::failed(e, "Failed to clear cart"))?;
        self.dispatch(CartAction::Clear);
        Ok(message)
    }

    /// Apply a coupon code. On failure the cart is left as it was.
    ///
    /// # Errors
    ///
    /// Fails without a session, or with the server's message.
    #[instrument(skip(self))]
    pub async fn apply_coupon(&mut self, coupon: &str) -> Result<String, CartError> {
        self.require_session("Please log in to apply coupon").await?;
        let message = self
            .api
            .apply_coupon(coupon.trim())
            .await
            .map_err(|e| CartError::failed(e, "Failed to apply coupon"))?;
        self.fetch().await;
        Ok(message)
    }

    /// Whether the snapshot holds `product_id`.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.state.cart.line(product_id).is_some()
    }

    /// Units of `product_id` in the snapshot, zero when absent.
    #[must_use]
    pub fn item_quantity(&self, product_id: &ProductId) -> u32 {
        self.state.cart.line(product_id).map_or(0, |l| l.count)
    }

    /// The total the shopper pays.
    #[must_use]
    pub fn displayed_total(&self) -> Decimal {
        self.state.cart.displayed_total()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, CartLine, CartProduct};
    use crate::config::ApiConfig;
    use crate::storage::MemoryStorage;

    fn store() -> CartStore<MemoryStorage> {
        let client = ApiClient::new(&ApiConfig::with_base_url("http://127.0.0.1:9")).unwrap();
        CartStore::new(Api::new(client, MemoryStorage::new()))
    }

    fn cart_with(product: &str, count: u32) -> Cart {
        Cart {
            lines: vec![CartLine {
                id: None,
                product: CartProduct {
                    id: ProductId::new(product),
                    title: None,
                    image_cover: None,
                    category: None,
                    brand: None,
                    quantity: None,
                },
                count,
                price: Decimal::from(10),
            }],
            num_of_cart_items: 1,
            total_cart_price: Decimal::from(10) * Decimal::from(count),
            ..Cart::empty()
        }
    }

    #[test]
    fn test_reduce_loading_keeps_snapshot() {
        let loaded = reduce(CartState::default(), CartAction::SetCart(cart_with("p1", 2)));
        assert_eq!(loaded.status, LoadStatus::Loaded);

        let loading = reduce(loaded.clone(), CartAction::SetLoading);
        assert_eq!(loading.status, LoadStatus::Loading);
        assert_eq!(loading.cart, loaded.cart);
    }

    #[test]
    fn test_reduce_error_then_clear() {
        let state = reduce(CartState::default(), CartAction::SetCart(cart_with("p1", 1)));
        let state = reduce(state, CartAction::SetError("boom".to_string()));
        assert_eq!(state.status, LoadStatus::Error);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(!state.cart.is_empty());

        let state = reduce(state, CartAction::Clear);
        assert_eq!(state, CartState::default());
    }

    #[test]
    fn test_read_helpers() {
        let mut store = store();
        store.dispatch(CartAction::SetCart(cart_with("p1", 3)));

        assert!(store.is_in_cart(&ProductId::new("p1")));
        assert!(!store.is_in_cart(&ProductId::new("p2")));
        assert_eq!(store.item_quantity(&ProductId::new("p1")), 3);
        assert_eq!(store.item_quantity(&ProductId::new("p2")), 0);
        assert_eq!(store.displayed_total(), Decimal::from(30));
    }

    #[tokio::test]
    async fn test_mutations_without_session_fail_fast() {
        let mut store = store();
        let id = ProductId::new("p1");

        let err = store.add_item(&id).await.unwrap_err();
        assert_eq!(err.to_string(), "Please log in to add items to cart");
        assert!(matches!(
            store.update_quantity(&id, 0).await,
            Err(CartError::LoginRequired(_))
        ));
        assert!(matches!(
            store.apply_coupon("SAVE10").await,
            Err(CartError::LoginRequired("Please log in to apply coupon"))
        ));
        assert!(matches!(
            store.clear_cart().await,
            Err(CartError::LoginRequired(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_without_session_clears() {
        let mut store = store();
        store.dispatch(CartAction::SetCart(cart_with("p1", 1)));

        store.fetch().await;

        assert_eq!(store.state(), &CartState::default());
    }
}
