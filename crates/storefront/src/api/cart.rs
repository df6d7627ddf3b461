//! Cart endpoints.
//!
//! Mutation responses carry a partial cart (product ids only), so they return
//! just the server's message. Callers re-read the cart afterwards.

use freshmart_core::ProductId;
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use crate::storage::KeyValueStore;

use super::conversions::convert_cart;
use super::types::Cart;
use super::wire::{RawCartResponse, RawMessage};
use super::{Api, ApiError};

fn line_path(id: &str) -> String {
    format!("/cart/{}", urlencoding::encode(id))
}

fn mutation_message(raw: RawCartResponse, fallback: &str) -> String {
    raw.message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

impl<S: KeyValueStore> Api<S> {
    /// `GET /cart`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the user has no cart yet.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart, ApiError> {
        let raw: RawCartResponse = self.get("/cart").await?;
        Ok(raw
            .data
            .map_or_else(Cart::empty, |data| convert_cart(data, raw.num_of_cart_items)))
    }

    /// `POST /cart`: add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: &ProductId) -> Result<String, ApiError> {
        let raw: RawCartResponse = self
            .send_json(
                Method::POST,
                "/cart",
                json!({ "productId": product_id.as_str() }),
            )
            .await?;
        Ok(mutation_message(raw, "Product added successfully to your cart"))
    }

    /// `PUT /cart/{id}`: set a line's count.
    ///
    /// The API addresses lines by product id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_cart_count(
        &self,
        product_id: &ProductId,
        count: u32,
    ) -> Result<String, ApiError> {
        let raw: RawCartResponse = self
            .send_json(
                Method::PUT,
                &line_path(product_id.as_str()),
                json!({ "count": count }),
            )
            .await?;
        Ok(mutation_message(raw, "Cart updated"))
    }

    /// `DELETE /cart/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_cart_item(&self, product_id: &ProductId) -> Result<String, ApiError> {
        let raw: RawCartResponse = self.delete(&line_path(product_id.as_str())).await?;
        Ok(mutation_message(raw, "Product removed from your cart"))
    }

    /// `DELETE /cart`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<String, ApiError> {
        let raw: RawMessage = self.delete("/cart").await?;
        Ok(raw
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Cart cleared".to_string()))
    }

    /// `PUT /cart/applycoupon`.
    ///
    /// # Errors
    ///
    /// Returns the server's message for an invalid or expired coupon.
    #[instrument(skip(self))]
    pub async fn apply_coupon(&self, coupon: &str) -> Result<String, ApiError> {
        let raw: RawCartResponse = self
            .send_json(
                Method::PUT,
                "/cart/applycoupon",
                json!({ "coupon": coupon }),
            )
            .await?;
        Ok(mutation_message(raw, "Coupon applied"))
    }
}
