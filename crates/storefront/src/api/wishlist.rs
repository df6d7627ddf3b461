//! Server-side wishlist endpoints.

use freshmart_core::ProductId;
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use crate::storage::KeyValueStore;

use super::conversions::convert_wishlist;
use super::types::WishlistItem;
use super::wire::{RawList, RawProduct, RawWishlistMutation};
use super::{Api, ApiError};

impl<S: KeyValueStore> Api<S> {
    /// `GET /wishlist`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self) -> Result<Vec<WishlistItem>, ApiError> {
        let raw: RawList<RawProduct> = self.get("/wishlist").await?;
        Ok(convert_wishlist(raw))
    }

    /// `POST /wishlist`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(&self, product_id: &ProductId) -> Result<String, ApiError> {
        let raw: RawWishlistMutation = self
            .send_json(
                Method::POST,
                "/wishlist",
                json!({ "productId": product_id.as_str() }),
            )
            .await?;
        tracing::debug!(size = raw.data.len(), "Wishlist updated");
        Ok(raw
            .message
            .unwrap_or_else(|| "Product added successfully to your wishlist".to_string()))
    }

    /// `DELETE /wishlist/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(&self, product_id: &ProductId) -> Result<String, ApiError> {
        let path = format!("/wishlist/{}", urlencoding::encode(product_id.as_str()));
        let raw: RawWishlistMutation = self.delete(&path).await?;
        tracing::debug!(size = raw.data.len(), "Wishlist updated");
        Ok(raw
            .message
            .unwrap_or_else(|| "Product removed successfully from your wishlist".to_string()))
    }
}
