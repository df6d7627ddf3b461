//! Product endpoints.

use freshmart_core::ProductId;
use reqwest::Method;
use tracing::{debug, instrument};

use crate::storage::KeyValueStore;

use super::auth::missing_field;
use super::cache::{CacheKey, CacheValue};
use super::conversions::{convert_product, convert_product_page};
use super::types::{Product, ProductPage, ProductQuery};
use super::wire::{RawItem, RawList, RawProduct};
use super::{Api, ApiError};

impl<S: KeyValueStore> Api<S> {
    /// `GET /products` with listing, search and filter parameters.
    ///
    /// Listings are never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page, sort = %query.sort))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let pairs = query.to_query_pairs();
        let raw: RawList<RawProduct> = self
            .execute(Method::GET, "/products", |r| r.query(&pairs))
            .await?;
        let page = convert_product_page(raw);
        debug!(count = page.products.len(), results = page.results, "Fetched products");
        Ok(page)
    }

    /// `GET /products/{id}`, cached.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.client().cached(&key).await {
            return Ok(*product);
        }

        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        let raw: RawItem<RawProduct> = self.get(&path).await?;
        let product = raw
            .data
            .and_then(convert_product)
            .ok_or_else(|| missing_field("data"))?;

        self.client()
            .store(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }
}
