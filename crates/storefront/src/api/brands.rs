//! Brand endpoints. Both lookups are cached.

use freshmart_core::BrandId;
use tracing::instrument;

use crate::storage::KeyValueStore;

use super::auth::missing_field;
use super::cache::{CacheKey, CacheValue};
use super::conversions::convert_brand;
use super::types::Brand;
use super::wire::{RawItem, RawList, RawNamed};
use super::{Api, ApiError};

impl<S: KeyValueStore> Api<S> {
    /// `GET /brands`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Result<Vec<Brand>, ApiError> {
        if let Some(CacheValue::Brands(brands)) = self.client().cached(&CacheKey::Brands).await {
            return Ok(brands);
        }

        let raw: RawList<RawNamed> = self.get("/brands").await?;
        let brands: Vec<Brand> = raw.data.into_iter().filter_map(convert_brand).collect();

        self.client()
            .store(CacheKey::Brands, CacheValue::Brands(brands.clone()))
            .await;
        Ok(brands)
    }

    /// `GET /brands/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown brand.
    #[instrument(skip(self), fields(brand_id = %id))]
    pub async fn get_brand(&self, id: &BrandId) -> Result<Brand, ApiError> {
        let key = CacheKey::Brand(id.clone());
        if let Some(CacheValue::Brand(brand)) = self.client().cached(&key).await {
            return Ok(*brand);
        }

        let path = format!("/brands/{}", urlencoding::encode(id.as_str()));
        let raw: RawItem<RawNamed> = self.get(&path).await?;
        let brand = raw
            .data
            .and_then(convert_brand)
            .ok_or_else(|| missing_field("data"))?;

        self.client()
            .store(key, CacheValue::Brand(Box::new(brand.clone())))
            .await;
        Ok(brand)
    }
}
