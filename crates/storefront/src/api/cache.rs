//! Cache types for read-only API lookups.

use freshmart_core::{BrandId, ProductId};

use super::types::{Brand, Product};

/// Cache key for brands and product details.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Brands,
    Brand(BrandId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Brands(Vec<Brand>),
    Brand(Box<Brand>),
}
