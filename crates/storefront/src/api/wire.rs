//! Raw response shapes returned by the commerce API.
//!
//! Every field the server may omit is optional here; `conversions` decides
//! what a missing field means.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Error body: `{"message": ...}` or `{"message": "fail", "errors": {"msg": ...}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub errors: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub msg: Option<String>,
}

/// Bare acknowledgement: `{"status": "success", "message": ...}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub message: Option<String>,
    pub status: Option<String>,
    pub status_msg: Option<String>,
}

/// A `{ results, metadata, data: [...] }` listing envelope.
#[derive(Debug, Deserialize)]
pub struct RawList<T> {
    pub results: Option<u64>,
    pub metadata: Option<RawMetadata>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// A `{ data: {...} }` single-item envelope.
#[derive(Debug, Deserialize)]
pub struct RawItem<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    pub current_page: Option<u32>,
    pub number_of_pages: Option<u32>,
    pub limit: Option<u32>,
    pub next_page: Option<u32>,
}

/// Product document. The API sends the id as `_id`, `id`, or both.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(rename = "_id")]
    pub object_id: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub price_after_discount: Option<Decimal>,
    pub image_cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<RawNamed>,
    pub brand: Option<RawNamed>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<u32>,
    pub sold: Option<u64>,
    pub quantity: Option<i64>,
}

/// Brand or category document.
#[derive(Debug, Deserialize)]
pub struct RawNamed {
    #[serde(rename = "_id")]
    pub object_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub image: Option<String>,
}

/// Cart envelope returned by every cart endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartResponse {
    pub message: Option<String>,
    pub num_of_cart_items: Option<u32>,
    pub data: Option<RawCart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCart {
    #[serde(rename = "_id")]
    pub object_id: Option<String>,
    #[serde(default)]
    pub products: Vec<RawCartLine>,
    pub total_cart_price: Option<Decimal>,
    pub total_price_after_discount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct RawCartLine {
    #[serde(rename = "_id")]
    pub object_id: Option<String>,
    pub count: Option<u32>,
    pub price: Option<Decimal>,
    pub product: RawCartProduct,
}

/// Reads return the product document; mutations return only its id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawCartProduct {
    Id(String),
    Document(Box<RawProduct>),
}

/// Sign-in and sign-up response.
#[derive(Debug, Deserialize)]
pub struct RawAuthResponse {
    pub user: Option<RawUser>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawUser {
    #[serde(rename = "_id")]
    pub object_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Token verification response: `{"message": "verified", "decoded": {...}}`.
#[derive(Debug, Deserialize)]
pub struct RawVerifyResponse {
    pub decoded: Option<RawUser>,
}

/// Password reset and change responses carry a fresh token.
#[derive(Debug, Deserialize)]
pub struct RawTokenResponse {
    pub token: Option<String>,
}

/// Wishlist mutations return the updated list of product ids.
#[derive(Debug, Deserialize)]
pub struct RawWishlistMutation {
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<String>,
}
