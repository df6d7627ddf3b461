//! Domain types for the commerce API.
//!
//! These types provide a clean API separate from the raw wire shapes the
//! server returns (see `wire.rs`).

use freshmart_core::{
    BrandId, CartId, CartLineId, CategoryId, Price, ProductId, ProductSort, StockStatus, UserId,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog Types
// =============================================================================

/// Product category reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A product as listed or shown in detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub description: String,
    /// Regular price.
    pub price: Decimal,
    /// Sale price, when the product is discounted.
    pub price_after_discount: Option<Decimal>,
    /// Cover image (relative path or absolute URL).
    pub image_cover: Option<String>,
    pub images: Vec<String>,
    pub category: Option<Category>,
    pub brand: Option<Brand>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: u32,
    pub sold: Option<u64>,
    /// Units in stock. Unknown when the API omits it.
    pub quantity: Option<i64>,
}

impl Product {
    /// Regular price with currency.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::from_amount(self.price)
    }

    /// The price a shopper pays: the sale price when one applies.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        Price::from_amount(
            self.price_after_discount
                .filter(|p| *p < self.price)
                .unwrap_or(self.price),
        )
    }

    /// Whether a sale price below the regular price applies.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.price_after_discount.is_some_and(|p| p < self.price)
    }

    /// Stock status; unknown quantity reads as in stock.
    #[must_use]
    pub fn stock_status(&self) -> StockStatus {
        self.quantity
            .map_or(StockStatus::InStock, StockStatus::from_quantity)
    }
}

/// Listing pagination metadata reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageMetadata {
    pub current_page: u32,
    pub number_of_pages: u32,
    pub limit: u32,
    pub next_page: Option<u32>,
}

/// One page of a product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total number of matching products across all pages.
    pub results: u64,
    pub metadata: Option<PageMetadata>,
}

/// Product listing query.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub limit: u32,
    /// 1-based page number.
    pub page: u32,
    pub sort: ProductSort,
    pub keyword: Option<String>,
    pub category: Option<CategoryId>,
    pub brand: Option<BrandId>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            limit: 24,
            page: 1,
            sort: ProductSort::default(),
            keyword: None,
            category: None,
            brand: None,
            price_gte: None,
            price_lte: None,
        }
    }
}

impl ProductQuery {
    /// Query-string pairs in the API's parameter names.
    ///
    /// Blank keywords are omitted.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("page", self.page.max(1).to_string()),
            ("sort", self.sort.as_api_str().to_string()),
        ];
        if let Some(keyword) = self.keyword.as_deref().map(str::trim)
            && !keyword.is_empty()
        {
            pairs.push(("keyword", keyword.to_string()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category[in]", category.to_string()));
        }
        if let Some(brand) = &self.brand {
            pairs.push(("brand", brand.to_string()));
        }
        if let Some(min) = self.price_gte {
            pairs.push(("price[gte]", min.to_string()));
        }
        if let Some(max) = self.price_lte {
            pairs.push(("price[lte]", max.to_string()));
        }
        pairs
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// The product side of a cart line.
///
/// Mutation responses return only the product id; reads return the product.
#[derive(Debug, Clone, PartialEq)]
pub struct CartProduct {
    pub id: ProductId,
    pub title: Option<String>,
    pub image_cover: Option<String>,
    pub category: Option<Category>,
    pub brand: Option<Brand>,
    pub quantity: Option<i64>,
}

/// One line of the server-side cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: Option<CartLineId>,
    pub product: CartProduct,
    /// Always at least 1.
    pub count: u32,
    /// Unit price at the time the line was added.
    pub price: Decimal,
}

impl CartLine {
    /// Unit price times count.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.count)
    }
}

/// Snapshot of the server-side cart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cart {
    pub id: Option<CartId>,
    pub lines: Vec<CartLine>,
    pub num_of_cart_items: u32,
    pub total_cart_price: Decimal,
    /// Present only after a valid coupon; never above `total_cart_price`.
    pub total_price_after_discount: Option<Decimal>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line holding `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product.id == product_id)
    }

    /// The total a shopper pays: the discounted total when present.
    #[must_use]
    pub fn displayed_total(&self) -> Decimal {
        self.total_price_after_discount
            .unwrap_or(self.total_cart_price)
    }
}

// =============================================================================
// Wishlist Types
// =============================================================================

/// Product snapshot kept in a wishlist.
///
/// This is also the JSON shape of the local `wishlist` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub brand: Option<Brand>,
}

impl From<&Product> for WishlistItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            image_cover: product.image_cover.clone(),
            images: product.images.clone(),
            category: product.category.clone(),
            brand: product.brand.clone(),
        }
    }
}

impl From<Product> for WishlistItem {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image_cover: product.image_cover,
            images: product.images,
            category: product.category,
            brand: product.brand,
        }
    }
}

// =============================================================================
// Auth Types
// =============================================================================

/// The logged-in user, persisted as JSON under the `user` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The sign-in response omits the id; it is learned from token verification.
    #[serde(default)]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// A token and the user it belongs to.
#[derive(Debug)]
pub struct AuthSession {
    pub token: SecretString,
    pub user: User,
}

/// Login form input.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Signup form input.
#[derive(Debug)]
pub struct SignupData {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub re_password: SecretString,
    pub phone: String,
}

/// Password change input for a logged-in user.
#[derive(Debug)]
pub struct PasswordChange {
    pub current_password: SecretString,
    pub password: SecretString,
    pub re_password: SecretString,
}

/// Claims returned by token verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub id: UserId,
    pub name: String,
    pub role: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(price: &str, after: Option<&str>, quantity: Option<i64>) -> Product {
        Product {
            id: ProductId::new("p1"),
            title: "Apples".to_string(),
            slug: "apples".to_string(),
            description: String::new(),
            price: Decimal::from_str(price).unwrap(),
            price_after_discount: after.map(|a| Decimal::from_str(a).unwrap()),
            image_cover: None,
            images: vec![],
            category: None,
            brand: None,
            ratings_average: None,
            ratings_quantity: 0,
            sold: None,
            quantity,
        }
    }

    #[test]
    fn test_effective_price_uses_lower_sale_price() {
        let p = product("100", Some("80"), None);
        assert!(p.is_on_sale());
        assert_eq!(p.effective_price().amount, Decimal::from(80));
    }

    #[test]
    fn test_effective_price_ignores_higher_sale_price() {
        let p = product("100", Some("120"), None);
        assert!(!p.is_on_sale());
        assert_eq!(p.effective_price().amount, Decimal::from(100));
    }

    #[test]
    fn test_stock_status_unknown_quantity_is_in_stock() {
        assert_eq!(product("1", None, None).stock_status(), StockStatus::InStock);
        assert_eq!(
            product("1", None, Some(0)).stock_status(),
            StockStatus::OutOfStock
        );
    }

    #[test]
    fn test_query_pairs_defaults() {
        let pairs = ProductQuery::default().to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("limit", "24".to_string()),
                ("page", "1".to_string()),
                ("sort", "-createdAt".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_filters_and_blank_keyword() {
        let query = ProductQuery {
            keyword: Some("   ".to_string()),
            category: Some(CategoryId::new("c1")),
            brand: Some(BrandId::new("b1")),
            price_gte: Some(Decimal::from(10)),
            price_lte: Some(Decimal::from(50)),
            ..ProductQuery::default()
        };
        let pairs = query.to_query_pairs();
        assert!(!pairs.iter().any(|(k, _)| *k == "keyword"));
        assert!(pairs.contains(&("category[in]", "c1".to_string())));
        assert!(pairs.contains(&("brand", "b1".to_string())));
        assert!(pairs.contains(&("price[gte]", "10".to_string())));
        assert!(pairs.contains(&("price[lte]", "50".to_string())));
    }

    #[test]
    fn test_cart_displayed_total() {
        let mut cart = Cart {
            total_cart_price: Decimal::from(200),
            ..Cart::empty()
        };
        assert_eq!(cart.displayed_total(), Decimal::from(200));

        cart.total_price_after_discount = Some(Decimal::from(150));
        assert_eq!(cart.displayed_total(), Decimal::from(150));
    }

    #[test]
    fn test_wishlist_item_local_json_shape() {
        let item = WishlistItem::from(product("25", None, Some(3)));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "p1");
        assert!(json.get("imageCover").is_some());

        let back: WishlistItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
