//! Conversions from wire shapes to domain types.

use freshmart_core::{BrandId, CartId, CartLineId, CategoryId, ProductId, UserId};
use rust_decimal::Decimal;

use super::types::{
    Brand, Cart, CartLine, CartProduct, Category, PageMetadata, Product, ProductPage, TokenClaims,
    User, WishlistItem,
};
use super::wire::{
    RawCart, RawCartLine, RawCartProduct, RawList, RawMetadata, RawNamed, RawProduct, RawUser,
};

/// Pick whichever id the document carries, preferring `_id`.
fn pick_id(object_id: Option<String>, id: Option<String>) -> Option<String> {
    object_id
        .filter(|s| !s.is_empty())
        .or_else(|| id.filter(|s| !s.is_empty()))
}

// =============================================================================
// Catalog
// =============================================================================

pub fn convert_category(raw: RawNamed) -> Option<Category> {
    let id = pick_id(raw.object_id, raw.id)?;
    Some(Category {
        id: CategoryId::new(id),
        name: raw.name.unwrap_or_default(),
        slug: raw.slug.unwrap_or_default(),
        image: raw.image,
    })
}

pub fn convert_brand(raw: RawNamed) -> Option<Brand> {
    let id = pick_id(raw.object_id, raw.id)?;
    Some(Brand {
        id: BrandId::new(id),
        name: raw.name.unwrap_or_default(),
        slug: raw.slug.unwrap_or_default(),
        image: raw.image,
    })
}

/// Convert a product document. Documents without any id are dropped.
pub fn convert_product(raw: RawProduct) -> Option<Product> {
    let Some(id) = pick_id(raw.object_id, raw.id) else {
        tracing::warn!(title = ?raw.title, "Dropping product without id");
        return None;
    };

    Some(Product {
        id: ProductId::new(id),
        title: raw.title.unwrap_or_default(),
        slug: raw.slug.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        price: raw.price.unwrap_or(Decimal::ZERO),
        price_after_discount: raw.price_after_discount,
        image_cover: raw.image_cover.filter(|s| !s.is_empty()),
        images: raw.images,
        category: raw.category.and_then(convert_category),
        brand: raw.brand.and_then(convert_brand),
        ratings_average: raw.ratings_average,
        ratings_quantity: raw.ratings_quantity.unwrap_or(0),
        sold: raw.sold,
        quantity: raw.quantity,
    })
}

fn convert_metadata(raw: RawMetadata) -> PageMetadata {
    PageMetadata {
        current_page: raw.current_page.unwrap_or(1),
        number_of_pages: raw.number_of_pages.unwrap_or(1),
        limit: raw.limit.unwrap_or(0),
        next_page: raw.next_page,
    }
}

pub fn convert_product_page(raw: RawList<RawProduct>) -> ProductPage {
    let products: Vec<Product> = raw.data.into_iter().filter_map(convert_product).collect();
    let results = raw
        .results
        .unwrap_or_else(|| u64::try_from(products.len()).unwrap_or(u64::MAX));
    ProductPage {
        products,
        results,
        metadata: raw.metadata.map(convert_metadata),
    }
}

// =============================================================================
// Cart
// =============================================================================

fn convert_cart_product(raw: RawCartProduct) -> Option<CartProduct> {
    match raw {
        RawCartProduct::Id(id) if !id.is_empty() => Some(CartProduct {
            id: ProductId::new(id),
            title: None,
            image_cover: None,
            category: None,
            brand: None,
            quantity: None,
        }),
        RawCartProduct::Id(_) => None,
        RawCartProduct::Document(doc) => {
            let product = convert_product(*doc)?;
            Some(CartProduct {
                id: product.id,
                title: Some(product.title),
                image_cover: product.image_cover,
                category: product.category,
                brand: product.brand,
                quantity: product.quantity,
            })
        }
    }
}

fn convert_cart_line(raw: RawCartLine) -> Option<CartLine> {
    let product = convert_cart_product(raw.product)?;
    Some(CartLine {
        id: raw.object_id.map(CartLineId::new),
        product,
        count: raw.count.unwrap_or(1).max(1),
        price: raw.price.unwrap_or(Decimal::ZERO),
    })
}

/// Convert a cart snapshot.
///
/// A discounted total above the cart total is discarded so the displayed total
/// falls back to the undiscounted one.
pub fn convert_cart(raw: RawCart, num_of_cart_items: Option<u32>) -> Cart {
    let lines: Vec<CartLine> = raw
        .products
        .into_iter()
        .filter_map(convert_cart_line)
        .collect();
    let total_cart_price = raw.total_cart_price.unwrap_or(Decimal::ZERO);

    let total_price_after_discount = match raw.total_price_after_discount {
        Some(discounted) if discounted > total_cart_price => {
            tracing::warn!(
                %discounted,
                total = %total_cart_price,
                "Discarding discounted total above cart total"
            );
            None
        }
        other => other,
    };

    let num_of_cart_items = num_of_cart_items
        .unwrap_or_else(|| u32::try_from(lines.len()).unwrap_or(u32::MAX));

    Cart {
        id: raw.object_id.map(CartId::new),
        lines,
        num_of_cart_items,
        total_cart_price,
        total_price_after_discount,
    }
}

// =============================================================================
// Wishlist
// =============================================================================

pub fn convert_wishlist(raw: RawList<RawProduct>) -> Vec<WishlistItem> {
    raw.data
        .into_iter()
        .filter_map(convert_product)
        .map(WishlistItem::from)
        .collect()
}

// =============================================================================
// Auth
// =============================================================================

pub fn convert_user(raw: RawUser) -> User {
    User {
        id: pick_id(raw.object_id, raw.id).map(UserId::new),
        name: raw.name.unwrap_or_default(),
        email: raw.email.unwrap_or_default(),
        role: raw.role,
    }
}

pub fn convert_claims(raw: RawUser) -> Option<TokenClaims> {
    let id = pick_id(raw.object_id, raw.id)?;
    Some(TokenClaims {
        id: UserId::new(id),
        name: raw.name.unwrap_or_default(),
        role: raw.role,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw_cart(json: &str) -> RawCart {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_convert_product_prefers_object_id() {
        let raw: RawProduct =
            serde_json::from_str(r#"{"_id":"a","id":"b","title":"Bread","price":10}"#).unwrap();
        let product = convert_product(raw).unwrap();
        assert_eq!(product.id.as_str(), "a");
    }

    #[test]
    fn test_convert_product_accepts_plain_id() {
        let raw: RawProduct = serde_json::from_str(r#"{"id":"b","title":"Bread"}"#).unwrap();
        let product = convert_product(raw).unwrap();
        assert_eq!(product.id.as_str(), "b");
        assert_eq!(product.price, Decimal::ZERO);
    }

    #[test]
    fn test_convert_product_without_id_is_dropped() {
        let raw: RawProduct = serde_json::from_str(r#"{"title":"Ghost"}"#).unwrap();
        assert!(convert_product(raw).is_none());
    }

    #[test]
    fn test_convert_cart_discards_discount_above_total() {
        let cart = convert_cart(
            raw_cart(r#"{"_id":"c","products":[],"totalCartPrice":100,"totalPriceAfterDiscount":120}"#),
            Some(0),
        );
        assert_eq!(cart.total_price_after_discount, None);
        assert_eq!(cart.displayed_total(), Decimal::from(100));
    }

    #[test]
    fn test_convert_cart_keeps_valid_discount() {
        let cart = convert_cart(
            raw_cart(r#"{"_id":"c","products":[],"totalCartPrice":100,"totalPriceAfterDiscount":90}"#),
            None,
        );
        assert_eq!(cart.total_price_after_discount, Some(Decimal::from(90)));
        assert_eq!(cart.num_of_cart_items, 0);
    }

    #[test]
    fn test_convert_cart_lines_from_ids_and_documents() {
        let cart = convert_cart(
            raw_cart(
                r#"{"_id":"c","totalCartPrice":50,"products":[
                    {"_id":"l1","count":2,"price":10,"product":"p1"},
                    {"_id":"l2","count":0,"price":30,"product":{"_id":"p2","title":"Cheese","quantity":4}}
                ]}"#,
            ),
            Some(2),
        );
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].product.id.as_str(), "p1");
        assert_eq!(cart.lines[0].line_total(), Decimal::from(20));
        assert_eq!(cart.lines[1].product.title.as_deref(), Some("Cheese"));
        assert_eq!(cart.lines[1].count, 1);
    }

    #[test]
    fn test_convert_user_without_id() {
        let raw: RawUser =
            serde_json::from_str(r#"{"name":"Mona","email":"mona@example.com","role":"user"}"#)
                .unwrap();
        let user = convert_user(raw);
        assert!(user.id.is_none());
        assert_eq!(user.name, "Mona");
    }
}
