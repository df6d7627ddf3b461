//! Cart commands.
//!
//! Each command re-reads the cart after its mutation and prints the server's
//! view of it.

use freshmart_core::{Price, ProductId};
use freshmart_storefront::api::Cart;
use freshmart_storefront::storage::FileStorage;
use freshmart_storefront::stores::{CartError, CartStore, LoadStatus};

use super::Context;

fn store(ctx: &Context) -> CartStore<FileStorage> {
    CartStore::new(ctx.api.clone())
}

/// The cart as printable lines.
fn cart_lines(cart: &Cart) -> Vec<String> {
    if cart.is_empty() {
        return vec!["Your cart is empty".to_string()];
    }

    let mut lines: Vec<String> = cart
        .lines
        .iter()
        .map(|line| {
            format!(
                "{:<26} {:<40} {} x {} = {}",
                line.product.id.as_str(),
                line.product.title.as_deref().unwrap_or("Product"),
                line.count,
                Price::from_amount(line.price),
                Price::from_amount(line.line_total()),
            )
        })
        .collect();

    lines.push(format!("Subtotal: {}", Price::from_amount(cart.total_cart_price)));
    if let Some(discounted) = cart.total_price_after_discount {
        lines.push(format!("After discount: {}", Price::from_amount(discounted)));
    }
    lines.push(format!("Total: {}", Price::from_amount(cart.displayed_total())));
    lines
}

#[allow(clippy::print_stdout)]
fn print_cart(store: &CartStore<FileStorage>) {
    if store.state().status == LoadStatus::Error
        && let Some(error) = &store.state().error
    {
        println!("{error}");
        return;
    }
    for line in cart_lines(store.cart()) {
        println!("{line}");
    }
}

#[allow(clippy::print_stdout)]
fn report(store: &CartStore<FileStorage>, result: Result<String, CartError>) -> Result<(), CartError> {
    let message = result?;
    println!("{message}");
    print_cart(store);
    Ok(())
}

/// Print the cart.
///
/// # Errors
///
/// Returns [`CartError::LoginRequired`] without a session.
pub async fn show(ctx: &Context) -> Result<(), CartError> {
    let mut store = store(ctx);
    if !store.has_session().await {
        return Err(CartError::LoginRequired("Please log in to view your cart"));
    }
    store.fetch().await;
    print_cart(&store);
    Ok(())
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns the message of a failed mutation.
pub async fn add(ctx: &Context, product_id: String) -> Result<(), CartError> {
    let mut store = store(ctx);
    let result = store.add_item(&ProductId::new(product_id)).await;
    report(&store, result)
}

/// Remove a product.
///
/// # Errors
///
/// Returns the message of a failed mutation.
pub async fn remove(ctx: &Context, product_id: String) -> Result<(), CartError> {
    let mut store = store(ctx);
    let result = store.remove_item(&ProductId::new(product_id)).await;
    report(&store, result)
}

/// Set a product's quantity; zero or less removes it.
///
/// # Errors
///
/// Returns the message of a failed mutation.
pub async fn update(ctx: &Context, product_id: String, quantity: i64) -> Result<(), CartError> {
    let mut store = store(ctx);
    let result = store
        .update_quantity(&ProductId::new(product_id), quantity)
        .await;
    report(&store, result)
}

/// Empty the cart.
///
/// # Errors
///
/// Returns the message of a failed mutation.
pub async fn clear(ctx: &Context) -> Result<(), CartError> {
    let mut store = store(ctx);
    let result = store.clear_cart().await;
    report(&store, result)
}

/// Apply a coupon code.
///
/// # Errors
///
/// Returns the server's message for a rejected coupon.
pub async fn coupon(ctx: &Context, code: &str) -> Result<(), CartError> {
    let mut store = store(ctx);
    let result = store.apply_coupon(code).await;
    report(&store, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use freshmart_storefront::api::{CartLine, CartProduct};
    use rust_decimal::Decimal;

    #[test]
    fn test_empty_cart_lines() {
        assert_eq!(cart_lines(&Cart::empty()), vec!["Your cart is empty"]);
    }

    #[test]
    fn test_cart_lines_show_discount() {
        let cart = Cart {
            lines: vec![CartLine {
                id: None,
                product: CartProduct {
                    id: ProductId::new("p1"),
                    title: Some("Green Tea".to_string()),
                    image_cover: None,
                    category: None,
                    brand: None,
                    quantity: None,
                },
                count: 2,
                price: Decimal::from(50),
            }],
            num_of_cart_items: 2,
            total_cart_price: Decimal::from(100),
            total_price_after_discount: Some(Decimal::from(90)),
            ..Cart::default()
        };
        let lines = cart_lines(&cart);
        assert!(lines.first().is_some_and(|l| l.contains("2 x EGP 50.00 = EGP 100.00")));
        assert!(lines.contains(&"After discount: EGP 90.00".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Total: EGP 90.00"));
    }
}
