//! Wishlist commands.
//!
//! Logged out, or when the wishlist API fails, the list lives in the session
//! file instead; each command says so.

use freshmart_core::{Price, ProductId};
use freshmart_storefront::api::WishlistItem;
use freshmart_storefront::storage::FileStorage;
use freshmart_storefront::stores::{OptimisticToggles, Sourced, WishlistStore};

use super::Context;

fn store(ctx: &Context) -> WishlistStore<FileStorage> {
    WishlistStore::new(ctx.api.clone())
}

fn item_row(item: &WishlistItem) -> String {
    format!(
        "{:<26} {:<40} {}",
        item.id.as_str(),
        item.title,
        Price::from_amount(item.price)
    )
}

#[allow(clippy::print_stdout)]
fn print_notice<T>(sourced: &Sourced<T>) {
    if let Some(notice) = sourced.notice() {
        println!("({notice})");
    }
}

/// Print the wishlist.
#[allow(clippy::print_stdout)]
pub async fn list(ctx: &Context) {
    let items = store(ctx).get_items().await;
    print_notice(&items);
    if items.data().is_empty() {
        println!("Your wishlist is empty");
    }
    for item in items.data() {
        println!("{}", item_row(item));
    }
}

/// Add a product.
///
/// # Errors
///
/// Returns an error when the product cannot be loaded or the local fallback
/// cannot be written.
#[allow(clippy::print_stdout)]
pub async fn add(ctx: &Context, product_id: String) -> Result<(), Box<dyn std::error::Error>> {
    let product = ctx.api.get_product(&ProductId::new(product_id)).await?;
    let outcome = store(ctx).add(&product).await?;
    print_notice(&outcome);
    println!("{}", outcome.into_inner());
    Ok(())
}

/// Remove a product.
///
/// # Errors
///
/// Returns an error when the local fallback cannot be written.
#[allow(clippy::print_stdout)]
pub async fn remove(ctx: &Context, product_id: String) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = store(ctx).remove(&ProductId::new(product_id)).await?;
    print_notice(&outcome);
    println!("{}", outcome.into_inner());
    Ok(())
}

/// Print whether a product is wished.
#[allow(clippy::print_stdout)]
pub async fn check(ctx: &Context, product_id: String) {
    let wished = store(ctx).is_in_wishlist(&ProductId::new(product_id)).await;
    print_notice(&wished);
    if *wished.data() {
        println!("In your wishlist");
    } else {
        println!("Not in your wishlist");
    }
}

/// Flip a product's wished state.
///
/// The flag flips first and reverts if the mutation fails.
///
/// # Errors
///
/// Returns the error of the failed mutation.
#[allow(clippy::print_stdout)]
pub async fn toggle(ctx: &Context, product_id: String) -> Result<(), Box<dyn std::error::Error>> {
    let wishlist = store(ctx);
    let product_id = ProductId::new(product_id);

    let toggles = OptimisticToggles::new();
    let current = wishlist.is_in_wishlist(&product_id).await;
    toggles.set(product_id.clone(), *current.data());

    let api = ctx.api.clone();
    let target = product_id.clone();
    let mut settled = None;
    let slot = &mut settled;
    let result = toggles
        .toggle(product_id.clone(), |wished| async move {
            let outcome = if wished {
                let product = api.get_product(&target).await?;
                wishlist.add(&product).await?
            } else {
                wishlist.remove(&target).await?
            };
            *slot = Some(outcome);
            Ok::<_, Box<dyn std::error::Error>>(())
        })
        .await;

    match result {
        Ok(wished) => {
            if let Some(outcome) = settled {
                print_notice(&outcome);
                println!("{}", outcome.into_inner());
            }
            let state = if wished { "added to" } else { "removed from" };
            println!("{product_id} {state} your wishlist");
            Ok(())
        }
        Err(e) => {
            let shown = if toggles.get(&product_id) { "in" } else { "not in" };
            println!("Could not update your wishlist; {product_id} is still {shown} it.");
            Err(e)
        }
    }
}
