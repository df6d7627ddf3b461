//! Catalog commands.

use freshmart_core::{BrandId, CategoryId, ProductId, ProductSort};
use freshmart_storefront::api::Product;
use freshmart_storefront::stores::{ListingState, debounce};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::Context;
use crate::ListArgs;

/// One listing row: id, title, price, and a stock badge when there is one.
fn product_row(product: &Product) -> String {
    let mut row = format!(
        "{:<26} {:<40} {}",
        product.id.as_str(),
        product.title,
        product.effective_price()
    );
    if product.is_on_sale() {
        row.push_str(&format!(" (was {})", product.price()));
    }
    if let Some(badge) = product.stock_status().badge() {
        row.push_str(&format!(" [{badge}]"));
    }
    row
}

#[allow(clippy::print_stdout)]
fn print_listing(listing: &ListingState) {
    if let Some(error) = listing.error() {
        println!("{error}");
        return;
    }
    if listing.products().is_empty() {
        println!("No products found.");
    }
    for product in listing.products() {
        println!("{}", product_row(product));
    }
    let (from, to) = listing.showing_range();
    println!(
        "Showing {from} to {to} of {} products (page {} of {})",
        listing.results(),
        listing.page(),
        listing.total_pages()
    );
}

/// Print one page of the listing.
///
/// # Errors
///
/// Returns an error for an unknown sort key.
pub async fn list(ctx: &Context, args: &ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut listing = ListingState::new(ctx.catalog.page_size);
    listing.set_sort(args.sort.parse::<ProductSort>()?);
    if let Some(search) = &args.search {
        listing.set_search(search.as_str());
    }
    listing.set_category(args.category.clone().map(CategoryId::new));
    listing.set_brand(args.brand.clone().map(BrandId::new));
    listing.set_price_range(args.min_price, args.max_price);
    listing.set_page(args.page);

    listing.fetch(&ctx.api).await;
    print_listing(&listing);
    Ok(())
}

/// Print one product's details.
///
/// # Errors
///
/// Returns an error when the product cannot be loaded.
#[allow(clippy::print_stdout)]
pub async fn show(ctx: &Context, id: String) -> Result<(), Box<dyn std::error::Error>> {
    let product = ctx.api.get_product(&ProductId::new(id)).await?;

    println!("{}", product.title);
    println!("{}", product_row(&product));
    if let Some(category) = &product.category {
        println!("Category: {}", category.name);
    }
    if let Some(brand) = &product.brand {
        println!("Brand: {}", brand.name);
    }
    if let Some(rating) = product.ratings_average {
        println!("Rating: {rating:.1} ({} reviews)", product.ratings_quantity);
    }
    if let Some(quantity) = product.quantity {
        println!("In stock: {quantity}");
    }
    if let Some(image) = &product.image_cover {
        println!("Image: {}", ctx.api.client().image_url(image));
    }
    println!();
    println!("{}", product.description);
    Ok(())
}

/// Live search over stdin.
///
/// Each line replaces the search text. Lines typed within the debounce
/// window collapse into one fetch for the last of them, which always starts
/// from page 1. End of input flushes the pending query and exits.
///
/// # Errors
///
/// Returns an error for an unknown sort key.
#[allow(clippy::print_stdout)]
pub async fn browse(ctx: &Context, sort: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut listing = ListingState::new(ctx.catalog.page_size);
    listing.set_sort(sort.parse::<ProductSort>()?);

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line.trim().to_string()).await.is_err() {
                break;
            }
        }
    });

    println!("Type to search; Ctrl+D to quit.");
    let mut queries = debounce(ctx.catalog.search_debounce, rx);
    while let Some(query) = queries.recv().await {
        listing.set_search(query);
        listing.fetch(&ctx.api).await;
        println!("--- \"{}\"", listing.search());
        print_listing(&listing);
    }
    Ok(())
}
