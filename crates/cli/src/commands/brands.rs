//! Brand commands.

use freshmart_core::BrandId;

use super::Context;

/// Print every brand.
///
/// # Errors
///
/// Returns an error when the brands cannot be loaded.
#[allow(clippy::print_stdout)]
pub async fn list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let brands = ctx.api.list_brands().await?;
    for brand in &brands {
        println!("{:<26} {}", brand.id.as_str(), brand.name);
    }
    println!(
        "{} brand{} available",
        brands.len(),
        if brands.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Print one brand.
///
/// # Errors
///
/// Returns an error when the brand cannot be loaded.
#[allow(clippy::print_stdout)]
pub async fn show(ctx: &Context, id: String) -> Result<(), Box<dyn std::error::Error>> {
    let brand = ctx.api.get_brand(&BrandId::new(id)).await?;
    println!("{} ({})", brand.name, brand.slug);
    if let Some(image) = &brand.image {
        println!("Logo: {}", ctx.api.client().image_url(image));
    }
    println!("Products: freshmart products list --brand {}", brand.id.as_str());
    Ok(())
}
