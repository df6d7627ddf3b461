//! FreshMart CLI - browse the catalog and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (prompts for the password when --password is omitted)
//! freshmart auth login -e mona@example.com
//!
//! # Search the catalog, cheapest first
//! freshmart products list -q "green tea" --sort price
//!
//! # Live search: type queries line by line
//! freshmart products browse
//!
//! # Cart and wishlist
//! freshmart cart add 6428ead5dc1175abc65ca0b3
//! freshmart cart coupon SAVE10
//! freshmart wishlist toggle 6428ead5dc1175abc65ca0b3
//! ```
//!
//! # Environment Variables
//!
//! - `COMMERCE_API_URL` - commerce API base URL
//! - `FRESHMART_STORAGE` - session file (default `$HOME/.freshmart/storage.json`)
//! - `CATALOG_PAGE_SIZE`, `SEARCH_DEBOUNCE_MS` - listing settings

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "freshmart")]
#[command(author, version, about = "FreshMart storefront in the terminal")]
struct Cli {
    /// Session file (overrides `FRESHMART_STORAGE`)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, sign up and manage the account
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List brands
    Brands {
        #[command(subcommand)]
        action: BrandsAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in and keep the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and keep the session
    Signup {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(long)]
        phone: String,
    },
    /// Forget the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Check the session token with the API
    Verify,
    /// Email a password reset code
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Check an emailed reset code
    VerifyResetCode { code: String },
    /// Set a new password after verifying the reset code
    ResetPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Change the logged-in user's password
    ChangePassword,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List one page of products
    List(ListArgs),
    /// Show one product
    Show { id: String },
    /// Live search: each stdin line is a query, debounced
    Browse {
        /// Sort key (`-createdAt`, `createdAt`, `price`, `-price`, `title`, `-title`)
        #[arg(short, long, default_value = "-createdAt")]
        sort: String,
    },
}

/// Listing filters.
#[derive(Args)]
pub struct ListArgs {
    /// Search text
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Sort key (`-createdAt`, `createdAt`, `price`, `-price`, `title`, `-title`)
    #[arg(short, long, default_value = "-createdAt")]
    pub sort: String,

    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Category id
    #[arg(long)]
    pub category: Option<String>,

    /// Brand id
    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub min_price: Option<rust_decimal::Decimal>,

    #[arg(long)]
    pub max_price: Option<rust_decimal::Decimal>,
}

#[derive(Subcommand)]
enum BrandsAction {
    /// List every brand
    List,
    /// Show one brand
    Show {
        /// Brand id
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add { product_id: String },
    /// Remove a product
    Remove { product_id: String },
    /// Set a product's quantity (0 removes it)
    Update { product_id: String, quantity: i64 },
    /// Empty the cart
    Clear,
    /// Apply a coupon code
    Coupon { code: String },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List the wishlist
    List,
    /// Add a product
    Add { product_id: String },
    /// Remove a product
    Remove { product_id: String },
    /// Check whether a product is wished
    Check { product_id: String },
    /// Flip a product's wished state
    Toggle { product_id: String },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "freshmart=warn,freshmart_storefront=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env(cli.storage)?;

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&ctx, &email, password).await?;
            }
            AuthAction::Signup { name, email, phone } => {
                commands::auth::signup(&ctx, name, email, phone).await?;
            }
            AuthAction::Logout => commands::auth::logout(&ctx).await,
            AuthAction::Whoami => commands::auth::whoami(&ctx).await,
            AuthAction::Verify => commands::auth::verify(&ctx).await?,
            AuthAction::ForgotPassword { email } => {
                commands::auth::forgot_password(&ctx, &email).await?;
            }
            AuthAction::VerifyResetCode { code } => {
                commands::auth::verify_reset_code(&ctx, &code).await?;
            }
            AuthAction::ResetPassword { email } => {
                commands::auth::reset_password(&ctx, &email).await?;
            }
            AuthAction::ChangePassword => commands::auth::change_password(&ctx).await?,
        },
        Commands::Products { action } => match action {
            ProductsAction::List(args) => commands::products::list(&ctx, &args).await?,
            ProductsAction::Show { id } => commands::products::show(&ctx, id).await?,
            ProductsAction::Browse { sort } => commands::products::browse(&ctx, &sort).await?,
        },
        Commands::Brands { action } => match action {
            BrandsAction::List => commands::brands::list(&ctx).await?,
            BrandsAction::Show { id } => commands::brands::show(&ctx, id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add { product_id } => commands::cart::add(&ctx, product_id).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(&ctx, product_id).await?;
            }
            CartAction::Update {
                product_id,
                quantity,
            } => commands::cart::update(&ctx, product_id, quantity).await?,
            CartAction::Clear => commands::cart::clear(&ctx).await?,
            CartAction::Coupon { code } => commands::cart::coupon(&ctx, &code).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::List => commands::wishlist::list(&ctx).await,
            WishlistAction::Add { product_id } => {
                commands::wishlist::add(&ctx, product_id).await?;
            }
            WishlistAction::Remove { product_id } => {
                commands::wishlist::remove(&ctx, product_id).await?;
            }
            WishlistAction::Check { product_id } => {
                commands::wishlist::check(&ctx, product_id).await;
            }
            WishlistAction::Toggle { product_id } => {
                commands::wishlist::toggle(&ctx, product_id).await?;
            }
        },
    }
    Ok(())
}
