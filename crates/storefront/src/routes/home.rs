//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use super::PageContext;
use crate::filters;
use crate::middleware::OptionalAuth;

/// A featured category tile.
#[derive(Debug, Clone)]
pub struct FeaturedCategory {
    pub name: &'static str,
    pub blurb: &'static str,
}

/// Tiles shown below the hero.
pub static FEATURED_CATEGORIES: [FeaturedCategory; 3] = [
    FeaturedCategory {
        name: "Electronics",
        blurb: "Latest gadgets and technology",
    },
    FeaturedCategory {
        name: "Clothing",
        blurb: "Fashion for every occasion",
    },
    FeaturedCategory {
        name: "Books",
        blurb: "Expand your knowledge",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub categories: &'static [FeaturedCategory],
}

/// Display the home page.
pub async fn home(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    HomeTemplate {
        page: PageContext::new("FreshMart", user),
        categories: &FEATURED_CATEGORIES,
    }
}
