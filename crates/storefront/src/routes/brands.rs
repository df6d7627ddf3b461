//! Brand route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::{instrument, warn};

use super::{PageContext, image_src};
use crate::api::{ApiClient, Brand};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

const LOGO_IMAGE: (u32, u32) = (300, 300);

/// Brand display data for templates.
#[derive(Debug, Clone)]
pub struct BrandView {
    pub name: String,
    pub image: String,
    /// Product listing filtered to this brand.
    pub products_url: String,
}

impl BrandView {
    #[must_use]
    pub fn new(brand: &Brand, client: &ApiClient) -> Self {
        Self {
            name: brand.name.clone(),
            image: image_src(client, brand.image.as_deref(), &brand.name, LOGO_IMAGE),
            products_url: format!("/products?brand={}", urlencoding::encode(brand.id.as_str())),
        }
    }
}

/// Brands page template.
#[derive(Template, WebTemplate)]
#[template(path = "brands/index.html")]
pub struct BrandsTemplate {
    pub page: PageContext,
    pub brands: Vec<BrandView>,
    pub error: Option<String>,
}

/// Display the brand grid.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let (brands, error) = match state.api(session).list_brands().await {
        Ok(brands) => (
            brands
                .iter()
                .map(|brand| BrandView::new(brand, state.client()))
                .collect(),
            None,
        ),
        Err(e) => {
            warn!(error = %e, "Failed to load brands");
            (
                Vec::new(),
                Some("Failed to load brands. Please try again.".to_string()),
            )
        }
    };

    BrandsTemplate {
        page: PageContext::new("Our Brands", user),
        brands,
        error,
    }
}
