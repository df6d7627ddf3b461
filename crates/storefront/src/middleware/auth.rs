//! Authentication extractors.
//!
//! The logged-in user is whatever the visitor's session holds under the
//! `token` and `user` keys. Gated pages render a "Login Required"
//! placeholder in place of their content instead of redirecting.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use tower_sessions::Session;

use crate::api::User;
use crate::filters;
use crate::routes::PageContext;
use crate::state::AppState;
use crate::stores::AuthStore;

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn wishlist_page(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub User);

/// Extractor that optionally gets the logged-in user.
pub struct OptionalAuth(pub Option<User>);

/// Placeholder shown in place of a gated page, rendered with 200 OK.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login_required.html")]
pub struct LoginRequired {
    pub page: PageContext,
    /// What the visitor was trying to see, e.g. "your cart".
    pub feature: &'static str,
}

impl LoginRequired {
    /// The placeholder for the page at `path`.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let (title, feature) = if path.starts_with("/cart") {
            ("Cart", "your cart")
        } else if path.starts_with("/wishlist") {
            ("Wishlist", "your wishlist")
        } else {
            ("Login Required", "this page")
        };
        Self {
            page: PageContext::new(title, None),
            feature,
        }
    }
}

/// Read the logged-in user from the request's session.
async fn current_user(parts: &Parts, state: &AppState) -> Option<User> {
    let session = parts.extensions.get::<Session>()?.clone();
    AuthStore::new(state.api(session)).current().await
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = LoginRequired;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped path.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path().to_string(), |uri| uri.path().to_string());
        current_user(parts, state)
            .await
            .map(Self)
            .ok_or_else(|| LoginRequired::for_path(&path))
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts, state).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_required_titles() {
        assert_eq!(LoginRequired::for_path("/cart").feature, "your cart");
        assert_eq!(LoginRequired::for_path("/wishlist").page.title, "Wishlist");
        assert_eq!(LoginRequired::for_path("/other").feature, "this page");
    }

    #[test]
    fn test_login_required_renders_placeholder() {
        let html = LoginRequired::for_path("/cart").render().unwrap_or_default();
        assert!(html.contains("Login Required"));
        assert!(html.contains("href=\"/login\""));
    }
}
