//! Security headers middleware.
//!
//! Locked-down defaults, loosened only for what the storefront loads from
//! elsewhere: htmx from its CDN and product images from the commerce image
//! host (plus the placeholder image service).

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};
use url::Url;

use crate::state::AppState;

/// Origin htmx is served from.
pub const HTMX_ORIGIN: &str = "https://unpkg.com";

/// Origin of the placeholder images used for products without one.
pub const PLACEHOLDER_ORIGIN: &str = "https://via.placeholder.com";

/// `scheme://host[:port]` of `url`, if it parses.
fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Build the Content-Security-Policy for an image host.
#[must_use]
pub fn content_security_policy(image_base_url: &str) -> String {
    let image_origin = origin_of(image_base_url).unwrap_or_default();
    format!(
        "default-src 'none'; \
         script-src 'self' {HTMX_ORIGIN}; \
         style-src 'self'; \
         img-src 'self' data: {image_origin} {PLACEHOLDER_ORIGIN}; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: same-origin`
/// - `Content-Security-Policy` (see [`content_security_policy`])
/// - `Permissions-Policy` denying sensors, camera, microphone and payment
/// - `Cache-Control: no-store` on pages; session-specific content must not be cached
/// - `Cross-Origin-Opener-Policy: same-origin`
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let is_static = request.uri().path().starts_with("/static/");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

    let csp = content_security_policy(&state.config().api.image_base_url);
    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), camera=(), geolocation=(), gyroscope=(), \
             magnetometer=(), microphone=(), payment=(), usb=()",
        ),
    );

    if !is_static {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_image_origin() {
        let csp = content_security_policy("https://ecommerce.routemisr.com/Route-Academy-products");
        assert!(csp.contains("img-src 'self' data: https://ecommerce.routemisr.com https://via.placeholder.com"));
        assert!(csp.contains("script-src 'self' https://unpkg.com"));
    }

    #[test]
    fn test_csp_with_unparseable_image_host() {
        let csp = content_security_policy("not a url");
        assert!(csp.contains("img-src 'self' data:  https://via.placeholder.com"));
    }

    #[test]
    fn test_origin_keeps_port() {
        assert_eq!(
            origin_of("http://127.0.0.1:8080/images").as_deref(),
            Some("http://127.0.0.1:8080")
        );
    }
}
