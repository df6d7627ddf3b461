//! FreshMart storefront library.
//!
//! A client for the routemisr commerce REST API plus the server-rendered
//! storefront built on it. The library holds everything except process
//! setup, so the CLI and the integration tests can reuse the stores and the
//! router.
//!
//! # Layout
//!
//! - [`storage`] - local key-value state (session, file or memory backed)
//! - [`api`] - typed commerce API calls over one shared HTTP client
//! - [`stores`] - auth, cart, wishlist and listing state machines
//! - [`routes`], [`middleware`] - the axum web surface

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod storage;
pub mod stores;

use axum::{Router, extract::Request};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Directory the stylesheet and other static assets are served from.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the storefront router with its middleware stack.
///
/// Sentry layers are left to the binary so tests can run without a client.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(middleware::create_session_layer(state.config()))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
