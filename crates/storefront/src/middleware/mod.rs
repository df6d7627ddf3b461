//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, added by the binary)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the request span)
//! 4. Session layer (tower-sessions with an in-memory store)
//! 5. Security headers (CSP, framing, referrer)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{LoginRequired, OptionalAuth, RequireAuth};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
