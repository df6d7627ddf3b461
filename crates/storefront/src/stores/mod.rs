//! Client-side stores.
//!
//! Each store is an explicit value built from an [`Api`](crate::api::Api)
//! bound to one visitor's storage:
//!
//! - [`AuthStore`] - login, signup, logout and password flows
//! - [`CartStore`] - server cart mirror driven by a reducer
//! - [`WishlistStore`] - server wishlist with a local fallback
//! - [`ListingState`] - search, sort, filters and pagination
//! - [`debounce`] - trailing-edge debounce for search input
//! - [`OptimisticToggles`] - tentative flags reverted on failure

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod debounce;
pub mod toggle;
pub mod wishlist;

pub use auth::{AuthError, AuthStore};
pub use cart::{CartAction, CartError, CartState, CartStore, LoadStatus, reduce};
pub use catalog::{ListingState, PageLink, page_links, total_pages};
pub use debounce::debounce;
pub use toggle::OptimisticToggles;
pub use wishlist::{DEGRADED_NOTICE, LOCAL_NOTICE, Sourced, WishlistStore};
