//! FreshMart Core - Shared types library.
//!
//! This crate provides common types used across the FreshMart components:
//! - `storefront` - Server-rendered storefront and the commerce API client
//! - `cli` - Terminal client for the same commerce API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, stock and sort keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
