//! Core types for FreshMart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod sort;
pub mod stock;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use sort::{ProductSort, UnknownSortKey};
pub use stock::StockStatus;
