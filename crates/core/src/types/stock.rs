//! Stock availability derived from a product's quantity.

use serde::{Deserialize, Serialize};

/// Quantity at or below which a product is shown as "Low Stock".
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Stock badge shown on product cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[default]
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// Classify a stock quantity. Negative quantities count as sold out.
    #[must_use]
    pub const fn from_quantity(quantity: i64) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= LOW_STOCK_THRESHOLD {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    /// Badge label, or `None` when no badge is shown.
    #[must_use]
    pub const fn badge(self) -> Option<&'static str> {
        match self {
            Self::InStock => None,
            Self::LowStock => Some("Low Stock"),
            Self::OutOfStock => Some("Out of Stock"),
        }
    }

    /// Whether the product can be added to a cart.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        !matches!(self, Self::OutOfStock)
    }
}
