//! Product listing sort keys.
//!
//! The API takes the sort as a field name with an optional `-` prefix for
//! descending order.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The sort key was not one of the supported values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key: {0}")]
pub struct UnknownSortKey(pub String);

/// Sort order for the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
}

impl ProductSort {
    /// All sort keys, in the order they are offered to shoppers.
    pub const ALL: [Self; 6] = [
        Self::Newest,
        Self::Oldest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::TitleAsc,
        Self::TitleDesc,
    ];

    /// Value sent as the `sort` query parameter.
    #[must_use]
    pub const fn as_api_str(self) -> &'static str {
        match self {
            Self::Newest => "-createdAt",
            Self::Oldest => "createdAt",
            Self::PriceAsc => "price",
            Self::PriceDesc => "-price",
            Self::TitleAsc => "title",
            Self::TitleDesc => "-title",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest First",
            Self::Oldest => "Oldest First",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::TitleAsc => "Name: A to Z",
            Self::TitleDesc => "Name: Z to A",
        }
    }

    /// Parse a sort key, falling back to [`ProductSort::Newest`] for unknown or
    /// empty input.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for ProductSort {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_api_str() == s.trim())
            .ok_or_else(|| UnknownSortKey(s.to_owned()))
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl TryFrom<String> for ProductSort {
    type Error = UnknownSortKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProductSort> for String {
    fn from(sort: ProductSort) -> Self {
        sort.as_api_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_values() {
        assert_eq!("-price".parse::<ProductSort>(), Ok(ProductSort::PriceDesc));
        assert_eq!("title".parse::<ProductSort>(), Ok(ProductSort::TitleAsc));
        assert!("rating".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(ProductSort::parse_or_default(""), ProductSort::Newest);
        assert_eq!(ProductSort::parse_or_default("createdAt"), ProductSort::Oldest);
    }

    #[test]
    fn test_every_key_parses_back() {
        for sort in ProductSort::ALL {
            assert_eq!(sort.as_api_str().parse::<ProductSort>(), Ok(sort));
        }
    }
}
