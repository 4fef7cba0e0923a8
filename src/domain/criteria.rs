//! Filter criteria: the canonical in-memory form of every filter, sort and
//! pagination choice.
//!
//! Sets and maps are ordered (`BTreeSet`/`BTreeMap`) so two criteria built
//! in a different order compare equal and serialize identically. Criteria are
//! treated as values: the store never edits one in place, it derives a new one
//! for every intent.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Page size used when the address does not name one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// First page number.
pub const FIRST_PAGE: u32 = 1;

/// Result ordering requested from the data layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    /// Newest items first. The default, never written to the address.
    #[default]
    #[serde(rename = "recent")]
    Recent,
    #[serde(rename = "priceAsc")]
    PriceAscending,
    #[serde(rename = "priceDesc")]
    PriceDescending,
    #[serde(rename = "popular")]
    Popular,
}

impl SortKey {
    /// Wire name used in the query string and request params.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::PriceAscending => "priceAsc",
            Self::PriceDescending => "priceDesc",
            Self::Popular => "popular",
        }
    }

    #[must_use]
    pub fn is_default(self) -> bool {
        self == Self::default()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(Self::Recent),
            "priceAsc" => Ok(Self::PriceAscending),
            "priceDesc" => Ok(Self::PriceDescending),
            "popular" => Ok(Self::Popular),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Inclusive price bounds; each side is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    /// Drops non-finite bounds, which can never round-trip through an address.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            min: self.min.filter(|v| v.is_finite()),
            max: self.max.filter(|v| v.is_finite()),
        }
    }

    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Every active filter, sort and pagination choice.
///
/// Invariants upheld by the store and the parser:
/// - category ids are unique (a set)
/// - an attribute key present in `attributes` has at least one value
/// - `page` and `page_size` are at least 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub sort: SortKey,
    pub price: PriceRange,
    pub category_ids: BTreeSet<String>,
    pub attributes: BTreeMap<String, BTreeSet<String>>,
    /// Free-text search. Sent to the data layer, never written to the address.
    pub search: String,
    pub page: u32,
    pub page_size: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            sort: SortKey::default(),
            price: PriceRange::default(),
            category_ids: BTreeSet::new(),
            attributes: BTreeMap::new(),
            search: String::new(),
            page: FIRST_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterCriteria {
    /// Returns `true` when only `page` and/or `page_size` separate the two.
    #[must_use]
    pub fn same_filters(&self, other: &Self) -> bool {
        self.sort == other.sort
            && self.price == other.price
            && self.category_ids == other.category_ids
            && self.attributes == other.attributes
            && self.search == other.search
    }

    /// Removes attribute keys whose value set became empty.
    pub(crate) fn prune_attributes(&mut self) {
        self.attributes.retain(|_, values| !values.is_empty());
    }

    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.sort.is_default()
            || self.price.min.is_some()
            || self.price.max.is_some()
            || !self.category_ids.is_empty()
            || !self.attributes.is_empty()
            || !self.search.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_wire_names_parse_back() {
        for key in [
            SortKey::Recent,
            SortKey::PriceAscending,
            SortKey::PriceDescending,
            SortKey::Popular,
        ] {
            assert_eq!(key.as_str().parse::<SortKey>(), Ok(key));
        }
        assert!("cheapest".parse::<SortKey>().is_err());
    }

    #[test]
    fn defaults_are_first_page_of_twenty() {
        let criteria = FilterCriteria::default();
        assert_eq!(criteria.page, 1);
        assert_eq!(criteria.page_size, 20);
        assert!(!criteria.has_active_filters());
    }

    #[test]
    fn same_filters_ignores_pagination() {
        let a = FilterCriteria::default();
        let b = FilterCriteria {
            page: 4,
            page_size: 50,
            ..FilterCriteria::default()
        };
        assert!(a.same_filters(&b));

        let c = FilterCriteria {
            sort: SortKey::Popular,
            ..FilterCriteria::default()
        };
        assert!(!a.same_filters(&c));
    }

    #[test]
    fn price_range_sanitizes_non_finite_bounds() {
        let range = PriceRange {
            min: Some(f64::NAN),
            max: Some(f64::INFINITY),
        }
        .sanitized();
        assert_eq!(range, PriceRange::default());
        assert!(PriceRange { min: Some(10.0), max: None }.contains(10.0));
        assert!(!PriceRange { min: None, max: Some(5.0) }.contains(5.5));
    }
}
