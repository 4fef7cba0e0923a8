//! Canonical query-string encoding of filter criteria.
//!
//! The output depends only on the criteria's values, never on the order in
//! which they were built:
//!
//! ```text
//! ?sort=priceAsc&priceMin=100&priceMax=500&categoryIds=a,b&color=blue,red&page=2&pageSize=50
//! ```
//!
//! Parameters appear in that fixed order; attribute parameters are sorted by
//! key and sit between `categoryIds` and `page`. Defaults are omitted, so the
//! default criteria encode to the empty string.

use super::RESERVED_KEYS;
use crate::domain::{FetchParams, FilterCriteria, SortKey, DEFAULT_PAGE_SIZE, FIRST_PAGE};
use std::collections::{BTreeMap, BTreeSet};

/// Encodes criteria without memoization.
#[must_use]
pub fn encode_query(criteria: &FilterCriteria) -> String {
    let mut params: Vec<(String, String)> = Vec::new();

    if !criteria.sort.is_default() {
        params.push(("sort".to_string(), criteria.sort.as_str().to_string()));
    }
    if let Some(min) = criteria.price.min {
        params.push(("priceMin".to_string(), format_number(min)));
    }
    if let Some(max) = criteria.price.max {
        params.push(("priceMax".to_string(), format_number(max)));
    }
    if !criteria.category_ids.is_empty() {
        params.push(("categoryIds".to_string(), join_values(&criteria.category_ids)));
    }
    for (key, values) in &criteria.attributes {
        if values.is_empty() || key.is_empty() || RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        params.push((key.clone(), join_values(values)));
    }
    if criteria.page > FIRST_PAGE {
        params.push(("page".to_string(), criteria.page.to_string()));
    }
    if criteria.page_size != DEFAULT_PAGE_SIZE {
        params.push(("pageSize".to_string(), criteria.page_size.to_string()));
    }

    if params.is_empty() {
        return String::new();
    }

    let body = params
        .iter()
        .map(|(key, value)| format!("{}={value}", urlencoding::encode(key)))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{body}")
}

/// Shortest decimal form: `100.0` prints as `100`, `99.5` as `99.5`.
fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Percent-encodes each value, then comma-joins them in sorted order.
fn join_values(values: &BTreeSet<String>) -> String {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .map(|v| urlencoding::encode(v).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// The criteria fields that affect serialization, in normalized form.
///
/// Criteria are rebuilt on every intent, so identity cannot be used as the
/// memo key; this projection compares by value instead.
#[derive(Debug, Clone, PartialEq)]
struct CanonicalKey {
    sort: SortKey,
    price_min: Option<f64>,
    price_max: Option<f64>,
    category_ids: BTreeSet<String>,
    attributes: BTreeMap<String, BTreeSet<String>>,
    page: u32,
    page_size: u32,
}

impl CanonicalKey {
    fn of(criteria: &FilterCriteria) -> Self {
        Self {
            sort: criteria.sort,
            price_min: criteria.price.min,
            price_max: criteria.price.max,
            category_ids: criteria.category_ids.clone(),
            attributes: criteria
                .attributes
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            page: criteria.page,
            page_size: criteria.page_size,
        }
    }
}

/// Memoizing encoder with exactly one cached (key, result) slot.
///
/// Each instance owns its slot; a call with a different key replaces it
/// unconditionally.
#[derive(Debug, Default)]
pub struct QueryCanonicalizer {
    memo: Option<(CanonicalKey, String)>,
    computations: u64,
}

impl QueryCanonicalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical query string for `criteria`, reusing the cached result when
    /// the serialization-relevant fields are unchanged.
    pub fn encode(&mut self, criteria: &FilterCriteria) -> String {
        let key = CanonicalKey::of(criteria);
        if let Some((cached_key, cached)) = &self.memo {
            if *cached_key == key {
                tracing::trace!("canonical query served from memo");
                return cached.clone();
            }
        }

        let encoded = encode_query(criteria);
        self.computations += 1;
        tracing::trace!(query = %encoded, computations = self.computations, "canonical query computed");
        self.memo = Some((key, encoded.clone()));
        encoded
    }

    /// Request params for the data layer.
    #[must_use]
    pub fn request_params(&self, criteria: &FilterCriteria) -> FetchParams {
        FetchParams::from_criteria(criteria)
    }

    /// Number of encodes that missed the memo.
    #[must_use]
    pub const fn computations(&self) -> u64 {
        self.computations
    }
}
