//! Data-layer request and response shapes.
//!
//! [`FetchParams`] is what the orchestrator sends; [`Page`] is what comes
//! back. Field names follow the data layer's camelCase JSON contract.

use crate::domain::criteria::{FilterCriteria, SortKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request parameters for one page of results.
///
/// Optional fields are omitted when they carry no filter, so two requests
/// for the same results serialize to the same [`cache_key`](Self::cache_key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl FetchParams {
    /// Projects criteria onto the request shape. Collections come out sorted
    /// because the criteria store them ordered.
    #[must_use]
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let search = criteria.search.trim();
        Self {
            page: criteria.page,
            page_size: criteria.page_size,
            sort: (!criteria.sort.is_default()).then_some(criteria.sort),
            price_min: criteria.price.min,
            price_max: criteria.price.max,
            category_ids: (!criteria.category_ids.is_empty())
                .then(|| criteria.category_ids.iter().cloned().collect()),
            attributes: (!criteria.attributes.is_empty()).then(|| {
                criteria
                    .attributes
                    .iter()
                    .map(|(key, values)| (key.clone(), values.iter().cloned().collect()))
                    .collect()
            }),
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }

    /// Same filters, different page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Returns `true` when only `page` and/or `page_size` separate the two.
    #[must_use]
    pub fn same_filters(&self, other: &Self) -> bool {
        self.sort == other.sort
            && self.price_min == other.price_min
            && self.price_max == other.price_max
            && self.category_ids == other.category_ids
            && self.attributes == other.attributes
            && self.search == other.search
    }

    /// Deterministic key identifying the exact result set these params select.
    #[must_use]
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

/// One catalog entry as returned by the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category_id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub popularity: u32,
    pub created_at: DateTime<Utc>,
}

/// Pagination metadata accompanying a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Size of the whole catalog.
    pub total: usize,
    /// Number of items matching the filters.
    pub filtered: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub data: Vec<Item>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn default_criteria_produce_minimal_params() {
        let params = FetchParams::from_criteria(&FilterCriteria::default());
        assert_eq!(params.cache_key(), r#"{"page":1,"pageSize":20}"#);
    }

    #[test]
    fn params_carry_sorted_filters() {
        let mut criteria = FilterCriteria {
            sort: SortKey::PriceDescending,
            search: "  lamp ".to_string(),
            ..FilterCriteria::default()
        };
        criteria.category_ids = ["b", "a"].into_iter().map(String::from).collect();
        criteria.attributes.insert(
            "color".to_string(),
            ["red", "blue"].into_iter().map(String::from).collect::<BTreeSet<_>>(),
        );

        let params = FetchParams::from_criteria(&criteria);
        assert_eq!(params.sort, Some(SortKey::PriceDescending));
        assert_eq!(params.category_ids, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(
            params.attributes.as_ref().and_then(|a| a.get("color")).cloned(),
            Some(vec!["blue".to_string(), "red".to_string()])
        );
        assert_eq!(params.search.as_deref(), Some("lamp"));
    }

    #[test]
    fn with_page_keeps_filters() {
        let params = FetchParams::from_criteria(&FilterCriteria {
            sort: SortKey::Popular,
            ..FilterCriteria::default()
        });
        let next = params.with_page(2);
        assert!(params.same_filters(&next));
        assert_ne!(params.cache_key(), next.cache_key());
    }
}
