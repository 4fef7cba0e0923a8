//! Tolerant query-string decoding.
//!
//! Decoding never fails. Every malformed field falls back to its default,
//! and any key outside [`RESERVED_KEYS`](super::RESERVED_KEYS) is read as a
//! dynamic attribute filter.
//!
//! The `category=<name>` parameter is input-only: it resolves through a
//! cached category index into an id plus its closure. Without an index the
//! name is dropped from the criteria and handed back in
//! [`ParsedQuery::deferred_category`] so a later pass can resolve it.

use super::hierarchy::CategoryIndex;
use crate::domain::{FilterCriteria, SortKey, DEFAULT_PAGE_SIZE, FIRST_PAGE};
use std::collections::BTreeSet;

/// Result of decoding a query string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedQuery {
    pub criteria: FilterCriteria,
    /// `category` name that could not be resolved yet.
    pub deferred_category: Option<String>,
}

/// Decodes a query string into criteria.
#[must_use]
pub fn decode(query: &str, index: Option<&CategoryIndex>) -> FilterCriteria {
    parse(query, index).criteria
}

/// Decodes a query string, also reporting an unresolved `category` name.
///
/// Accepts a bare query (`sort=popular`), one with a leading `?`, or a whole
/// address (`/products?sort=popular#top`).
#[must_use]
pub fn parse(query: &str, index: Option<&CategoryIndex>) -> ParsedQuery {
    let _span = tracing::debug_span!("decode_query", query_len = query.len()).entered();

    let mut criteria = FilterCriteria::default();
    let mut category_name: Option<String> = None;

    for (key, raw_value) in split_pairs(query_part(query)) {
        match key.as_str() {
            "sort" => {
                criteria.sort = decode_component(raw_value).parse().unwrap_or_else(|_| {
                    tracing::debug!(value = %raw_value, "unknown sort key, using default");
                    SortKey::default()
                });
            }
            "priceMin" => criteria.price.min = parse_price(raw_value),
            "priceMax" => criteria.price.max = parse_price(raw_value),
            "categoryIds" => criteria.category_ids.extend(split_values(raw_value)),
            "category" => {
                let name = decode_component(raw_value);
                category_name = (!name.trim().is_empty()).then_some(name);
            }
            "page" => criteria.page = parse_positive(raw_value, FIRST_PAGE),
            "pageSize" => criteria.page_size = parse_positive(raw_value, DEFAULT_PAGE_SIZE),
            "" => {}
            _ => {
                let values = split_values(raw_value);
                if !values.is_empty() {
                    criteria.attributes.entry(key).or_default().extend(values);
                }
            }
        }
    }

    let deferred_category = category_name.and_then(|name| match index {
        Some(index) => {
            match index.closure_by_name(&name) {
                Some(closure) => criteria.category_ids.extend(closure),
                None => tracing::debug!(category = %name, "category name not found in tree"),
            }
            None
        }
        None => {
            tracing::debug!(category = %name, "no category tree cached, deferring resolution");
            Some(name)
        }
    });

    ParsedQuery {
        criteria,
        deferred_category,
    }
}

/// Strips everything up to the first `?` and any trailing fragment.
fn query_part(input: &str) -> &str {
    let without_fragment = input.split_once('#').map_or(input, |(before, _)| before);
    without_fragment
        .split_once('?')
        .map_or(without_fragment, |(_, after)| after)
}

/// Yields `(decoded key, raw value)` pairs; a pair without `=` has an empty value.
fn split_pairs(query: &str) -> impl Iterator<Item = (String, &str)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key).trim().to_string(), value)
        })
}

/// Percent-decodes one component, reading `+` as a space. Invalid escapes
/// keep the raw text.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), |decoded| decoded.into_owned())
}

/// Splits a comma-joined list; each element is decoded after splitting so
/// escaped commas stay inside their value.
fn split_values(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(decode_component)
        .filter(|value| !value.is_empty())
        .collect()
}

fn parse_price(raw: &str) -> Option<f64> {
    decode_component(raw)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Positive integer or `default`; `0` clamps up to 1.
fn parse_positive(raw: &str, default: u32) -> u32 {
    decode_component(raw)
        .trim()
        .parse::<u32>()
        .map_or(default, |value| value.max(1))
}
