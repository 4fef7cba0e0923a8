//! Query layer: criteria ⇄ query string, and category closures.
//!
//! # Grammar
//!
//! All parameters are optional and order-insensitive on input; the encoder
//! always emits them in canonical order.
//!
//! | Key           | Value                                  | Emitted when          |
//! |---------------|----------------------------------------|-----------------------|
//! | `sort`        | `recent`, `priceAsc`, `priceDesc`, `popular` | not `recent`    |
//! | `priceMin`    | number                                 | bound present         |
//! | `priceMax`    | number                                 | bound present         |
//! | `categoryIds` | comma-joined ids, sorted               | selection non-empty   |
//! | `category`    | category name (input only)             | never                 |
//! | `page`        | integer                                | greater than 1        |
//! | `pageSize`    | integer                                | not 20                |
//! | anything else | comma-joined attribute values, sorted  | key has values        |
//!
//! Round trip: for criteria with no search text,
//! `decode(encode(x)) == x`, and `encode(decode(encode(x))) == encode(x)`
//! for any criteria.
//!
//! # Modules
//!
//! - [`hierarchy`]: Descendant closures over a category snapshot
//! - [`encode`]: Canonical, memoized encoding
//! - [`decode`]: Tolerant decoding

pub mod decode;
pub mod encode;
pub mod hierarchy;

pub use decode::{decode, parse, ParsedQuery};
pub use encode::{encode_query, QueryCanonicalizer};
pub use hierarchy::{build_descendant_map, closure_of, get_descendants, CategoryIndex, DescendantMap};

/// Keys with fixed meaning; every other key is an attribute filter.
pub const RESERVED_KEYS: [&str; 7] = [
    "sort",
    "priceMin",
    "priceMax",
    "categoryIds",
    "category",
    "page",
    "pageSize",
];

/// Returns `true` if `key` can be used as an attribute filter key.
#[must_use]
pub fn is_attribute_key(key: &str) -> bool {
    !key.trim().is_empty() && key.trim() == key && !RESERVED_KEYS.contains(&key)
}
