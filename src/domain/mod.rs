//! Domain layer: the value types every other layer speaks.
//!
//! Nothing here performs I/O beyond loading a category snapshot from a file,
//! and nothing depends on the fetch runtime.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`criteria`]: Filter criteria, sort keys and price ranges
//! - [`category`]: Category tree snapshots
//! - [`listing`]: Data-layer request params, items and pages

pub mod category;
pub mod criteria;
pub mod error;
pub mod listing;

pub use category::{CategoryNode, CategoryTree};
pub use criteria::{FilterCriteria, PriceRange, SortKey, DEFAULT_PAGE_SIZE, FIRST_PAGE};
pub use error::{FacetError, FetchError, Result};
pub use listing::{FetchParams, Item, Page, PageMeta};
