//! Data layer: where pages of catalog items come from.
//!
//! # Modules
//!
//! - `backend`: The [`DataSource`] trait the fetch runtime calls
//! - `memory`: JSON-loaded, in-memory catalog with a response cache

pub mod backend;
pub mod memory;

pub use backend::DataSource;
pub use memory::{MemoryCatalog, DEFAULT_CACHE_CAPACITY};
