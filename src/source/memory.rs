//! In-memory catalog implementing the data layer contract.
//!
//! Items are loaded once (typically from a JSON file) and every request is
//! answered by filtering, sorting and slicing them. Responses are cached by
//! the exact request params; [`DataSource::invalidate`] evicts one entry and
//! [`DataSource::prefetch`] fills one. The cache holds at most
//! [`DEFAULT_CACHE_CAPACITY`] responses (see [`MemoryCatalog::with_cache_capacity`]),
//! dropping the oldest first.
//!
//! # Filtering
//!
//! - **Price**: inclusive bounds, either side optional
//! - **Categories**: item's category is one of the selected ids
//! - **Attributes**: AND across keys, OR within one key's values
//! - **Search**: every whitespace-separated token fuzzy-matches the item name
//!
//! # File Format
//!
//! ```json
//! {
//!   "items": [
//!     {
//!       "id": "p1",
//!       "name": "Oak desk",
//!       "price": 249.0,
//!       "categoryId": "desks",
//!       "attributes": { "material": "oak" },
//!       "popularity": 12,
//!       "createdAt": "2024-03-01T09:00:00Z"
//!     }
//!   ]
//! }
//! ```

use super::backend::DataSource;
use crate::domain::error::{FacetError, Result};
use crate::domain::{FetchError, FetchParams, Item, Page, PageMeta, PriceRange, SortKey};
use async_trait::async_trait;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<Item>,
}

/// Responses kept per catalog unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Insertion-ordered response cache with a fixed capacity.
#[derive(Debug)]
struct ResponseCache {
    entries: HashMap<String, Page>,
    order: VecDeque<String>,
    capacity: usize,
}

impl ResponseCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, key: &str) -> Option<&Page> {
        self.entries.get(key)
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn insert(&mut self, key: String, page: Page) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, page);
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::trace!("evicted oldest cached response");
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, page);
    }

    fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.retain(|k| k != key);
        }
        removed
    }
}

/// Catalog held entirely in memory.
#[derive(Debug)]
pub struct MemoryCatalog {
    items: Vec<Item>,
    cache: Mutex<ResponseCache>,
    computations: AtomicU64,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self::with_cache_capacity(items, DEFAULT_CACHE_CAPACITY)
    }

    /// Like [`new`](Self::new), keeping at most `capacity` cached responses
    /// (minimum 1).
    #[must_use]
    pub fn with_cache_capacity(items: Vec<Item>, capacity: usize) -> Self {
        Self {
            items,
            cache: Mutex::new(ResponseCache::new(capacity)),
            computations: AtomicU64::new(0),
        }
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&contents)
            .map_err(|e| FacetError::Catalog(format!("failed to parse catalog {}: {e}", path.display())))?;

        tracing::debug!(path = ?path, items = file.items.len(), "loaded catalog");
        Ok(Self::new(file.items))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of requests answered without the cache.
    #[must_use]
    pub fn computations(&self) -> u64 {
        self.computations.load(AtomicOrdering::SeqCst)
    }

    /// Returns `true` if a response for exactly `params` is cached.
    #[must_use]
    pub fn is_cached(&self, params: &FetchParams) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains(&params.cache_key()))
            .unwrap_or(false)
    }

    /// Filters, sorts and slices the items for `params`.
    #[must_use]
    pub fn query(&self, params: &FetchParams) -> Page {
        let _span = tracing::debug_span!("catalog_query", page = params.page).entered();

        let mut matched: Vec<&Item> = self.items.iter().filter(|item| matches(item, params)).collect();
        sort_items(&mut matched, params.sort.unwrap_or_default());

        let filtered = matched.len();
        let page_size = params.page_size.max(1);
        let page = params.page.max(1);
        let total_pages = u32::try_from(filtered.div_ceil(page_size as usize)).unwrap_or(u32::MAX);
        let start = (page as usize - 1).saturating_mul(page_size as usize);

        let data = matched
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect::<Vec<_>>();

        tracing::debug!(filtered, returned = data.len(), "catalog query complete");

        Page {
            data,
            meta: PageMeta {
                total: self.items.len(),
                filtered,
                page,
                page_size,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        }
    }

    fn cached_or_compute(&self, params: &FetchParams) -> std::result::Result<Page, FetchError> {
        let key = params.cache_key();
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| FetchError::transport("catalog cache lock poisoned"))?;

        if let Some(page) = cache.get(&key) {
            tracing::trace!("catalog cache hit");
            return Ok(page.clone());
        }

        let page = self.query(params);
        self.computations.fetch_add(1, AtomicOrdering::SeqCst);
        cache.insert(key, page.clone());
        Ok(page)
    }
}

#[async_trait]
impl DataSource for MemoryCatalog {
    async fn fetch(&self, params: &FetchParams) -> std::result::Result<Page, FetchError> {
        self.cached_or_compute(params)
    }

    async fn prefetch(&self, params: &FetchParams) -> std::result::Result<(), FetchError> {
        tracing::debug!(page = params.page, "prefetching");
        self.cached_or_compute(params).map(|_| ())
    }

    fn invalidate(&self, params: &FetchParams) {
        if let Ok(mut cache) = self.cache.lock() {
            let evicted = cache.remove(&params.cache_key());
            tracing::debug!(evicted, "invalidated cached response");
        }
    }
}

fn matches(item: &Item, params: &FetchParams) -> bool {
    let price = PriceRange {
        min: params.price_min,
        max: params.price_max,
    };
    if !price.contains(item.price) {
        return false;
    }

    if let Some(category_ids) = &params.category_ids {
        if !category_ids.is_empty() && !category_ids.contains(&item.category_id) {
            return false;
        }
    }

    if let Some(attributes) = &params.attributes {
        let all_keys_match = attributes.iter().all(|(key, wanted)| {
            wanted.is_empty()
                || item
                    .attributes
                    .get(key)
                    .is_some_and(|value| wanted.contains(value))
        });
        if !all_keys_match {
            return false;
        }
    }

    params
        .search
        .as_deref()
        .map_or(true, |search| matches_search(&item.name, search))
}

fn matches_search(name: &str, search: &str) -> bool {
    use fuzzy_matcher::FuzzyMatcher;

    let tokens: Vec<String> = search.split_whitespace().map(str::to_lowercase).collect();
    if tokens.is_empty() {
        return true;
    }

    let matcher = SkimMatcherV2::default();
    let name_lower = name.to_lowercase();
    tokens
        .iter()
        .all(|token| matcher.fuzzy_match(&name_lower, token).is_some())
}

fn sort_items(items: &mut [&Item], sort: SortKey) {
    items.sort_by(|a, b| {
        let primary = match sort {
            SortKey::Recent => b.created_at.cmp(&a.created_at),
            SortKey::PriceAscending => a.price.total_cmp(&b.price),
            SortKey::PriceDescending => b.price.total_cmp(&a.price),
            SortKey::Popular => b.popularity.cmp(&a.popularity),
        };
        match primary {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        }
    });
}
