//! Projection of criteria onto a navigable address.
//!
//! The address is read once at startup and afterwards only written, always
//! through a non-navigating replacement so no history entry is added per
//! change.

/// A navigable address whose query part can be read and replaced in place.
pub trait Address {
    /// The current query string, if any (with or without a leading `?`).
    fn current_query(&self) -> Option<String>;

    /// Replaces the query part without adding a history entry.
    fn replace_query(&mut self, query: &str);
}

/// In-process address used by the command-line front end and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAddress {
    path: String,
    query: String,
    replacements: usize,
}

impl MemoryAddress {
    /// Creates an address from `path` and an initial query.
    #[must_use]
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
            replacements: 0,
        }
    }

    /// Splits a full address such as `/catalog?sort=popular` into path and query.
    #[must_use]
    pub fn parse(address: &str) -> Self {
        match address.find('?') {
            Some(at) => Self::new(&address[..at], &address[at..]),
            None => Self::new(address, ""),
        }
    }

    /// Number of replacements made so far.
    #[must_use]
    pub const fn replacements(&self) -> usize {
        self.replacements
    }

    /// Path followed by the query.
    #[must_use]
    pub fn href(&self) -> String {
        format!("{}{}", self.path, self.query)
    }
}

impl Address for MemoryAddress {
    fn current_query(&self) -> Option<String> {
        (!self.query.is_empty()).then(|| self.query.clone())
    }

    fn replace_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.replacements += 1;
    }
}

/// Writes canonical query strings to an [`Address`], skipping repeats.
#[derive(Debug)]
pub struct AddressSynchronizer<A: Address> {
    address: A,
    last_written: Option<String>,
}

impl<A: Address> AddressSynchronizer<A> {
    #[must_use]
    pub const fn new(address: A) -> Self {
        Self {
            address,
            last_written: None,
        }
    }

    /// Reads the startup query. Called once, before the first [`sync`](Self::sync).
    #[must_use]
    pub fn initial_query(&self) -> String {
        self.address.current_query().unwrap_or_default()
    }

    /// Writes `canonical` unless it equals the last string written.
    ///
    /// Returns `true` if the address was replaced.
    pub fn sync(&mut self, canonical: &str) -> bool {
        if self.last_written.as_deref() == Some(canonical) {
            tracing::trace!("address unchanged");
            return false;
        }

        tracing::debug!(query = %canonical, "replacing address query");
        self.address.replace_query(canonical);
        self.last_written = Some(canonical.to_string());
        true
    }

    #[must_use]
    pub fn last_written(&self) -> Option<&str> {
        self.last_written.as_deref()
    }

    #[must_use]
    pub const fn address(&self) -> &A {
        &self.address
    }
}
