//! One filtering session: store, address and fetch scheduling wired together.
//!
//! [`FilterSession`] is the unit a front end drives. Every accepted intent
//! flows the same way:
//!
//! ```text
//! Intent → Store → Canonicalizer ─┬─▶ Address Synchronizer
//!                                 └─▶ Fetch Orchestrator → FetchCommands
//! ```
//!
//! The session performs no I/O of its own; the returned
//! [`FetchCommand`]s are executed by a runtime (see [`crate::fetch::Runtime`])
//! which reports back through [`FilterSession::handle_fetch_event`].

use super::address::{Address, AddressSynchronizer};
use super::intents::Intent;
use super::store::FilterStore;
use crate::domain::{CategoryTree, FilterCriteria};
use crate::fetch::{FetchCommand, FetchEvent, FetchOrchestrator, FetchView};
use crate::query::{self, CategoryIndex, QueryCanonicalizer};
use crate::Config;
use std::sync::Arc;

/// Filter state and its two projections (address and fetches).
#[derive(Debug)]
pub struct FilterSession<A: Address> {
    store: FilterStore,
    index: Option<CategoryIndex>,
    canonicalizer: QueryCanonicalizer,
    address: AddressSynchronizer<A>,
    orchestrator: FetchOrchestrator,
    deferred_category: Option<String>,
}

impl<A: Address> FilterSession<A> {
    /// Creates a session, reading the initial criteria from `address`.
    ///
    /// This is the only time the address is read. A `category=<name>`
    /// parameter that cannot be resolved because `tree` is `None` is kept
    /// until [`set_category_tree`](Self::set_category_tree) provides one.
    ///
    /// # Parameters
    ///
    /// * `config` - Debounce and prefetch settings
    /// * `address` - Navigable address to read from and write to
    /// * `tree` - Category snapshot, if already available
    pub fn new(config: &Config, address: A, tree: Option<Arc<CategoryTree>>) -> Self {
        let index = tree.map(CategoryIndex::new);
        let address = AddressSynchronizer::new(address);

        let initial_query = address.initial_query();
        let parsed = query::parse(&initial_query, index.as_ref());
        tracing::debug!(
            query = %initial_query,
            deferred_category = ?parsed.deferred_category,
            "session created from address"
        );

        Self {
            store: FilterStore::new(parsed.criteria),
            index,
            canonicalizer: QueryCanonicalizer::new(),
            address,
            orchestrator: FetchOrchestrator::new(config.debounce(), config.prefetch),
            deferred_category: parsed.deferred_category,
        }
    }

    /// Projects the initial criteria; the first observation always fetches
    /// immediately.
    pub fn start(&mut self) -> Vec<FetchCommand> {
        let _span = tracing::debug_span!("session_start").entered();
        self.project()
    }

    /// Applies `intent` and returns the fetch commands it causes.
    ///
    /// An intent that leaves the criteria unchanged writes nothing and
    /// schedules nothing.
    pub fn dispatch(&mut self, intent: &Intent) -> Vec<FetchCommand> {
        let _span = tracing::debug_span!("session_dispatch", intent = intent.name()).entered();

        if !self.store.dispatch(intent, self.index.as_ref()) {
            return Vec::new();
        }
        self.project()
    }

    /// Forces a fetch of the current criteria, bypassing the quiet window.
    pub fn refetch(&mut self, invalidate: bool) -> Vec<FetchCommand> {
        let _span = tracing::debug_span!("session_refetch", invalidate).entered();
        self.orchestrator.handle(FetchEvent::Refetch { invalidate })
    }

    /// Feeds a timer or completion event back into the orchestrator.
    pub fn handle_fetch_event(&mut self, event: FetchEvent) -> Vec<FetchCommand> {
        self.orchestrator.handle(event)
    }

    /// Installs a new category snapshot.
    ///
    /// A category name deferred at startup is resolved against it and its
    /// closure merged into the selection. The page is kept: this completes
    /// the startup address rather than changing the user's filters.
    pub fn set_category_tree(&mut self, tree: Arc<CategoryTree>) -> Vec<FetchCommand> {
        let _span = tracing::debug_span!("set_category_tree", categories = tree.len()).entered();

        let index = CategoryIndex::new(tree);
        let mut changed = false;

        if let Some(name) = self.deferred_category.take() {
            match index.closure_by_name(&name) {
                Some(closure) => {
                    let mut criteria = self.store.criteria().clone();
                    criteria.category_ids.extend(closure);
                    changed = self.store.replace(criteria);
                    tracing::debug!(category = %name, "resolved deferred category");
                }
                None => tracing::debug!(category = %name, "deferred category not in tree, dropping"),
            }
        }

        self.index = Some(index);
        if changed {
            self.project()
        } else {
            Vec::new()
        }
    }

    #[must_use]
    pub const fn criteria(&self) -> &FilterCriteria {
        self.store.criteria()
    }

    #[must_use]
    pub const fn view(&self) -> &FetchView {
        self.orchestrator.view()
    }

    #[must_use]
    pub const fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub const fn address(&self) -> &A {
        self.address.address()
    }

    #[must_use]
    pub fn deferred_category(&self) -> Option<&str> {
        self.deferred_category.as_deref()
    }

    #[must_use]
    pub const fn canonicalizer(&self) -> &QueryCanonicalizer {
        &self.canonicalizer
    }

    /// Writes the canonical query to the address and hands the request
    /// snapshot to the orchestrator.
    fn project(&mut self) -> Vec<FetchCommand> {
        let criteria = self.store.criteria();
        let canonical = self.canonicalizer.encode(criteria);
        self.address.sync(&canonical);

        let params = self.canonicalizer.request_params(criteria);
        self.orchestrator.handle(FetchEvent::CriteriaChanged(params))
    }
}
