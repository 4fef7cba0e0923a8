//! Data layer abstraction.
//!
//! The fetch runtime talks to the data layer only through [`DataSource`], so
//! an HTTP client, an in-memory catalog, or a test double can sit behind it.

use crate::domain::{FetchError, FetchParams, Page};
use async_trait::async_trait;

/// A paged, filterable source of catalog items.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches one page for `params`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] for generic failures,
    /// [`FetchError::Application`] for failures the source itself reports,
    /// and [`FetchError::Cancelled`] if the request was aborted.
    async fn fetch(&self, params: &FetchParams) -> Result<Page, FetchError>;

    /// Warms any cache for `params`. The default simply fetches and drops
    /// the page.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch); callers ignore them.
    async fn prefetch(&self, params: &FetchParams) -> Result<(), FetchError> {
        self.fetch(params).await.map(|_| ())
    }

    /// Evicts any cached result for exactly `params`.
    fn invalidate(&self, params: &FetchParams);
}
