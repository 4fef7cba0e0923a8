//! Change classification between consecutive request snapshots.

use crate::domain::FetchParams;

/// How a newly observed snapshot differs from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// No previous snapshot exists.
    Initial,
    /// Only `page` and/or `page_size` differ.
    PaginationOnly,
    /// Anything else differs.
    Substantive,
    /// Nothing differs.
    Unchanged,
}

impl ChangeKind {
    /// Classifies `next` against the last observed snapshot.
    #[must_use]
    pub fn classify(previous: Option<&FetchParams>, next: &FetchParams) -> Self {
        match previous {
            None => Self::Initial,
            Some(previous) if previous == next => Self::Unchanged,
            Some(previous) if previous.same_filters(next) => Self::PaginationOnly,
            Some(_) => Self::Substantive,
        }
    }

    /// Returns `true` if the change must wait for the quiet window.
    #[must_use]
    pub const fn is_debounced(self) -> bool {
        matches!(self, Self::Substantive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterCriteria, SortKey};

    fn params(criteria: &FilterCriteria) -> FetchParams {
        FetchParams::from_criteria(criteria)
    }

    #[test]
    fn first_observation_is_initial() {
        let next = params(&FilterCriteria::default());
        assert_eq!(ChangeKind::classify(None, &next), ChangeKind::Initial);
        assert!(!ChangeKind::Initial.is_debounced());
    }

    #[test]
    fn page_and_size_changes_are_pagination_only() {
        let base = FilterCriteria::default();
        let paged = FilterCriteria {
            page: 2,
            page_size: 50,
            ..base.clone()
        };
        assert_eq!(
            ChangeKind::classify(Some(&params(&base)), &params(&paged)),
            ChangeKind::PaginationOnly
        );
    }

    #[test]
    fn sort_or_search_changes_are_substantive() {
        let base = FilterCriteria::default();
        let sorted = FilterCriteria {
            sort: SortKey::Popular,
            ..base.clone()
        };
        let searched = FilterCriteria {
            search: "lamp".to_string(),
            ..base.clone()
        };
        assert_eq!(
            ChangeKind::classify(Some(&params(&base)), &params(&sorted)),
            ChangeKind::Substantive
        );
        assert_eq!(
            ChangeKind::classify(Some(&params(&base)), &params(&searched)),
            ChangeKind::Substantive
        );
    }

    #[test]
    fn identical_snapshot_is_unchanged() {
        let base = params(&FilterCriteria::default());
        assert_eq!(ChangeKind::classify(Some(&base), &base.clone()), ChangeKind::Unchanged);
    }
}
