//! Filter state store.
//!
//! The store holds the current [`FilterCriteria`] and applies [`Intent`]s to
//! it. Application is pure: [`apply_intent`] takes the current criteria by
//! reference and returns a new value, leaving the old one untouched.
//!
//! # Category toggling
//!
//! With a category index available, toggling is closure-aware:
//! - selecting `C` adds `C` and every descendant of `C`
//! - deselecting `C` removes `C` and every descendant of `C`
//! - ancestors of `C` are never touched
//!
//! Toggling the empty id clears every category selection.
//!
//! # Page reset
//!
//! Changing *what* is filtered always returns to the first page; only
//! [`Intent::SetPage`] and [`Intent::SetPageSize`] leave the page alone.

use super::intents::Intent;
use crate::domain::{FilterCriteria, PriceRange, FIRST_PAGE};
use crate::query::{closure_of, is_attribute_key, CategoryIndex};
use std::collections::BTreeSet;

/// Computes the criteria that result from applying `intent` to `current`.
#[must_use]
pub fn apply_intent(
    current: &FilterCriteria,
    intent: &Intent,
    index: Option<&CategoryIndex>,
) -> FilterCriteria {
    if matches!(intent, Intent::Reset) {
        return FilterCriteria::default();
    }

    let mut next = current.clone();
    match intent {
        Intent::SetSort(sort) => next.sort = *sort,
        Intent::SetPriceMin(min) => {
            next.price = PriceRange {
                min: *min,
                ..next.price
            }
            .sanitized();
        }
        Intent::SetPriceMax(max) => {
            next.price = PriceRange {
                max: *max,
                ..next.price
            }
            .sanitized();
        }
        Intent::SetCategoryIds(ids) => {
            next.category_ids = ids.iter().filter(|id| !id.is_empty()).cloned().collect();
        }
        Intent::ToggleCategory(id) => toggle_category(&mut next.category_ids, id, index),
        Intent::SelectCategory(id) => {
            next.category_ids = if id.is_empty() {
                BTreeSet::new()
            } else {
                closure_of(index, id)
            };
        }
        Intent::ClearCategories => next.category_ids.clear(),
        Intent::ToggleAttribute { key, value } => {
            if !is_attribute_key(key) || value.is_empty() {
                tracing::debug!(key = %key, "ignoring toggle on unusable attribute key or empty value");
                return current.clone();
            }
            let values = next.attributes.entry(key.clone()).or_default();
            if !values.remove(value) {
                values.insert(value.clone());
            }
        }
        Intent::ClearAttribute(key) => {
            next.attributes.remove(key);
        }
        Intent::ClearAttributes => next.attributes.clear(),
        Intent::SetPage(page) => next.page = (*page).max(FIRST_PAGE),
        Intent::SetPageSize(size) => next.page_size = (*size).max(1),
        Intent::SetSearch(text) => next.search.clone_from(text),
        Intent::Reset => unreachable!("handled above"),
    }

    next.prune_attributes();
    if !intent.is_pagination() {
        next.page = FIRST_PAGE;
    }
    next
}

fn toggle_category(selection: &mut BTreeSet<String>, id: &str, index: Option<&CategoryIndex>) {
    if id.is_empty() {
        selection.clear();
        return;
    }

    let closure = closure_of(index, id);
    if selection.contains(id) {
        selection.retain(|selected| !closure.contains(selected));
    } else {
        selection.extend(closure);
    }
}

/// Holder of the current criteria.
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    criteria: FilterCriteria,
}

impl FilterStore {
    #[must_use]
    pub const fn new(initial: FilterCriteria) -> Self {
        Self { criteria: initial }
    }

    #[must_use]
    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Applies `intent`; returns `true` if the criteria changed.
    pub fn dispatch(&mut self, intent: &Intent, index: Option<&CategoryIndex>) -> bool {
        let _span = tracing::debug_span!("store_dispatch", intent = intent.name()).entered();

        let next = apply_intent(&self.criteria, intent, index);
        if next == self.criteria {
            tracing::debug!("criteria unchanged");
            return false;
        }
        self.criteria = next;
        tracing::debug!(page = self.criteria.page, "criteria updated");
        true
    }

    /// Replaces the criteria wholesale, bypassing intent rules.
    pub fn replace(&mut self, criteria: FilterCriteria) -> bool {
        if criteria == self.criteria {
            return false;
        }
        self.criteria = criteria;
        true
    }
}
