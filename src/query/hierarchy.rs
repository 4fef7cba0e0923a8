//! Category hierarchy index: descendant closures over a tree snapshot.
//!
//! The index is rebuilt whole whenever the snapshot changes; there is no
//! incremental maintenance. Lookups never fail: an unknown id simply has no
//! descendants.

use crate::domain::{CategoryNode, CategoryTree};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Category id to every id transitively below it, in depth-first order.
pub type DescendantMap = HashMap<String, Vec<String>>;

/// Walks the forest depth-first and records, for every node, all ids below it.
///
/// Iterative post-order: a node is finished only after all of its children,
/// whose lists it then concatenates.
#[must_use]
pub fn build_descendant_map(tree: &CategoryTree) -> DescendantMap {
    let _span = tracing::debug_span!("build_descendant_map", nodes = tree.len()).entered();

    let mut map = DescendantMap::new();
    let mut stack: Vec<(&CategoryNode, bool)> =
        tree.roots().iter().rev().map(|root| (root, false)).collect();

    while let Some((node, children_done)) = stack.pop() {
        if children_done {
            let mut below = Vec::new();
            for child in &node.children {
                below.push(child.id.clone());
                if let Some(grandchildren) = map.get(&child.id) {
                    below.extend(grandchildren.iter().cloned());
                }
            }
            map.insert(node.id.clone(), below);
        } else {
            stack.push((node, true));
            stack.extend(node.children.iter().rev().map(|child| (child, false)));
        }
    }
    map
}

/// Copy of the stored descendant list, or empty for an unknown id.
#[must_use]
pub fn get_descendants(map: &DescendantMap, id: &str) -> Vec<String> {
    map.get(id).cloned().unwrap_or_default()
}

/// A tree snapshot paired with its descendant map.
#[derive(Debug, Clone)]
pub struct CategoryIndex {
    tree: Arc<CategoryTree>,
    descendants: DescendantMap,
}

impl CategoryIndex {
    #[must_use]
    pub fn new(tree: Arc<CategoryTree>) -> Self {
        let descendants = build_descendant_map(&tree);
        tracing::debug!(indexed = descendants.len(), "category index rebuilt");
        Self { tree, descendants }
    }

    #[must_use]
    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    #[must_use]
    pub fn descendants(&self, id: &str) -> Vec<String> {
        get_descendants(&self.descendants, id)
    }

    /// `id` plus all of its descendants.
    #[must_use]
    pub fn closure(&self, id: &str) -> BTreeSet<String> {
        closure_of(Some(self), id)
    }

    /// Resolves a category name into the closure of the matching node.
    #[must_use]
    pub fn closure_by_name(&self, name: &str) -> Option<BTreeSet<String>> {
        self.tree.id_by_name(name).map(|id| self.closure(id))
    }
}

/// Closure of `id`, degrading to `{id}` when no index is available.
#[must_use]
pub fn closure_of(index: Option<&CategoryIndex>, id: &str) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    closure.insert(id.to_string());
    if let Some(index) = index {
        closure.extend(index.descendants(id));
    }
    closure
}
