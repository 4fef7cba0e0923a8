//! Category tree snapshot.
//!
//! The engine does not own the category tree's lifecycle: a provider hands
//! over immutable snapshots, and every snapshot change rebuilds the derived
//! indexes whole. A snapshot also answers name lookups for the `category=`
//! address parameter.

use crate::domain::error::{FacetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One category and its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            children: Vec::new(),
        }
    }

    /// Appends a child, filling in its parent reference.
    #[must_use]
    pub fn with_child(mut self, mut child: Self) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(child);
        self
    }
}

/// Immutable snapshot of the whole category forest.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    roots: Vec<CategoryNode>,
    /// Lowercased name to id. First node wins on duplicate names.
    by_name: HashMap<String, String>,
}

impl CategoryTree {
    #[must_use]
    pub fn new(roots: Vec<CategoryNode>) -> Self {
        let mut by_name = HashMap::new();
        let mut stack: Vec<&CategoryNode> = roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            by_name
                .entry(node.name.to_lowercase())
                .or_insert_with(|| node.id.clone());
            stack.extend(node.children.iter().rev());
        }
        Self { roots, by_name }
    }

    /// Loads a snapshot from a JSON array of root nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a node array.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let roots: Vec<CategoryNode> = serde_json::from_str(&contents)
            .map_err(|e| FacetError::Catalog(format!("failed to parse category tree: {e}")))?;
        tracing::debug!(path = ?path, roots = roots.len(), "category tree loaded");
        Ok(Self::new(roots))
    }

    #[must_use]
    pub fn roots(&self) -> &[CategoryNode] {
        &self.roots
    }

    /// Resolves a human-readable category name to its id (case-insensitive).
    #[must_use]
    pub fn id_by_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
