//! Graph Renderers
//!
//! Projects a schema snapshot into textual graph languages:
//! - DOT (Graphviz) digraph of tables and foreign keys
//! - Mermaid ER diagram
//!
//! Both deduplicate foreign keys by structure rather than by descriptor.

pub mod dot;
pub mod mermaid;

pub use dot::DotRenderer;
pub use mermaid::{ErDiagram, MermaidRenderer};

use crate::snapshot::ForeignKey;
use std::collections::HashSet;

/// Structural identity of a relationship edge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey<'a> {
    pub child: &'a str,
    pub parent: &'a str,
    pub constrained: &'a [String],
    pub referred: &'a [String],
}

impl<'a> EdgeKey<'a> {
    /// Key for a foreign key with names as given, or `None` when either
    /// table name is empty
    pub fn of(fk: &'a ForeignKey) -> Option<Self> {
        Self::build(fk, &fk.table, &fk.referred_table)
    }

    /// Same as `of`, but with surrounding whitespace stripped from both
    /// table names
    pub fn trimmed(fk: &'a ForeignKey) -> Option<Self> {
        Self::build(fk, fk.table.trim(), fk.referred_table.trim())
    }

    fn build(fk: &'a ForeignKey, child: &'a str, parent: &'a str) -> Option<Self> {
        if child.is_empty() || parent.is_empty() {
            return None;
        }
        Some(Self {
            child,
            parent,
            constrained: &fk.constrained_columns,
            referred: &fk.referred_columns,
        })
    }

    /// `col1, col2 -> colA, colB` when both sides list columns
    pub fn column_label(&self) -> Option<String> {
        if self.constrained.is_empty() || self.referred.is_empty() {
            return None;
        }
        Some(format!(
            "{} -> {}",
            self.constrained.join(", "),
            self.referred.join(", ")
        ))
    }
}

/// Structurally distinct edges in first-seen order
pub fn distinct_edges(foreign_keys: &[ForeignKey]) -> Vec<EdgeKey<'_>> {
    dedupe(foreign_keys.iter().filter_map(EdgeKey::of))
}

/// Like `distinct_edges`, keyed on trimmed table names
pub fn distinct_trimmed_edges(foreign_keys: &[ForeignKey]) -> Vec<EdgeKey<'_>> {
    dedupe(foreign_keys.iter().filter_map(EdgeKey::trimmed))
}

fn dedupe<'a>(keys: impl Iterator<Item = EdgeKey<'a>>) -> Vec<EdgeKey<'a>> {
    let mut seen = HashSet::new();
    keys.filter(|key| seen.insert(key.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_edges_dedupes_by_structure() {
        let fks = vec![
            ForeignKey::new("orders", &["user_id"], "users", &["id"]),
            ForeignKey::new("orders", &["user_id"], "users", &["id"]),
            ForeignKey::new("orders", &["approver_id"], "users", &["id"]),
            ForeignKey::new("", &["x"], "users", &["id"]),
        ];

        let edges = distinct_edges(&fks);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].column_label().as_deref(), Some("user_id -> id"));
        assert_eq!(edges[1].column_label().as_deref(), Some("approver_id -> id"));
    }

    #[test]
    fn test_trimmed_edges_merge_padded_names() {
        let fks = vec![
            ForeignKey::new("orders", &["user_id"], "users", &["id"]),
            ForeignKey::new(" orders", &["user_id"], "users ", &["id"]),
        ];

        assert_eq!(distinct_edges(&fks).len(), 2);

        let trimmed = distinct_trimmed_edges(&fks);
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed[0].child, "orders");
        assert!(EdgeKey::trimmed(&ForeignKey::new("  ", &[], "users", &[])).is_none());
    }

    #[test]
    fn test_column_label_requires_both_sides() {
        let fk = ForeignKey::new("orders", &["user_id"], "users", &[]);
        assert_eq!(EdgeKey::of(&fk).and_then(|k| k.column_label()), None);
    }
}
