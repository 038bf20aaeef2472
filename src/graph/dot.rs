//! DOT (Graphviz) rendering
//!
//! One node per table, one `child -> parent` edge per structurally distinct
//! foreign key, labelled with the column mapping when known.

use super::distinct_edges;
use crate::snapshot::SchemaSnapshot;
use std::collections::HashSet;

pub struct DotRenderer;

impl DotRenderer {
    pub fn render(snapshot: &SchemaSnapshot) -> String {
        let mut lines: Vec<String> = vec![
            "digraph db_schema {".to_string(),
            "  rankdir=LR;".to_string(),
            "  node [shape=box, style=rounded];".to_string(),
        ];

        // Nodes, first occurrence wins; names are used verbatim
        let mut seen_nodes: HashSet<&str> = HashSet::new();
        for table in &snapshot.tables {
            let name = table.name.as_str();
            if name.is_empty() || !seen_nodes.insert(name) {
                continue;
            }
            lines.push(format!("  \"{}\";", escape(name)));
        }

        // Edges
        for edge in distinct_edges(&snapshot.foreign_keys) {
            let label = edge
                .column_label()
                .map(|text| format!(" [label=\"{}\"]", escape(&text)))
                .unwrap_or_default();

            lines.push(format!(
                "  \"{}\" -> \"{}\"{};",
                escape(edge.child),
                escape(edge.parent),
                label
            ));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }
}

/// Escape for a double-quoted DOT ID
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
