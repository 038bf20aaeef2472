//! Mermaid ER diagram rendering
//!
//! Entities are emitted sorted by name; relationships use fixed
//! `child }o--|| parent` cardinality (many children, exactly one parent)
//! whatever the actual nullability or uniqueness of the key.

use super::distinct_trimmed_edges;
use crate::snapshot::SchemaSnapshot;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeSet;
use std::fmt::{self, Write};
use tracing::warn;

static NON_IDENT_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());
static LABEL_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n:]").unwrap());

/// Outcome of an ER render. Callers must check for `Failed` before using
/// the diagram text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErDiagram {
    Rendered(String),
    Failed(String),
}

impl ErDiagram {
    pub fn into_result(self) -> Result<String, String> {
        match self {
            ErDiagram::Rendered(text) => Ok(text),
            ErDiagram::Failed(message) => Err(message),
        }
    }
}

impl Serialize for ErDiagram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ErDiagram::Rendered(text) => {
                let mut state = serializer.serialize_struct("ErDiagram", 1)?;
                state.serialize_field("diagram", text)?;
                state.end()
            }
            ErDiagram::Failed(message) => {
                let mut state = serializer.serialize_struct("ErDiagram", 2)?;
                state.serialize_field("error", message)?;
                state.serialize_field("diagram", &Option::<String>::None)?;
                state.end()
            }
        }
    }
}

pub struct MermaidRenderer;

impl MermaidRenderer {
    pub fn render(snapshot: &SchemaSnapshot) -> ErDiagram {
        Self::render_into(snapshot, String::new())
    }

    /// Render through an arbitrary sink; any write failure yields `Failed`
    pub fn render_into<W>(snapshot: &SchemaSnapshot, mut sink: W) -> ErDiagram
    where
        W: Write + Into<String>,
    {
        match Self::build(snapshot, &mut sink) {
            Ok(()) => ErDiagram::Rendered(sink.into()),
            Err(e) => {
                warn!("Mermaid ER build failed: {}", e);
                ErDiagram::Failed(format!("mermaid build failed: {}", e))
            }
        }
    }

    fn build<W: Write>(snapshot: &SchemaSnapshot, out: &mut W) -> fmt::Result {
        let table_names: BTreeSet<&str> = snapshot
            .tables
            .iter()
            .map(|t| t.name.trim())
            .filter(|name| !name.is_empty())
            .collect();

        out.write_str("erDiagram")?;

        for name in &table_names {
            write!(out, "\n  {} {{\n  }}", identifier(name))?;
        }

        for edge in distinct_trimmed_edges(&snapshot.foreign_keys) {
            let label = edge
                .column_label()
                .map(|text| sanitize_label(&text))
                .unwrap_or_else(|| "FK".to_string());

            write!(
                out,
                "\n  {} }}o--|| {} : {}",
                identifier(edge.child),
                identifier(edge.parent),
                label
            )?;
        }

        Ok(())
    }
}

/// Diagram-safe identifier: `schema.table` -> `schema_table`, anything else
/// outside `[A-Za-z0-9_]` -> `_`, leading `_` unless it starts with a letter
pub fn identifier(name: &str) -> String {
    let replaced = NON_IDENT_CHARS.replace_all(&name.replace('.', "_"), "_").into_owned();
    match replaced.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => replaced,
        _ => format!("_{}", replaced),
    }
}

fn sanitize_label(text: &str) -> String {
    LABEL_BREAKS.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ForeignKey, Table};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn diagram(snapshot: &SchemaSnapshot) -> String {
        MermaidRenderer::render(snapshot)
            .into_result()
            .expect("diagram should render")
    }

    #[test]
    fn test_entities_sorted_and_relationship_rendered() {
        let snapshot = SchemaSnapshot::new(
            vec![
                Table::with_columns("users", &["id"]),
                Table::with_columns("orders", &["id", "user_id"]),
            ],
            vec![ForeignKey::new("orders", &["user_id"], "users", &["id"])],
        );

        assert_eq!(
            diagram(&snapshot),
            [
                "erDiagram",
                "  orders {",
                "  }",
                "  users {",
                "  }",
                "  orders }o--|| users : user_id -> id",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_identifier_transliteration() {
        assert_eq!(identifier("public.users"), "public_users");
        assert_eq!(identifier("order-items"), "order_items");
        assert_eq!(identifier("2fa codes"), "_2fa_codes");
        assert_eq!(identifier("_private"), "_private");
        assert_eq!(identifier("ünits"), "_nits");
        assert_eq!(identifier(""), "_");
    }

    #[test]
    fn test_label_defaults_to_fk_and_is_sanitized() {
        let snapshot = SchemaSnapshot::new(
            vec![],
            vec![
                ForeignKey::new("a", &[], "b", &[]),
                ForeignKey::new("c", &["x:y\n"], "d", &["id\r"]),
            ],
        );

        let text = diagram(&snapshot);
        assert!(text.contains("  a }o--|| b : FK"));
        assert!(text.contains("  c }o--|| d : x y  -> id"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let snapshot = SchemaSnapshot::new(
            vec![
                Table::with_columns("users", &["id"]),
                Table::with_columns(" users ", &["id"]),
                Table::with_columns("orders", &["user_id"]),
            ],
            vec![
                ForeignKey::new("orders", &["user_id"], "users", &["id"]),
                ForeignKey::new("orders", &["user_id"], "users", &["id"]),
            ],
        );

        let text = diagram(&snapshot);
        assert_eq!(text.matches("  users {").count(), 1);
        assert_eq!(text.matches("}o--||").count(), 1);
    }

    #[test]
    fn test_render_is_idempotent() {
        let snapshot = SchemaSnapshot::new(
            vec![Table::with_columns("b", &[]), Table::with_columns("a", &[])],
            vec![ForeignKey::new("a", &["b_id"], "b", &["id"])],
        );
        assert_eq!(MermaidRenderer::render(&snapshot), MermaidRenderer::render(&snapshot));
    }

    /// Sink that rejects every write
    struct RejectingSink;

    impl Write for RejectingSink {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    impl From<RejectingSink> for String {
        fn from(_: RejectingSink) -> Self {
            String::new()
        }
    }

    #[test]
    fn test_write_failure_is_reported_as_failed() {
        let snapshot = SchemaSnapshot::new(vec![Table::with_columns("users", &["id"])], vec![]);

        match MermaidRenderer::render_into(&snapshot, RejectingSink) {
            ErDiagram::Failed(message) => assert!(message.starts_with("mermaid build failed: ")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_serialized_shapes() {
        assert_eq!(
            serde_json::to_value(ErDiagram::Rendered("erDiagram".to_string())).unwrap(),
            json!({"diagram": "erDiagram"})
        );
        assert_eq!(
            serde_json::to_value(ErDiagram::Failed("boom".to_string())).unwrap(),
            json!({"error": "boom", "diagram": null})
        );
    }
}
