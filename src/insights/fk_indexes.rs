//! Foreign key index coverage
//!
//! Flags foreign keys whose constrained columns cannot be looked up through
//! a leading index prefix. Column order matters for composite indexes: an
//! index on `(a, b)` serves a lookup on `a` but not on `b`.

use crate::snapshot::{SchemaSnapshot, TableLookup};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Why a foreign key landed in the suboptimal bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageReason {
    /// Columns are indexed, but not as the leading columns
    IndexOrderSuboptimal,
}

/// A foreign key lacking proper index coverage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FkIndexFinding {
    pub table: String,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<CoverageReason>,
}

/// Coverage report split by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FkIndexReport {
    /// No coverage set contains the foreign key columns
    pub missing: Vec<FkIndexFinding>,
    /// Covered, but not as a leading prefix
    pub suboptimal: Vec<FkIndexFinding>,
}

/// Classification of a single foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Covered,
    Suboptimal,
    Missing,
}

pub struct FkIndexAnalyzer;

impl FkIndexAnalyzer {
    pub fn analyze(snapshot: &SchemaSnapshot) -> FkIndexReport {
        let mut report = FkIndexReport::default();

        if snapshot.tables.is_empty() || snapshot.foreign_keys.is_empty() {
            return report;
        }

        let lookup = TableLookup::new(&snapshot.tables);

        for fk in &snapshot.foreign_keys {
            if fk.table.is_empty() || fk.constrained_columns.is_empty() {
                continue;
            }

            // unknown owning table => no coverage sets at all
            let coverage_sets = lookup
                .get(&fk.table)
                .map(|table| table.coverage_sets())
                .unwrap_or_default();

            match Self::classify(&coverage_sets, &fk.constrained_columns) {
                Coverage::Covered => {}
                Coverage::Suboptimal => report.suboptimal.push(FkIndexFinding {
                    table: fk.table.clone(),
                    columns: fk.constrained_columns.clone(),
                    reason: Some(CoverageReason::IndexOrderSuboptimal),
                }),
                Coverage::Missing => report.missing.push(FkIndexFinding {
                    table: fk.table.clone(),
                    columns: fk.constrained_columns.clone(),
                    reason: None,
                }),
            }
        }

        debug!(
            "FK index coverage: {} missing, {} suboptimal",
            report.missing.len(),
            report.suboptimal.len()
        );

        report
    }

    /// Classify one foreign key against the owning table's coverage sets
    pub fn classify<S: AsRef<[String]>>(coverage_sets: &[S], fk_columns: &[String]) -> Coverage {
        if coverage_sets
            .iter()
            .any(|cols| Self::is_index_prefix(cols.as_ref(), fk_columns))
        {
            return Coverage::Covered;
        }

        let fk_set: HashSet<String> = fk_columns.iter().map(|c| c.to_lowercase()).collect();
        let superset = coverage_sets.iter().any(|cols| {
            let index_set: HashSet<String> = cols.as_ref().iter().map(|c| c.to_lowercase()).collect();
            fk_set.is_subset(&index_set)
        });

        if superset {
            Coverage::Suboptimal
        } else {
            Coverage::Missing
        }
    }

    /// True when `index_cols` begins with `fk_cols`, case-insensitive
    fn is_index_prefix(index_cols: &[String], fk_cols: &[String]) -> bool {
        index_cols.len() >= fk_cols.len()
            && index_cols
                .iter()
                .zip(fk_cols)
                .all(|(i, f)| i.to_lowercase() == f.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ForeignKey, Index, Table, UniqueConstraint};
    use pretty_assertions::assert_eq;

    fn cols(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn index(name: &str, columns: &[&str]) -> Index {
        Index {
            name: Some(name.to_string()),
            columns: cols(columns),
            unique: false,
        }
    }

    #[test]
    fn test_unindexed_fk_is_missing() {
        let snapshot = SchemaSnapshot::new(
            vec![
                Table::with_columns("users", &["id"]),
                Table::with_columns("orders", &["id", "user_id"]),
            ],
            vec![ForeignKey::new("orders", &["user_id"], "users", &["id"])],
        );

        let report = FkIndexAnalyzer::analyze(&snapshot);

        assert_eq!(
            report.missing,
            vec![FkIndexFinding {
                table: "orders".to_string(),
                columns: cols(&["user_id"]),
                reason: None,
            }]
        );
        assert!(report.suboptimal.is_empty());
    }

    #[test]
    fn test_prefix_index_covers_fk() {
        let mut orders = Table::with_columns("orders", &["id", "user_id", "created_at"]);
        orders.indexes.push(index("idx_user_created", &["User_Id", "created_at"]));

        let snapshot = SchemaSnapshot::new(
            vec![Table::with_columns("users", &["id"]), orders],
            vec![ForeignKey::new("orders", &["user_id"], "users", &["id"])],
        );

        assert_eq!(FkIndexAnalyzer::analyze(&snapshot), FkIndexReport::default());
    }

    #[test]
    fn test_primary_key_and_unique_constraint_count_as_coverage() {
        let mut members = Table::with_columns("members", &["group_id", "user_id"]);
        members.primary_key = cols(&["group_id", "user_id"]);
        members.unique_constraints.push(UniqueConstraint {
            name: Some("uq_user_group".to_string()),
            columns: cols(&["user_id", "group_id"]),
        });

        let snapshot = SchemaSnapshot::new(
            vec![members],
            vec![
                ForeignKey::new("members", &["group_id"], "groups", &["id"]),
                ForeignKey::new("members", &["user_id"], "users", &["id"]),
            ],
        );

        assert_eq!(FkIndexAnalyzer::analyze(&snapshot), FkIndexReport::default());
    }

    #[test]
    fn test_leading_expression_does_not_cover_fk() {
        let mut users = Table::with_columns("accounts", &["id", "email", "user_id"]);
        users.indexes.push(index("idx_email_user", &["lower((email)::text)", "user_id"]));

        let snapshot = SchemaSnapshot::new(
            vec![users],
            vec![ForeignKey::new("accounts", &["user_id"], "users", &["id"])],
        );

        let report = FkIndexAnalyzer::analyze(&snapshot);
        assert!(report.missing.is_empty());
        assert_eq!(
            report.suboptimal,
            vec![FkIndexFinding {
                table: "accounts".to_string(),
                columns: cols(&["user_id"]),
                reason: Some(CoverageReason::IndexOrderSuboptimal),
            }]
        );
    }

    #[test]
    fn test_non_leading_column_is_suboptimal() {
        let mut orders = Table::with_columns("orders", &["id", "user_id", "created_at"]);
        orders.indexes.push(index("idx_created_user", &["created_at", "user_id"]));

        let snapshot = SchemaSnapshot::new(
            vec![orders],
            vec![ForeignKey::new("orders", &["user_id"], "users", &["id"])],
        );

        let report = FkIndexAnalyzer::analyze(&snapshot);

        assert!(report.missing.is_empty());
        assert_eq!(
            report.suboptimal,
            vec![FkIndexFinding {
                table: "orders".to_string(),
                columns: cols(&["user_id"]),
                reason: Some(CoverageReason::IndexOrderSuboptimal),
            }]
        );
    }

    #[test]
    fn test_composite_fk_out_of_order_is_suboptimal() {
        let coverage = vec![cols(&["b", "a", "c"])];
        assert_eq!(
            FkIndexAnalyzer::classify(&coverage, &cols(&["a", "b"])),
            Coverage::Suboptimal
        );
        assert_eq!(
            FkIndexAnalyzer::classify(&coverage, &cols(&["B", "a"])),
            Coverage::Covered
        );
        assert_eq!(
            FkIndexAnalyzer::classify(&coverage, &cols(&["a", "d"])),
            Coverage::Missing
        );
    }

    #[test]
    fn test_unknown_table_and_empty_columns() {
        let snapshot = SchemaSnapshot::new(
            vec![Table::with_columns("users", &["id"])],
            vec![
                ForeignKey::new("ghost", &["user_id"], "users", &["id"]),
                ForeignKey::new("users", &[], "users", &[]),
            ],
        );

        let report = FkIndexAnalyzer::analyze(&snapshot);

        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].table, "ghost");
        assert!(report.suboptimal.is_empty());
    }

    #[test]
    fn test_owning_table_matched_case_insensitively() {
        let mut orders = Table::with_columns("public.Orders", &["id", "user_id"]);
        orders.indexes.push(index("idx_user", &["user_id"]));

        let snapshot = SchemaSnapshot::new(
            vec![orders],
            vec![ForeignKey::new("orders", &["user_id"], "users", &["id"])],
        );

        assert_eq!(FkIndexAnalyzer::analyze(&snapshot), FkIndexReport::default());
    }

    #[test]
    fn test_missing_entry_serializes_without_reason() {
        let finding = FkIndexFinding {
            table: "orders".to_string(),
            columns: cols(&["user_id"]),
            reason: None,
        };
        assert_eq!(
            serde_json::to_value(&finding).unwrap(),
            serde_json::json!({"table": "orders", "columns": ["user_id"]})
        );
    }
}
