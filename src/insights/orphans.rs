//! Orphan table detection
//!
//! A table is an orphan when no foreign key touches it, in either direction.

use crate::snapshot::SchemaSnapshot;
use std::collections::HashSet;

pub struct OrphanDetector;

impl OrphanDetector {
    /// Names of tables that appear neither as the child nor as the parent of
    /// any foreign key, in snapshot order.
    ///
    /// Both sides come from the same snapshot, so names are compared exactly.
    pub fn detect(snapshot: &SchemaSnapshot) -> Vec<String> {
        if snapshot.tables.is_empty() {
            return Vec::new();
        }

        let linked: HashSet<&str> = snapshot
            .foreign_keys
            .iter()
            .flat_map(|fk| [fk.table.as_str(), fk.referred_table.as_str()])
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        snapshot
            .tables
            .iter()
            .map(|t| t.name.as_str())
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .filter(|name| !linked.contains(name))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ForeignKey, Table};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_snapshot_has_no_orphans() {
        assert!(OrphanDetector::detect(&SchemaSnapshot::default()).is_empty());
    }

    #[test]
    fn test_linked_tables_are_not_orphans() {
        let snapshot = SchemaSnapshot::new(
            vec![
                Table::with_columns("users", &["id"]),
                Table::with_columns("orders", &["id", "user_id"]),
            ],
            vec![ForeignKey::new("orders", &["user_id"], "users", &["id"])],
        );

        assert!(OrphanDetector::detect(&snapshot).is_empty());
    }

    #[test]
    fn test_isolated_table_is_reported_alone() {
        let snapshot = SchemaSnapshot::new(
            vec![
                Table::with_columns("parent", &["id"]),
                Table::with_columns("child", &["parent_id", "value"]),
                Table::with_columns("lonely", &["id"]),
            ],
            vec![ForeignKey::new("child", &["parent_id"], "parent", &["id"])],
        );

        assert_eq!(OrphanDetector::detect(&snapshot), vec!["lonely".to_string()]);
    }

    #[test]
    fn test_self_reference_is_not_orphan() {
        let snapshot = SchemaSnapshot::new(
            vec![
                Table::with_columns("employees", &["id", "manager_id"]),
                Table::with_columns("audit_log", &["id"]),
            ],
            vec![ForeignKey::new("employees", &["manager_id"], "employees", &["id"])],
        );

        assert_eq!(OrphanDetector::detect(&snapshot), vec!["audit_log".to_string()]);
    }

    #[test]
    fn test_duplicate_table_reported_once() {
        let snapshot = SchemaSnapshot::new(
            vec![
                Table::with_columns("lonely", &["id"]),
                Table::with_columns("lonely", &["id"]),
            ],
            vec![],
        );

        assert_eq!(OrphanDetector::detect(&snapshot), vec!["lonely".to_string()]);
    }
}
