//! Insight Engine
//!
//! Pure structural heuristics over a schema snapshot:
//! - Orphan tables (no foreign key in or out)
//! - Foreign keys without a leading index
//! - Many-to-many join tables

pub mod fk_indexes;
pub mod many_to_many;
pub mod orphans;

pub use fk_indexes::{FkIndexAnalyzer, FkIndexReport};
pub use many_to_many::{ManyToManyCandidate, ManyToManyDetector};
pub use orphans::OrphanDetector;

use crate::snapshot::SchemaSnapshot;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Combined insights report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInsights {
    pub orphan_tables: Vec<String>,
    pub many_to_many: Vec<ManyToManyCandidate>,
    pub missing_fk_indexes: FkIndexReport,
}

pub struct InsightEngine;

impl InsightEngine {
    /// Run every analysis over the same snapshot
    pub fn build(snapshot: &SchemaSnapshot) -> SchemaInsights {
        let insights = SchemaInsights {
            orphan_tables: OrphanDetector::detect(snapshot),
            many_to_many: ManyToManyDetector::detect(snapshot),
            missing_fk_indexes: FkIndexAnalyzer::analyze(snapshot),
        };

        debug!(
            "Insights: {} orphan(s), {} join table(s), {} unindexed FK(s)",
            insights.orphan_tables.len(),
            insights.many_to_many.len(),
            insights.missing_fk_indexes.missing.len()
        );

        insights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ForeignKey, Table};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_orphan_and_missing_index() {
        let mut parent = Table::with_columns("parent", &["id"]);
        parent.primary_key = vec!["id".to_string()];
        let mut lonely = Table::with_columns("lonely", &["id"]);
        lonely.primary_key = vec!["id".to_string()];

        let snapshot = SchemaSnapshot::new(
            vec![
                parent,
                Table::with_columns("child", &["parent_id", "value"]),
                lonely,
            ],
            vec![ForeignKey::new("child", &["parent_id"], "parent", &["id"])],
        );

        let insights = InsightEngine::build(&snapshot);

        assert_eq!(
            serde_json::to_value(&insights).unwrap(),
            json!({
                "orphan_tables": ["lonely"],
                "many_to_many": [],
                "missing_fk_indexes": {
                    "missing": [{"table": "child", "columns": ["parent_id"]}],
                    "suboptimal": []
                }
            })
        );
    }

    #[test]
    fn test_users_orders_scenario() {
        let snapshot = SchemaSnapshot::new(
            vec![
                Table::with_columns("users", &["id"]),
                Table::with_columns("orders", &["id", "user_id"]),
            ],
            vec![ForeignKey::new("orders", &["user_id"], "users", &["id"])],
        );

        let insights = InsightEngine::build(&snapshot);

        assert!(insights.orphan_tables.is_empty());
        assert_eq!(insights.missing_fk_indexes.missing.len(), 1);
        assert_eq!(insights.missing_fk_indexes.missing[0].table, "orders");
        assert_eq!(insights.missing_fk_indexes.missing[0].columns, vec!["user_id".to_string()]);
    }

    #[test]
    fn test_join_table_report_shape() {
        let mut join = Table::with_columns("join_table", &["left_id", "right_id"]);
        join.primary_key = vec!["left_id".to_string(), "right_id".to_string()];

        let snapshot = SchemaSnapshot::new(
            vec![join],
            vec![
                ForeignKey::new("join_table", &["left_id"], "left", &["id"]),
                ForeignKey::new("join_table", &["right_id"], "right", &["id"]),
            ],
        );

        let value = serde_json::to_value(InsightEngine::build(&snapshot)).unwrap();

        assert_eq!(
            value["many_to_many"],
            json!([{
                "table": "join_table",
                "references": ["left", "right"],
                "confidence": "high",
                "extra_columns": []
            }])
        );
        // right_id is only the second PK column
        assert_eq!(
            value["missing_fk_indexes"]["suboptimal"],
            json!([{"table": "join_table", "columns": ["right_id"], "reason": "index_order_suboptimal"}])
        );
    }
}
