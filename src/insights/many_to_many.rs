//! Many-to-many join table detection
//!
//! Heuristic: a table owning at least two foreign keys whose columns are
//! all foreign key columns is almost certainly a join table. A few
//! bookkeeping columns are tolerated at reduced confidence.

use crate::snapshot::{ForeignKey, SchemaSnapshot, TableLookup};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Non-key columns a join table may still carry
const ALLOWED_EXTRA_COLUMNS: [&str; 5] = ["id", "created_at", "updated_at", "status", "role"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Every column participates in a foreign key
    High,
    /// Only allow-listed bookkeeping columns besides the keys
    Medium,
}

/// A table that looks like a many-to-many join table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManyToManyCandidate {
    pub table: String,
    /// Referred table of each owned foreign key, in foreign key order
    pub references: Vec<String>,
    pub confidence: Confidence,
    /// Non-key columns, sorted
    pub extra_columns: Vec<String>,
}

pub struct ManyToManyDetector;

impl ManyToManyDetector {
    pub fn detect(snapshot: &SchemaSnapshot) -> Vec<ManyToManyCandidate> {
        if snapshot.tables.is_empty() || snapshot.foreign_keys.is_empty() {
            return Vec::new();
        }

        let lookup = TableLookup::new(&snapshot.tables);

        // Group by the table each foreign key resolves to, keyed by that
        // table's declared name.
        let mut owned: HashMap<&str, Vec<&ForeignKey>> = HashMap::new();
        for fk in &snapshot.foreign_keys {
            if let Some(table) = lookup.get(&fk.table) {
                owned.entry(table.name.as_str()).or_default().push(fk);
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut findings = Vec::new();

        for table in &snapshot.tables {
            if table.name.is_empty() || !seen.insert(table.name.as_str()) {
                continue;
            }

            let fks = match owned.get(table.name.as_str()) {
                Some(fks) if fks.len() >= 2 => fks,
                _ => continue,
            };

            let fk_cols: BTreeSet<&str> = fks
                .iter()
                .flat_map(|fk| fk.constrained_columns.iter().map(String::as_str))
                .collect();

            if fk_cols.is_empty() {
                continue;
            }

            let all_cols: BTreeSet<&str> = table
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .filter(|name| !name.is_empty())
                .collect();

            let extra_columns: Vec<String> = all_cols
                .difference(&fk_cols)
                .map(|c| c.to_string())
                .collect();

            let confidence = if fk_cols == all_cols {
                Confidence::High
            } else if extra_columns.iter().all(|c| Self::is_allowed_extra(c)) {
                Confidence::Medium
            } else {
                continue;
            };

            findings.push(ManyToManyCandidate {
                table: table.name.clone(),
                references: fks
                    .iter()
                    .map(|fk| fk.referred_table.clone())
                    .filter(|t| !t.is_empty())
                    .collect(),
                confidence,
                extra_columns,
            });
        }

        findings
    }

    fn is_allowed_extra(column: &str) -> bool {
        let lowered = column.to_lowercase();
        ALLOWED_EXTRA_COLUMNS.contains(&lowered.as_str())
    }
}
