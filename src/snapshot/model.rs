//! Schema Snapshot Model
//!
//! The normalized, engine-agnostic description of a database that every
//! analysis and renderer consumes. Built once per request and never mutated
//! by the analyses.

use super::names::table_names_match;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Complete schema snapshot: tables plus the foreign keys between them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

/// Table descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Bare or schema-qualified (`schema.table`) name
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub unique_constraints: Vec<UniqueConstraint>,
    #[serde(default)]
    pub row_count: Option<i64>,
}

/// Column representation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
}

fn default_nullable() -> bool {
    true
}

/// Index representation; column order is significant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// Unique constraint representation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Foreign key relationship (child `table` -> parent `referred_table`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub constrained_columns: Vec<String>,
    #[serde(default)]
    pub referred_table: String,
    #[serde(default)]
    pub referred_columns: Vec<String>,
}

impl Table {
    /// Shorthand for building a table from column names only
    #[cfg(test)]
    pub fn with_columns(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|c| Column {
                    name: c.to_string(),
                    nullable: true,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Column lists that can serve lookups on this table: the primary key,
    /// then every index, then every unique constraint. Empty lists are skipped.
    pub fn coverage_sets(&self) -> Vec<&[String]> {
        let mut sets: Vec<&[String]> = Vec::new();

        if !self.primary_key.is_empty() {
            sets.push(&self.primary_key);
        }

        sets.extend(
            self.indexes
                .iter()
                .map(|idx| idx.columns.as_slice())
                .filter(|cols| !cols.is_empty()),
        );

        sets.extend(
            self.unique_constraints
                .iter()
                .map(|uc| uc.columns.as_slice())
                .filter(|cols| !cols.is_empty()),
        );

        sets
    }
}

impl ForeignKey {
    #[cfg(test)]
    pub fn new(table: &str, columns: &[&str], referred_table: &str, referred_columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            constrained_columns: columns.iter().map(|c| c.to_string()).collect(),
            referred_table: referred_table.to_string(),
            referred_columns: referred_columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Table lookup by name: exact match first, then case-insensitive with
/// schema-qualified and bare names treated as equivalent.
pub struct TableLookup<'a> {
    tables: &'a [Table],
    exact: HashMap<&'a str, &'a Table>,
}

impl<'a> TableLookup<'a> {
    pub fn new(tables: &'a [Table]) -> Self {
        let mut exact = HashMap::with_capacity(tables.len());
        for table in tables {
            // first occurrence wins
            exact.entry(table.name.as_str()).or_insert(table);
        }
        Self { tables, exact }
    }

    pub fn get(&self, name: &str) -> Option<&'a Table> {
        if name.is_empty() {
            return None;
        }
        if let Some(table) = self.exact.get(name) {
            return Some(*table);
        }
        self.tables
            .iter()
            .find(|t| table_names_match(&t.name, name))
    }
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<Table>, foreign_keys: Vec<ForeignKey>) -> Self {
        Self {
            tables,
            foreign_keys,
        }
    }

    /// Foreign keys whose referred table does not resolve to any table here
    pub fn dangling_foreign_keys(&self) -> Vec<&ForeignKey> {
        let lookup = TableLookup::new(&self.tables);
        self.foreign_keys
            .iter()
            .filter(|fk| lookup.get(&fk.referred_table).is_none())
            .collect()
    }

    /// SHA-256 over the structural content of the snapshot.
    ///
    /// Tables are hashed in sorted order so the digest does not depend on
    /// introspection order; foreign keys are hashed as a sorted list too.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        let mut tables: Vec<&Table> = self.tables.iter().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));

        for table in tables {
            hasher.update(table.name.as_bytes());
            for col in &table.columns {
                hasher.update(format!("{}.{}:{}", table.name, col.name, col.data_type).as_bytes());
            }
        }

        let mut fks: Vec<String> = self
            .foreign_keys
            .iter()
            .map(|fk| {
                format!(
                    "FK:{}({})->{}({})",
                    fk.table,
                    fk.constrained_columns.join(","),
                    fk.referred_table,
                    fk.referred_columns.join(",")
                )
            })
            .collect();
        fks.sort();

        for fk in &fks {
            hasher.update(fk.as_bytes());
        }

        format!("{:x}", hasher.finalize())
    }
}
