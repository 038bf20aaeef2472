//! Snapshot boundary filtering
//!
//! Include/exclude table filters and the set of retained tables used to
//! drop foreign keys that point outside the snapshot.

use super::names::{normalize_table_name, split_schema_and_table};
use std::collections::HashSet;

/// Normalized filter names, split into bare and qualified forms
#[derive(Debug, Default)]
struct NameSet {
    bare: HashSet<String>,
    qualified: HashSet<String>,
}

impl NameSet {
    fn from_names(names: &[String]) -> Self {
        let mut set = Self::default();
        for name in names {
            let (schema, table) = split_schema_and_table(name.trim());
            if table.is_empty() {
                continue;
            }
            set.bare.insert(table.to_lowercase());
            if let Some(schema) = schema {
                set.qualified.insert(normalize_table_name(Some(schema), table));
            }
        }
        set
    }

    fn contains(&self, normalized_full: &str, normalized_bare: &str) -> bool {
        self.qualified.contains(normalized_full) || self.bare.contains(normalized_bare)
    }
}

/// Include/exclude table filter applied before a snapshot is built
#[derive(Debug, Default)]
pub struct TableFilter {
    include: Option<NameSet>,
    exclude: NameSet,
}

impl TableFilter {
    pub fn new(include: Option<&[String]>, exclude: Option<&[String]>) -> Self {
        Self {
            include: include
                .filter(|names| !names.is_empty())
                .map(NameSet::from_names),
            exclude: exclude.map(NameSet::from_names).unwrap_or_default(),
        }
    }

    /// Whether a table in `schema` passes the filter. Exclusion wins.
    pub fn allows(&self, schema: Option<&str>, table: &str) -> bool {
        let normalized_full = normalize_table_name(schema, table);
        let normalized_bare = table.to_lowercase();

        if let Some(include) = &self.include {
            if !include.contains(&normalized_full, &normalized_bare) {
                return false;
            }
        }

        !self.exclude.contains(&normalized_full, &normalized_bare)
    }

    pub fn apply(&self, schema: Option<&str>, tables: Vec<String>) -> Vec<String> {
        tables
            .into_iter()
            .filter(|table| self.allows(schema, table))
            .collect()
    }
}

/// Tables retained in a snapshot, for resolving foreign key targets
#[derive(Debug, Default)]
pub struct RetainedTables {
    qualified: HashSet<String>,
    bare: HashSet<String>,
}

impl RetainedTables {
    pub fn new(schema: Option<&str>, tables: &[String]) -> Self {
        Self {
            qualified: tables
                .iter()
                .map(|t| normalize_table_name(schema, t))
                .collect(),
            bare: tables.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// Whether `schema.table` (or just `table`) was retained
    pub fn resolves(&self, schema: Option<&str>, table: &str) -> bool {
        self.qualified.contains(&normalize_table_name(schema, table))
            || self.bare.contains(&table.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        let filter = TableFilter::new(None, None);
        let tables = names(&["users", "orders"]);
        assert_eq!(filter.apply(None, tables.clone()), tables);
    }

    #[test]
    fn test_include_is_case_insensitive() {
        let include = names(&["ORDERS"]);
        let filter = TableFilter::new(Some(&include), None);
        assert_eq!(filter.apply(None, names(&["users", "orders"])), names(&["orders"]));
    }

    #[test]
    fn test_qualified_include_also_matches_bare_name() {
        let include = names(&["sales.orders"]);
        let filter = TableFilter::new(Some(&include), None);

        assert!(filter.allows(Some("sales"), "orders"));
        // bare part still matches regardless of schema
        assert!(filter.allows(Some("public"), "orders"));
        assert!(!filter.allows(Some("sales"), "users"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let include = names(&["users", "orders"]);
        let exclude = names(&["public.users"]);
        let filter = TableFilter::new(Some(&include), Some(&exclude));

        assert_eq!(
            filter.apply(Some("public"), names(&["users", "orders", "items"])),
            names(&["orders"])
        );
    }

    #[test]
    fn test_empty_include_list_is_ignored() {
        let include: Vec<String> = vec![];
        let filter = TableFilter::new(Some(&include), None);
        assert!(filter.allows(None, "users"));
    }

    #[test]
    fn test_retained_tables_resolve() {
        let retained = RetainedTables::new(Some("public"), &names(&["Users"]));

        assert!(retained.resolves(Some("public"), "users"));
        assert!(retained.resolves(None, "USERS"));
        assert!(retained.resolves(Some("audit"), "users"));
        assert!(!retained.resolves(Some("public"), "orders"));
    }
}
