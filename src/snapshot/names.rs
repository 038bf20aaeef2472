//! Table name helpers
//!
//! Engines fold identifier case differently and callers mix bare and
//! schema-qualified names, so every cross-collection table comparison goes
//! through these helpers.

/// Split `schema.table` at the first dot
pub fn split_schema_and_table(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, name),
    }
}

/// `schema.table` when a schema is given, else the bare table name
pub fn format_table_name(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", schema, table),
        None => table.to_string(),
    }
}

/// Lowercased, optionally qualified form used as a comparison key
pub fn normalize_table_name(schema: Option<&str>, table: &str) -> String {
    format_table_name(schema, table).to_lowercase()
}

/// Case-insensitive name equality. When both names carry a schema the
/// schemas must agree too; otherwise only the table parts are compared.
pub fn table_names_match(a: &str, b: &str) -> bool {
    let (a_schema, a_table) = split_schema_and_table(a);
    let (b_schema, b_table) = split_schema_and_table(b);

    if a_table.to_lowercase() != b_table.to_lowercase() {
        return false;
    }

    match (a_schema, b_schema) {
        (Some(a_schema), Some(b_schema)) => a_schema.to_lowercase() == b_schema.to_lowercase(),
        _ => true,
    }
}

/// Double-quote an SQL identifier, doubling embedded quotes
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
