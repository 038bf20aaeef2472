//! Schema Introspection Module
//!
//! Reads table, column, key and index metadata from a live PostgreSQL
//! database and normalizes it into a `SchemaSnapshot`. This is the only
//! place that talks to a target database; the analyses downstream never do.

use crate::config::IntrospectionConfig;
use crate::connection::{open_pool, ConnectionParams};
use crate::error::AppError;
use crate::snapshot::names::{format_table_name, quote_identifier};
use crate::snapshot::{Column, ForeignKey, Index, RetainedTables, SchemaSnapshot, Table, TableFilter, UniqueConstraint};
use deadpool_postgres::{Client, Pool, PoolError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const ROW_COUNT_SKIPPED_WARNING: &str =
    "Row counts skipped unless schema or include_tables is provided.";

/// What to collect and how to scope it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectOptions {
    pub schema: Option<String>,
    pub include_tables: Option<Vec<String>>,
    pub exclude_tables: Option<Vec<String>>,
    #[serde(default)]
    pub include_stats: bool,
}

impl InspectOptions {
    fn has_includes(&self) -> bool {
        self.include_tables.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Exact counts scan whole tables, so unless configured otherwise they
    /// are only taken for requests scoped by schema or include list.
    pub fn should_count_rows(&self, settings: &IntrospectionConfig) -> bool {
        if !self.include_stats {
            return false;
        }
        if !settings.row_count_requires_scope {
            return true;
        }
        self.schema.is_some() || self.has_includes()
    }
}

/// Result of a schema collection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedSchema {
    pub schema: Option<String>,
    #[serde(flatten)]
    pub snapshot: SchemaSnapshot,
    pub views: Vec<String>,
    pub dialect: String,
    pub warnings: Vec<String>,
}

/// Name a referred table the way the owning tables are named: qualified
/// whenever a schema was requested, otherwise bare for the default schema.
pub fn referred_table_name(
    requested_schema: Option<&str>,
    default_schema: &str,
    referred_schema: &str,
    referred_table: &str,
) -> (Option<String>, String) {
    let schema = match requested_schema {
        Some(_) => Some(referred_schema.to_string()),
        None if referred_schema == default_schema => None,
        None => Some(referred_schema.to_string()),
    };
    (schema, referred_table.to_string())
}

/// A backend failure means the target database refused or never answered;
/// anything else is the pool itself (closed, timed out waiting)
fn checkout_error(e: PoolError) -> AppError {
    match e {
        PoolError::Backend(e) => AppError::Connection(format!("Failed to connect: {}", e)),
        other => AppError::Pool(other),
    }
}

/// Schema introspector for PostgreSQL
pub struct PostgresIntrospector;

impl PostgresIntrospector {
    /// Connect with a request-scoped pool, collect, and release the pool
    pub async fn collect_from_url(
        connection_url: &str,
        options: &InspectOptions,
        settings: &IntrospectionConfig,
    ) -> Result<CollectedSchema, AppError> {
        let params = ConnectionParams::from_connection_string(connection_url)?;
        let pool = open_pool(&params, settings)?;

        let result = Self::collect(&pool, params.db_type.dialect(), options, settings).await;
        pool.close();
        result
    }

    /// List schemas for the database behind `connection_url`
    pub async fn list_schemas_from_url(
        connection_url: &str,
        settings: &IntrospectionConfig,
    ) -> Result<(Vec<String>, &'static str), AppError> {
        let params = ConnectionParams::from_connection_string(connection_url)?;
        let pool = open_pool(&params, settings)?;

        let result = Self::list_schemas(&pool).await;
        pool.close();
        result.map(|schemas| (schemas, params.db_type.dialect()))
    }

    pub async fn list_schemas(pool: &Pool) -> Result<Vec<String>, AppError> {
        let client = Self::client(pool).await?;

        let rows = client
            .query(
                r#"
                SELECT nspname::text AS schema_name
                FROM pg_namespace
                WHERE nspname NOT LIKE 'pg\_%'
                ORDER BY nspname
                "#,
                &[],
            )
            .await?;

        Ok(rows.iter().map(|row| row.get("schema_name")).collect())
    }

    /// Collect a normalized snapshot for one schema
    pub async fn collect(
        pool: &Pool,
        dialect: &str,
        options: &InspectOptions,
        settings: &IntrospectionConfig,
    ) -> Result<CollectedSchema, AppError> {
        let client = Self::client(pool).await?;

        let default_schema = Self::current_schema(&client).await?;
        let requested = options.schema.as_deref();
        let target = requested.unwrap_or(default_schema.as_str()).to_string();

        let filter = TableFilter::new(options.include_tables.as_deref(), options.exclude_tables.as_deref());

        let table_names = filter.apply(requested, Self::relations(&client, &target, &["r", "p"]).await?);
        let views = filter.apply(requested, Self::relations(&client, &target, &["v", "m"]).await?);

        let retained = RetainedTables::new(requested, &table_names);

        let count_rows = options.should_count_rows(settings);
        let mut warnings = Vec::new();
        if options.include_stats && !count_rows {
            warnings.push(ROW_COUNT_SKIPPED_WARNING.to_string());
        }

        let mut tables = Vec::with_capacity(table_names.len());
        let mut foreign_keys = Vec::new();

        for table in &table_names {
            let qualified = format_table_name(requested, table);

            let row_count = if count_rows {
                Self::count_rows(&client, &target, table).await
            } else {
                None
            };

            tables.push(Table {
                name: qualified.clone(),
                columns: Self::get_columns(&client, &target, table).await?,
                primary_key: Self::get_primary_key(&client, &target, table).await?,
                indexes: Self::get_indexes(&client, &target, table).await?,
                unique_constraints: Self::get_unique_constraints(&client, &target, table).await?,
                row_count,
            });

            for (referred_schema, referred_table, constrained, referred) in
                Self::get_foreign_keys(&client, &target, table).await?
            {
                let (schema, name) =
                    referred_table_name(requested, &default_schema, &referred_schema, &referred_table);

                if !retained.resolves(schema.as_deref(), &name) {
                    debug!("Skipping FK {} -> {}: target outside snapshot", qualified, name);
                    continue;
                }

                foreign_keys.push(ForeignKey {
                    table: qualified.clone(),
                    constrained_columns: constrained,
                    referred_table: format_table_name(schema.as_deref(), &name),
                    referred_columns: referred,
                });
            }
        }

        info!(
            "Introspected schema '{}': {} tables, {} FKs, {} views",
            target,
            tables.len(),
            foreign_keys.len(),
            views.len()
        );

        Ok(CollectedSchema {
            schema: options.schema.clone(),
            snapshot: SchemaSnapshot::new(tables, foreign_keys),
            views,
            dialect: dialect.to_string(),
            warnings,
        })
    }

    async fn client(pool: &Pool) -> Result<Client, AppError> {
        pool.get().await.map_err(checkout_error)
    }

    async fn current_schema(client: &Client) -> Result<String, AppError> {
        let row = client.query_one("SELECT current_schema()::text AS schema", &[]).await?;
        let schema: Option<String> = row.get("schema");
        Ok(schema.unwrap_or_else(|| "public".to_string()))
    }

    /// Relation names of the given `relkind`s in a schema
    async fn relations(client: &Client, schema: &str, kinds: &[&str]) -> Result<Vec<String>, AppError> {
        let kinds: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
        let rows = client
            .query(
                r#"
                SELECT c.relname::text AS name
                FROM pg_class c
                JOIN pg_namespace n ON n.oid = c.relnamespace
                WHERE n.nspname = $1
                  AND c.relkind::text = ANY($2)
                ORDER BY c.relname
                "#,
                &[&schema, &kinds],
            )
            .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    /// Get columns for a table
    async fn get_columns(client: &Client, schema: &str, table: &str) -> Result<Vec<Column>, AppError> {
        let rows = client
            .query(
                r#"
                SELECT
                    a.attname::text AS column_name,
                    format_type(a.atttypid, a.atttypmod) AS data_type,
                    NOT a.attnotnull AS nullable,
                    pg_get_expr(d.adbin, d.adrelid) AS column_default
                FROM pg_attribute a
                JOIN pg_class c ON c.oid = a.attrelid
                JOIN pg_namespace n ON n.oid = c.relnamespace
                LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
                WHERE n.nspname = $1
                  AND c.relname = $2
                  AND a.attnum > 0
                  AND NOT a.attisdropped
                ORDER BY a.attnum
                "#,
                &[&schema, &table],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| Column {
                name: row.get("column_name"),
                data_type: row.get("data_type"),
                nullable: row.get("nullable"),
                default: row.get("column_default"),
            })
            .collect())
    }

    /// Primary key columns in key order
    async fn get_primary_key(client: &Client, schema: &str, table: &str) -> Result<Vec<String>, AppError> {
        let rows = client
            .query(
                r#"
                SELECT
                    ARRAY(
                        SELECT a.attname::text
                        FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
                        JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                        ORDER BY k.ord
                    ) AS columns
                FROM pg_constraint con
                JOIN pg_class c ON c.oid = con.conrelid
                JOIN pg_namespace n ON n.oid = c.relnamespace
                WHERE con.contype = 'p'
                  AND n.nspname = $1
                  AND c.relname = $2
                "#,
                &[&schema, &table],
            )
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.try_get("columns").ok())
            .unwrap_or_default())
    }

    /// Non-primary indexes with their ordered columns. Expression slots
    /// (attnum 0) keep their position, reported as the expression text.
    async fn get_indexes(client: &Client, schema: &str, table: &str) -> Result<Vec<Index>, AppError> {
        let rows = client
            .query(
                r#"
                SELECT
                    i.relname::text AS index_name,
                    ix.indisunique AS is_unique,
                    ARRAY(
                        SELECT COALESCE(a.attname::text, pg_get_indexdef(ix.indexrelid, k.ord::int, true))
                        FROM unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
                        LEFT JOIN pg_attribute a
                          ON a.attrelid = ix.indrelid AND a.attnum = k.attnum AND k.attnum > 0
                        ORDER BY k.ord
                    ) AS columns
                FROM pg_index ix
                JOIN pg_class t ON t.oid = ix.indrelid
                JOIN pg_class i ON i.oid = ix.indexrelid
                JOIN pg_namespace n ON n.oid = t.relnamespace
                WHERE n.nspname = $1
                  AND t.relname = $2
                  AND NOT ix.indisprimary
                ORDER BY i.relname
                "#,
                &[&schema, &table],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| Index {
                name: row.get("index_name"),
                columns: row.try_get("columns").unwrap_or_default(),
                unique: row.get("is_unique"),
            })
            .collect())
    }

    async fn get_unique_constraints(
        client: &Client,
        schema: &str,
        table: &str,
    ) -> Result<Vec<UniqueConstraint>, AppError> {
        let rows = client
            .query(
                r#"
                SELECT
                    con.conname::text AS constraint_name,
                    ARRAY(
                        SELECT a.attname::text
                        FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
                        JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                        ORDER BY k.ord
                    ) AS columns
                FROM pg_constraint con
                JOIN pg_class c ON c.oid = con.conrelid
                JOIN pg_namespace n ON n.oid = c.relnamespace
                WHERE con.contype = 'u'
                  AND n.nspname = $1
                  AND c.relname = $2
                ORDER BY con.conname
                "#,
                &[&schema, &table],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| UniqueConstraint {
                name: row.get("constraint_name"),
                columns: row.try_get("columns").unwrap_or_default(),
            })
            .collect())
    }

    /// Outgoing foreign keys as (referred schema, referred table,
    /// constrained columns, referred columns), columns in key order
    async fn get_foreign_keys(
        client: &Client,
        schema: &str,
        table: &str,
    ) -> Result<Vec<(String, String, Vec<String>, Vec<String>)>, AppError> {
        let rows = client
            .query(
                r#"
                SELECT
                    rn.nspname::text AS referred_schema,
                    rc.relname::text AS referred_table,
                    ARRAY(
                        SELECT a.attname::text
                        FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
                        JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                        ORDER BY k.ord
                    ) AS constrained_columns,
                    ARRAY(
                        SELECT a.attname::text
                        FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
                        JOIN pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.attnum
                        ORDER BY k.ord
                    ) AS referred_columns
                FROM pg_constraint con
                JOIN pg_class c ON c.oid = con.conrelid
                JOIN pg_namespace n ON n.oid = c.relnamespace
                JOIN pg_class rc ON rc.oid = con.confrelid
                JOIN pg_namespace rn ON rn.oid = rc.relnamespace
                WHERE con.contype = 'f'
                  AND n.nspname = $1
                  AND c.relname = $2
                ORDER BY con.conname
                "#,
                &[&schema, &table],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                (
                    row.get("referred_schema"),
                    row.get("referred_table"),
                    row.try_get("constrained_columns").unwrap_or_default(),
                    row.try_get("referred_columns").unwrap_or_default(),
                )
            })
            .collect())
    }

    /// Exact row count; `None` when the count fails (permissions etc.)
    async fn count_rows(client: &Client, schema: &str, table: &str) -> Option<i64> {
        let query = format!(
            "SELECT COUNT(*) AS count FROM {}.{}",
            quote_identifier(schema),
            quote_identifier(table)
        );

        match client.query_one(query.as_str(), &[]).await {
            Ok(row) => row.try_get("count").ok(),
            Err(e) => {
                debug!("Row count failed for {}.{}: {}", schema, table, e);
                None
            }
        }
    }
}
