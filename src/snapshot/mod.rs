//! Schema Snapshot Module
//!
//! The shared data contract between introspection and analysis:
//! - Snapshot model (tables, columns, indexes, foreign keys)
//! - Table name matching (case folding, qualified vs bare names)
//! - Boundary filtering (include/exclude lists, dangling references)

pub mod filter;
pub mod model;
pub mod names;

pub use filter::{RetainedTables, TableFilter};
pub use model::{Column, ForeignKey, Index, SchemaSnapshot, Table, TableLookup, UniqueConstraint};
