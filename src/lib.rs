//! Read-only schema introspection for MySQL and PostgreSQL.
//!
//! The crate exposes a small set of operations built for callers that hand
//! SQL and identifiers straight through from untrusted input: every query is
//! validated against a read-only policy before it reaches a connection, every
//! result row is decoded into JSON values, and credentials never appear in
//! error messages.

pub mod catalog;
pub mod connections;
pub mod db_types;
pub mod error;
pub mod inspector;
pub mod mysql;
pub mod plan;
pub mod postgres;
pub mod query_guard;
pub mod sanitize;
pub mod sql_utils;

pub use connections::{parse_connection_url, ConnectionRegistry, DbConnection};
pub use db_types::{
    ColumnSchema, ConnectionConfig, DatabaseType, ForeignKey, PlanSummary, QueryComplexity,
    QueryResult, TableDescriptor, TableDetails, TableIndex, ValidationResult,
};
pub use error::{DbError, DbResult};
pub use inspector::SchemaInspector;
pub use plan::analyze_plan;
pub use query_guard::{query_complexity, validate_query};
