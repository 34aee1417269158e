// =====================================================
// COMMON DATABASE TYPES AND STRUCTURES
// =====================================================

use serde::{Deserialize, Serialize};

// --- Database Type Enum ---
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    MySQL,
    PostgreSQL,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::MySQL => write!(f, "mysql"),
            DatabaseType::PostgreSQL => write!(f, "postgresql"),
        }
    }
}

// --- Connection Configuration ---
//
// Built exclusively by `connections::parse_connection_url`; the database type
// is fixed at parse time and never changes afterwards.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConnectionConfig {
    #[serde(rename = "dbType", default)]
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    #[serde(rename = "sslMode")]
    pub ssl_mode: Option<String>,
    // PostgreSQL working schema; defaults to "public" when absent.
    pub schema: Option<String>,
}

// --- Validation Result ---
//
// Invalid input is a normal return value, not an error: every validator hands
// back one of these instead of failing.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
            warnings: Vec::new(),
        }
    }

    pub fn ok_with_warnings(warnings: Vec<String>) -> Self {
        Self {
            is_valid: true,
            error: None,
            warnings,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(reason.into()),
            warnings: Vec::new(),
        }
    }
}

// --- Query Result ---
#[derive(Serialize, Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

// --- Table Descriptor ---
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct TableDescriptor {
    pub name: String,
    pub table_type: String,
    pub engine: Option<String>,
    pub row_estimate: Option<i64>,
    pub comment: Option<String>,
}

// --- Column Schema ---
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub column_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub column_default: Option<String>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
}

// --- Foreign Key ---
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub table_name: String,
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub update_rule: String,
    pub delete_rule: String,
    pub relationship_type: String,
    pub relationship_strength: String,
}

// --- Table Index ---
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TableIndex {
    pub name: String,
    pub column_name: String,
    pub non_unique: bool,
    pub index_type: String,
    pub cardinality: Option<i64>,
}

// --- Table Details ---
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TableDetails {
    pub columns: Vec<ColumnSchema>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<TableIndex>,
}

// --- Plan Summary ---
//
// Dialect-independent reading of an EXPLAIN result. When the raw plan cannot
// be interpreted the summary fields stay empty and `raw_plan` carries whatever
// the server returned.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub operations: Vec<String>,
    pub potential_issues: Vec<String>,
    pub raw_plan: serde_json::Value,
}

// --- Query Complexity ---
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueryComplexity {
    Low,
    Medium,
    High,
}
