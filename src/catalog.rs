// =====================================================
// DIALECT DETECTION AND CATALOG QUERY BUILDERS
// =====================================================
//
// All catalog access goes through INFORMATION_SCHEMA (MySQL) or
// information_schema + pg_catalog (PostgreSQL). Builders return the SQL
// together with the ordered parameter list; identifiers never get
// interpolated into the statement text. Result columns are aliased to the
// same lowercase names on both dialects so the row shaping downstream is
// dialect-blind.

use regex::Regex;
use std::sync::LazyLock;

use crate::db_types::DatabaseType;
use crate::error::{DbError, DbResult};

static FILTER_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z_]+$").unwrap());

/// A catalog statement plus its ordered bind parameters.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub sql: String,
    pub params: Vec<String>,
}

/// Picks the dialect from a connection URL's scheme.
pub fn detect_dialect(url: &str) -> DbResult<DatabaseType> {
    let scheme = url.split("://").next().unwrap_or("").to_lowercase();
    match scheme.as_str() {
        "mysql" => Ok(DatabaseType::MySQL),
        "postgresql" | "postgres" => Ok(DatabaseType::PostgreSQL),
        other => Err(DbError::validation(format!(
            "unsupported connection scheme '{}': expected mysql, postgresql or postgres",
            other
        ))),
    }
}

pub fn table_list_query(db_type: &DatabaseType, schema: &str) -> CatalogQuery {
    match db_type {
        DatabaseType::MySQL => CatalogQuery {
            sql: r#"
                SELECT
                    TABLE_NAME AS table_name,
                    TABLE_TYPE AS table_type,
                    ENGINE AS engine,
                    TABLE_ROWS AS row_estimate,
                    TABLE_COMMENT AS table_comment
                FROM INFORMATION_SCHEMA.TABLES
                WHERE TABLE_SCHEMA = ?
                ORDER BY TABLE_NAME
            "#
            .to_string(),
            params: vec![schema.to_string()],
        },
        DatabaseType::PostgreSQL => CatalogQuery {
            sql: r#"
                SELECT
                    t.table_name AS table_name,
                    t.table_type AS table_type,
                    NULL AS engine,
                    c.reltuples::bigint AS row_estimate,
                    obj_description(c.oid) AS table_comment
                FROM information_schema.tables t
                LEFT JOIN pg_catalog.pg_class c
                    ON c.relname = t.table_name
                LEFT JOIN pg_catalog.pg_namespace n
                    ON n.oid = c.relnamespace AND n.nspname = t.table_schema
                WHERE t.table_schema = $1
                ORDER BY t.table_name
            "#
            .to_string(),
            params: vec![schema.to_string()],
        },
    }
}

pub fn column_query(db_type: &DatabaseType, schema: &str, table: &str) -> CatalogQuery {
    match db_type {
        DatabaseType::MySQL => CatalogQuery {
            sql: r#"
                SELECT
                    COLUMN_NAME AS column_name,
                    DATA_TYPE AS data_type,
                    COLUMN_TYPE AS column_type,
                    IS_NULLABLE AS is_nullable,
                    COLUMN_KEY AS column_key,
                    COLUMN_DEFAULT AS column_default,
                    EXTRA AS extra,
                    NUMERIC_PRECISION AS numeric_precision,
                    NUMERIC_SCALE AS numeric_scale
                FROM INFORMATION_SCHEMA.COLUMNS
                WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
                ORDER BY ORDINAL_POSITION
            "#
            .to_string(),
            params: vec![schema.to_string(), table.to_string()],
        },
        DatabaseType::PostgreSQL => CatalogQuery {
            sql: r#"
                SELECT
                    c.column_name AS column_name,
                    c.data_type AS data_type,
                    c.udt_name AS column_type,
                    c.is_nullable AS is_nullable,
                    CASE WHEN pk.column_name IS NOT NULL THEN 'PRI' ELSE '' END AS column_key,
                    c.column_default AS column_default,
                    '' AS extra,
                    c.numeric_precision::bigint AS numeric_precision,
                    c.numeric_scale::bigint AS numeric_scale
                FROM information_schema.columns c
                LEFT JOIN (
                    SELECT kcu.column_name
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage kcu
                        ON tc.constraint_name = kcu.constraint_name
                        AND tc.table_schema = kcu.table_schema
                    WHERE tc.table_schema = $1
                        AND tc.table_name = $2
                        AND tc.constraint_type = 'PRIMARY KEY'
                ) pk ON c.column_name = pk.column_name
                WHERE c.table_schema = $1
                    AND c.table_name = $2
                ORDER BY c.ordinal_position
            "#
            .to_string(),
            params: vec![schema.to_string(), table.to_string()],
        },
    }
}

pub fn foreign_key_query(
    db_type: &DatabaseType,
    schema: &str,
    table: Option<&str>,
) -> CatalogQuery {
    match db_type {
        DatabaseType::MySQL => {
            let mut sql = r#"
                SELECT
                    kcu.CONSTRAINT_NAME AS constraint_name,
                    kcu.TABLE_NAME AS table_name,
                    kcu.COLUMN_NAME AS column_name,
                    kcu.REFERENCED_TABLE_NAME AS referenced_table,
                    kcu.REFERENCED_COLUMN_NAME AS referenced_column,
                    rc.UPDATE_RULE AS update_rule,
                    rc.DELETE_RULE AS delete_rule
                FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
                    ON kcu.CONSTRAINT_NAME = rc.CONSTRAINT_NAME
                    AND kcu.TABLE_SCHEMA = rc.CONSTRAINT_SCHEMA
                WHERE kcu.TABLE_SCHEMA = ?
                    AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
            "#
            .to_string();
            let mut params = vec![schema.to_string()];
            if let Some(table) = table {
                sql.push_str("    AND kcu.TABLE_NAME = ?\n");
                params.push(table.to_string());
            }
            sql.push_str("    ORDER BY kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION\n");
            CatalogQuery { sql, params }
        }
        DatabaseType::PostgreSQL => {
            let mut sql = r#"
                SELECT
                    tc.constraint_name AS constraint_name,
                    tc.table_name AS table_name,
                    kcu.column_name AS column_name,
                    ccu.table_name AS referenced_table,
                    ccu.column_name AS referenced_column,
                    rc.update_rule AS update_rule,
                    rc.delete_rule AS delete_rule
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON tc.constraint_name = kcu.constraint_name
                    AND tc.table_schema = kcu.table_schema
                JOIN information_schema.constraint_column_usage ccu
                    ON ccu.constraint_name = tc.constraint_name
                    AND ccu.table_schema = tc.table_schema
                JOIN information_schema.referential_constraints rc
                    ON rc.constraint_name = tc.constraint_name
                    AND rc.constraint_schema = tc.table_schema
                WHERE tc.constraint_type = 'FOREIGN KEY'
                    AND tc.table_schema = $1
            "#
            .to_string();
            let mut params = vec![schema.to_string()];
            if let Some(table) = table {
                sql.push_str("    AND tc.table_name = $2\n");
                params.push(table.to_string());
            }
            sql.push_str("    ORDER BY tc.constraint_name\n");
            CatalogQuery { sql, params }
        }
    }
}

pub fn index_query(db_type: &DatabaseType, schema: &str, table: &str) -> CatalogQuery {
    match db_type {
        DatabaseType::MySQL => CatalogQuery {
            sql: r#"
                SELECT
                    INDEX_NAME AS index_name,
                    COLUMN_NAME AS column_name,
                    NON_UNIQUE AS non_unique,
                    INDEX_TYPE AS index_type,
                    CARDINALITY AS cardinality
                FROM INFORMATION_SCHEMA.STATISTICS
                WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
                ORDER BY INDEX_NAME, SEQ_IN_INDEX
            "#
            .to_string(),
            params: vec![schema.to_string(), table.to_string()],
        },
        DatabaseType::PostgreSQL => CatalogQuery {
            sql: r#"
                SELECT
                    i.relname AS index_name,
                    a.attname AS column_name,
                    NOT ix.indisunique AS non_unique,
                    am.amname AS index_type,
                    NULL::bigint AS cardinality
                FROM pg_catalog.pg_class t
                JOIN pg_catalog.pg_index ix ON t.oid = ix.indrelid
                JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
                JOIN pg_catalog.pg_attribute a
                    ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
                JOIN pg_catalog.pg_am am ON i.relam = am.oid
                JOIN pg_catalog.pg_namespace n ON t.relnamespace = n.oid
                WHERE n.nspname = $1 AND t.relname = $2
                ORDER BY i.relname, a.attnum
            "#
            .to_string(),
            params: vec![schema.to_string(), table.to_string()],
        },
    }
}

/// Catalog views that may be queried directly with column filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Columns,
    Tables,
    Routines,
}

impl CatalogTable {
    pub fn parse(name: &str) -> DbResult<Self> {
        match name.to_uppercase().as_str() {
            "COLUMNS" => Ok(CatalogTable::Columns),
            "TABLES" => Ok(CatalogTable::Tables),
            "ROUTINES" => Ok(CatalogTable::Routines),
            other => Err(DbError::validation(format!(
                "unknown catalog table '{}': expected COLUMNS, TABLES or ROUTINES",
                other
            ))),
        }
    }

    fn view_name(&self) -> &'static str {
        match self {
            CatalogTable::Columns => "COLUMNS",
            CatalogTable::Tables => "TABLES",
            CatalogTable::Routines => "ROUTINES",
        }
    }
}

/// Builds a filtered information-schema query. Filter keys must match
/// `[A-Z_]+`; they become column references, so anything else is rejected
/// before the SQL is assembled. Filter values are always bound.
pub fn information_schema_query(
    db_type: &DatabaseType,
    catalog_table: CatalogTable,
    filters: &[(String, String)],
    limit: u32,
) -> DbResult<CatalogQuery> {
    for (key, _) in filters {
        if !FILTER_KEY_REGEX.is_match(key) {
            return Err(DbError::validation(format!(
                "invalid filter key '{}': only uppercase letters and underscores are allowed",
                key
            )));
        }
    }

    let mut params = Vec::with_capacity(filters.len());
    let mut clauses = Vec::with_capacity(filters.len());
    for (idx, (key, value)) in filters.iter().enumerate() {
        let column = match db_type {
            DatabaseType::MySQL => key.clone(),
            DatabaseType::PostgreSQL => key.to_lowercase(),
        };
        let placeholder = match db_type {
            DatabaseType::MySQL => "?".to_string(),
            DatabaseType::PostgreSQL => format!("${}", idx + 1),
        };
        clauses.push(format!("{} = {}", column, placeholder));
        params.push(value.clone());
    }

    let view = match db_type {
        DatabaseType::MySQL => format!("INFORMATION_SCHEMA.{}", catalog_table.view_name()),
        DatabaseType::PostgreSQL => format!(
            "information_schema.{}",
            catalog_table.view_name().to_lowercase()
        ),
    };

    let mut sql = format!("SELECT * FROM {}", view);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(" LIMIT {}", limit));

    Ok(CatalogQuery { sql, params })
}

/// Coarse reading of a foreign key's referential rules. Informational only;
/// nothing branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipClass {
    pub relationship_type: &'static str,
    pub relationship_strength: &'static str,
}

pub fn classify_relationship(update_rule: &str, delete_rule: &str) -> RelationshipClass {
    let update = update_rule.trim().to_uppercase();
    let delete = delete_rule.trim().to_uppercase();

    let relationship_type = match delete.as_str() {
        "CASCADE" => "strong_dependency",
        "RESTRICT" | "NO ACTION" => "protective",
        "SET NULL" => "optional_reference",
        _ => "unknown",
    };

    let relationship_strength = if update == "CASCADE" && delete == "CASCADE" {
        "strong"
    } else if update == "RESTRICT" || delete == "RESTRICT" {
        "medium"
    } else {
        "weak"
    };

    RelationshipClass {
        relationship_type,
        relationship_strength,
    }
}

#[cfg(test)]
mod tests;
