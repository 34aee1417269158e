// =====================================================
// PUBLIC INSPECTION OPERATIONS
// =====================================================
//
// Every operation resolves its alias, opens one dedicated connection, runs
// its catalog or user query, and releases the connection on every exit path.
// Free-form SQL is validated before anything touches the network.

use serde_json::Value;
use tokio::time::{timeout, Duration};

use crate::catalog::{
    self, classify_relationship, CatalogQuery, CatalogTable,
};
use crate::connections::{ConnectionRegistry, DbConnection};
use crate::db_types::{
    ColumnSchema, ConnectionConfig, DatabaseType, ForeignKey, PlanSummary, QueryResult,
    TableDescriptor, TableDetails, TableIndex,
};
use crate::error::{DbError, DbResult};
use crate::plan::analyze_plan;
use crate::query_guard::validate_query;
use crate::sanitize::{sanitize_input, unquote_identifier, validate_identifier, IdentifierKind};
use crate::sql_utils::apply_row_limit;

const DEFAULT_ROW_LIMIT: u32 = 1000;
const DEFAULT_CATALOG_ROW_LIMIT: u32 = 100;
const QUERY_TIMEOUT_SECS: u64 = 30;

pub struct SchemaInspector {
    registry: ConnectionRegistry,
}

impl Default for SchemaInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInspector {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
        }
    }

    // --- Connection Management ---

    pub async fn register_connection(&self, alias: &str, url: &str) -> DbResult<()> {
        self.registry.register(alias, url).await
    }

    pub async fn remove_connection(&self, alias: &str) -> DbResult<()> {
        self.registry.remove(alias).await
    }

    pub async fn list_aliases(&self) -> Vec<String> {
        self.registry.aliases().await
    }

    pub async fn test_connection(&self, alias: &str) -> DbResult<String> {
        let config = self.registry.get(alias).await?;
        let mut conn = DbConnection::acquire(&config).await?;
        let result = conn.handshake().await;
        conn.release().await;
        result?;
        Ok(format!("{} connection successful", config.db_type))
    }

    // --- Schema Introspection ---

    pub async fn list_tables(&self, alias: &str) -> DbResult<Vec<TableDescriptor>> {
        let config = self.registry.get(alias).await?;
        let schema = working_schema(&config)?;
        let query = catalog::table_list_query(&config.db_type, &schema);

        let rows = self.run_catalog_query(&config, &query).await?;
        Ok(rows.iter().map(shape_table).collect())
    }

    pub async fn inspect_table(&self, alias: &str, table: &str) -> DbResult<TableDetails> {
        let table = self.checked_identifier(table, IdentifierKind::Table)?;
        let config = self.registry.get(alias).await?;
        let schema = working_schema(&config)?;

        let started = chrono::Utc::now();
        let mut conn = DbConnection::acquire(&config).await?;
        let result = async {
            let columns = run_with_timeout(
                &mut conn,
                &catalog::column_query(&config.db_type, &schema, &table),
            )
            .await?;
            let foreign_keys = run_with_timeout(
                &mut conn,
                &catalog::foreign_key_query(&config.db_type, &schema, Some(&table)),
            )
            .await?;
            let indexes = run_with_timeout(
                &mut conn,
                &catalog::index_query(&config.db_type, &schema, &table),
            )
            .await?;
            Ok(TableDetails {
                columns: columns.iter().map(|m| shape_column(&config.db_type, m)).collect(),
                foreign_keys: foreign_keys.iter().map(shape_foreign_key).collect(),
                indexes: indexes.iter().map(shape_index).collect(),
            })
        }
        .await;
        conn.release().await;

        log::debug!(
            "inspect_table {}.{} took {} ms",
            alias,
            table,
            (chrono::Utc::now() - started).num_milliseconds()
        );
        result
    }

    pub async fn get_foreign_keys(
        &self,
        alias: &str,
        table: Option<&str>,
    ) -> DbResult<Vec<ForeignKey>> {
        let table = match table {
            Some(t) => Some(self.checked_identifier(t, IdentifierKind::Table)?),
            None => None,
        };
        let config = self.registry.get(alias).await?;
        let schema = working_schema(&config)?;
        let query = catalog::foreign_key_query(&config.db_type, &schema, table.as_deref());

        let rows = self.run_catalog_query(&config, &query).await?;
        Ok(rows.iter().map(shape_foreign_key).collect())
    }

    pub async fn get_indexes(&self, alias: &str, table: &str) -> DbResult<Vec<TableIndex>> {
        let table = self.checked_identifier(table, IdentifierKind::Table)?;
        let config = self.registry.get(alias).await?;
        let schema = working_schema(&config)?;
        let query = catalog::index_query(&config.db_type, &schema, &table);

        let rows = self.run_catalog_query(&config, &query).await?;
        Ok(rows.iter().map(shape_index).collect())
    }

    // --- Query Execution ---

    pub async fn execute_query(
        &self,
        alias: &str,
        sql: &str,
        params: &[Value],
        limit: Option<u32>,
    ) -> DbResult<QueryResult> {
        let config = self.registry.get(alias).await?;

        let check = validate_query(sql, &config.db_type);
        if !check.is_valid {
            return Err(DbError::validation(
                check.error.unwrap_or_else(|| "query rejected".to_string()),
            ));
        }
        for warning in &check.warnings {
            log::debug!("query warning: {}", warning);
        }
        for value in params {
            if value.is_array() || value.is_object() {
                return Err(DbError::validation(
                    "query parameters must be JSON scalars (null, bool, number or string)",
                ));
            }
        }

        let bounded = apply_row_limit(sql, limit.unwrap_or(DEFAULT_ROW_LIMIT));

        let mut conn = DbConnection::acquire(&config).await?;
        let result = timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            conn.fetch_grid(&bounded, params),
        )
        .await
        .unwrap_or_else(|_| {
            Err(DbError::query(
                format!("query timed out after {} seconds", QUERY_TIMEOUT_SECS),
                &bounded,
                params.to_vec(),
            ))
        });
        conn.release().await;
        result
    }

    pub async fn analyze_query(&self, alias: &str, sql: &str) -> DbResult<PlanSummary> {
        let config = self.registry.get(alias).await?;

        let check = validate_query(sql, &config.db_type);
        if !check.is_valid {
            return Err(DbError::validation(
                check.error.unwrap_or_else(|| "query rejected".to_string()),
            ));
        }

        let mut conn = DbConnection::acquire(&config).await?;
        let raw_plan = timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            conn.fetch_execution_plan(sql),
        )
        .await
        .unwrap_or_else(|_| {
            Err(DbError::query(
                format!("EXPLAIN timed out after {} seconds", QUERY_TIMEOUT_SECS),
                sql,
                vec![],
            ))
        });
        conn.release().await;

        Ok(analyze_plan(&config.db_type, &raw_plan?))
    }

    pub async fn query_information_schema(
        &self,
        alias: &str,
        catalog_table: &str,
        filters: &[(String, String)],
        limit: Option<u32>,
    ) -> DbResult<QueryResult> {
        let config = self.registry.get(alias).await?;
        let table = CatalogTable::parse(catalog_table)?;

        let cleaned: Vec<(String, String)> = filters
            .iter()
            .map(|(k, v)| (k.clone(), sanitize_input(v)))
            .collect();
        let query = catalog::information_schema_query(
            &config.db_type,
            table,
            &cleaned,
            limit.unwrap_or(DEFAULT_CATALOG_ROW_LIMIT),
        )?;

        let params: Vec<Value> = query.params.iter().map(|p| Value::String(p.clone())).collect();
        let mut conn = DbConnection::acquire(&config).await?;
        let result = timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            conn.fetch_grid(&query.sql, &params),
        )
        .await
        .unwrap_or_else(|_| {
            Err(DbError::query(
                format!("query timed out after {} seconds", QUERY_TIMEOUT_SECS),
                &query.sql,
                params.clone(),
            ))
        });
        conn.release().await;
        result
    }

    // --- Helpers ---

    fn checked_identifier(&self, name: &str, kind: IdentifierKind) -> DbResult<String> {
        let cleaned = sanitize_input(name);
        let check = validate_identifier(&cleaned, kind);
        if !check.is_valid {
            return Err(DbError::validation(
                check.error.unwrap_or_else(|| format!("invalid {} name", kind)),
            ));
        }
        Ok(unquote_identifier(&cleaned).to_string())
    }

    async fn run_catalog_query(
        &self,
        config: &ConnectionConfig,
        query: &CatalogQuery,
    ) -> DbResult<Vec<serde_json::Map<String, Value>>> {
        let mut conn = DbConnection::acquire(config).await?;
        let result = run_with_timeout(&mut conn, query).await;
        conn.release().await;
        result
    }
}

async fn run_with_timeout(
    conn: &mut DbConnection,
    query: &CatalogQuery,
) -> DbResult<Vec<serde_json::Map<String, Value>>> {
    timeout(Duration::from_secs(QUERY_TIMEOUT_SECS), conn.fetch_maps(query))
        .await
        .unwrap_or_else(|_| {
            Err(DbError::query(
                format!("catalog query timed out after {} seconds", QUERY_TIMEOUT_SECS),
                &query.sql,
                query.params.iter().map(|p| serde_json::json!(p)).collect(),
            ))
        })
}

/// MySQL catalogs are filtered by the database named in the URL; PostgreSQL
/// defaults to the `public` schema unless the URL names another one.
fn working_schema(config: &ConnectionConfig) -> DbResult<String> {
    match config.db_type {
        DatabaseType::MySQL => config.database.clone().ok_or_else(|| {
            DbError::validation("connection URL does not name a database to inspect")
        }),
        DatabaseType::PostgreSQL => Ok(config
            .schema
            .clone()
            .unwrap_or_else(|| "public".to_string())),
    }
}

// --- Row Shaping ---

fn get_str(map: &serde_json::Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn get_opt_str(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn get_opt_i64(map: &serde_json::Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn get_flag(map: &serde_json::Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn shape_table(map: &serde_json::Map<String, Value>) -> TableDescriptor {
    TableDescriptor {
        name: get_str(map, "table_name"),
        table_type: get_str(map, "table_type"),
        engine: get_opt_str(map, "engine"),
        row_estimate: get_opt_i64(map, "row_estimate"),
        comment: get_opt_str(map, "table_comment"),
    }
}

fn shape_column(db_type: &DatabaseType, map: &serde_json::Map<String, Value>) -> ColumnSchema {
    let column_default = get_opt_str(map, "column_default");
    // Auto-increment is reported differently per dialect: MySQL flags it in
    // EXTRA, PostgreSQL shows a nextval() default for serial columns.
    let is_auto_increment = match db_type {
        DatabaseType::MySQL => get_str(map, "extra").to_lowercase().contains("auto_increment"),
        DatabaseType::PostgreSQL => column_default
            .as_deref()
            .is_some_and(|d| d.contains("nextval")),
    };

    ColumnSchema {
        name: get_str(map, "column_name"),
        data_type: get_str(map, "data_type"),
        column_type: get_str(map, "column_type"),
        is_nullable: get_str(map, "is_nullable") == "YES",
        is_primary_key: get_str(map, "column_key").contains("PRI"),
        is_auto_increment,
        column_default,
        numeric_precision: get_opt_i64(map, "numeric_precision"),
        numeric_scale: get_opt_i64(map, "numeric_scale"),
    }
}

fn shape_foreign_key(map: &serde_json::Map<String, Value>) -> ForeignKey {
    let update_rule = get_str(map, "update_rule");
    let delete_rule = get_str(map, "delete_rule");
    let class = classify_relationship(&update_rule, &delete_rule);

    ForeignKey {
        constraint_name: get_str(map, "constraint_name"),
        table_name: get_str(map, "table_name"),
        column_name: get_str(map, "column_name"),
        referenced_table: get_str(map, "referenced_table"),
        referenced_column: get_str(map, "referenced_column"),
        update_rule,
        delete_rule,
        relationship_type: class.relationship_type.to_string(),
        relationship_strength: class.relationship_strength.to_string(),
    }
}

fn shape_index(map: &serde_json::Map<String, Value>) -> TableIndex {
    TableIndex {
        name: get_str(map, "index_name"),
        column_name: get_str(map, "column_name"),
        non_unique: get_flag(map, "non_unique"),
        index_type: get_str(map, "index_type"),
        cardinality: get_opt_i64(map, "cardinality"),
    }
}

#[cfg(test)]
mod tests;
