// =====================================================
// MySQL SPECIFIC DATABASE OPERATIONS
// =====================================================

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow, MySqlSslMode};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, MySql, Row};

use crate::catalog::CatalogQuery;
use crate::db_types::{ConnectionConfig, QueryResult};
use crate::error::{DbError, DbResult};

/// Opens a dedicated connection for one operation. No pooling: the caller
/// closes it before returning.
pub async fn connect(config: &ConnectionConfig) -> DbResult<MySqlConnection> {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password);

    if let Some(db) = &config.database {
        if !db.is_empty() {
            options = options.database(db);
        }
    }

    if let Some(ssl) = &config.ssl_mode {
        options = match ssl.as_str() {
            "disable" | "disabled" => options.ssl_mode(MySqlSslMode::Disabled),
            "prefer" | "preferred" => options.ssl_mode(MySqlSslMode::Preferred),
            "require" | "required" => options.ssl_mode(MySqlSslMode::Required),
            _ => options,
        };
    }

    options = options.log_statements(log::LevelFilter::Debug).to_owned();

    options.connect().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("os error 111") {
            return DbError::connection(format!(
                "connection refused: check that MySQL is running on {}:{}",
                config.host, config.port
            ));
        }
        if err_msg.contains("timed out") {
            return DbError::connection(format!(
                "connection timed out: {}:{} did not respond",
                config.host, config.port
            ));
        }
        DbError::connection(format!("connection failed: {}", err_msg))
    })
}

pub async fn close(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        log::warn!("error closing MySQL connection: {}", e);
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, sqlx::mysql::MySqlArguments>,
    value: &'q serde_json::Value,
) -> Query<'q, MySql, sqlx::mysql::MySqlArguments> {
    match value {
        serde_json::Value::Null => query.bind(None::<String>),
        serde_json::Value::Bool(b) => query.bind(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}

fn decode_cell(row: &MySqlRow, index: usize) -> serde_json::Value {
    row.try_get_unchecked::<i64, _>(index)
        .map(|v| serde_json::json!(v))
        .or_else(|_| row.try_get_unchecked::<i32, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<i16, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<i8, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<u64, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<u32, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<u16, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<u8, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<f64, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<f32, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<bool, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| row.try_get_unchecked::<String, _>(index).map(|v| serde_json::json!(v)))
        .or_else(|_| {
            row.try_get_unchecked::<Vec<u8>, _>(index)
                .map(|bytes| serde_json::json!(String::from_utf8_lossy(&bytes).to_string()))
        })
        .unwrap_or(serde_json::Value::Null)
}

/// Runs a read query and decodes every cell into a JSON value grid.
pub async fn fetch_grid(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[serde_json::Value],
) -> DbResult<QueryResult> {
    let mut query = sqlx::query(sql);
    for value in params {
        query = bind_value(query, value);
    }

    let rows = query
        .fetch_all(conn)
        .await
        .map_err(|e| DbError::query(e.to_string(), sql, params.to_vec()))?;

    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let data = rows
        .iter()
        .map(|row| (0..row.columns().len()).map(|i| decode_cell(row, i)).collect())
        .collect();

    Ok(QueryResult {
        columns,
        rows: data,
    })
}

/// Runs a catalog query and keys each row by column name for shaping.
pub async fn fetch_maps(
    conn: &mut MySqlConnection,
    catalog: &CatalogQuery,
) -> DbResult<Vec<serde_json::Map<String, serde_json::Value>>> {
    let mut query = sqlx::query(&catalog.sql);
    for value in &catalog.params {
        query = query.bind(value.as_str());
    }

    let rows = query.fetch_all(conn).await.map_err(|e| {
        DbError::query(
            e.to_string(),
            &catalog.sql,
            catalog.params.iter().map(|p| serde_json::json!(p)).collect(),
        )
    })?;

    Ok(rows
        .iter()
        .map(|row| {
            row.columns()
                .iter()
                .enumerate()
                .map(|(i, c)| (c.name().to_string(), decode_cell(row, i)))
                .collect()
        })
        .collect())
}

/// Issues `EXPLAIN FORMAT=JSON`. The JSON arrives as a single text column; if
/// it does not parse, the raw text is surfaced instead of being dropped.
pub async fn fetch_execution_plan(
    conn: &mut MySqlConnection,
    sql: &str,
) -> DbResult<serde_json::Value> {
    let explain_sql = format!("EXPLAIN FORMAT=JSON {}", sql);
    let row = sqlx::query(&explain_sql)
        .fetch_optional(conn)
        .await
        .map_err(|e| DbError::query(e.to_string(), &explain_sql, vec![]))?;

    let row = match row {
        Some(r) => r,
        None => return Err(DbError::query("no execution plan returned", explain_sql, vec![])),
    };

    let raw: String = row.try_get::<String, _>(0).unwrap_or_else(|_| {
        row.try_get::<Vec<u8>, _>(0)
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
            .unwrap_or_default()
    });

    Ok(serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw)))
}
