// =====================================================
// CONNECTION REGISTRY AND ACQUISITION
// =====================================================
//
// Aliases bind a user-chosen name to a parsed connection URL. The registry is
// the only shared state in the crate; operations read it and then open their
// own short-lived connection.

use std::collections::HashMap;
use tokio::sync::RwLock;
use url::Url;

use crate::catalog::{detect_dialect, CatalogQuery};
use crate::db_types::{ConnectionConfig, DatabaseType, QueryResult};
use crate::error::{DbError, DbResult};
use crate::sanitize::{sanitize_input, validate_connection_url};
use crate::{mysql, postgres};

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// Parses and validates a connection URL into connection parameters. The
/// dialect is fixed here and never changes afterwards.
pub fn parse_connection_url(raw_url: &str) -> DbResult<ConnectionConfig> {
    let url = sanitize_input(raw_url);
    let check = validate_connection_url(&url);
    if !check.is_valid {
        return Err(DbError::validation(
            check.error.unwrap_or_else(|| "invalid connection URL".to_string()),
        ));
    }

    let db_type = detect_dialect(&url)?;
    // Already validated above; parse cannot fail here.
    let parsed = Url::parse(&url).map_err(|e| DbError::validation(e.to_string()))?;

    let default_port = match db_type {
        DatabaseType::MySQL => DEFAULT_MYSQL_PORT,
        DatabaseType::PostgreSQL => DEFAULT_POSTGRES_PORT,
    };

    let database = parsed
        .path_segments()
        .and_then(|mut segments| segments.next())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let mut ssl_mode = None;
    let mut schema = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "sslmode" | "ssl-mode" => ssl_mode = Some(value.to_string()),
            "schema" | "currentSchema" => schema = Some(value.to_string()),
            _ => {}
        }
    }

    Ok(ConnectionConfig {
        db_type,
        host: parsed.host_str().unwrap_or_default().to_string(),
        port: parsed.port().unwrap_or(default_port),
        username: parsed.username().to_string(),
        password: parsed.password().unwrap_or_default().to_string(),
        database,
        ssl_mode,
        schema,
    })
}

/// Alias -> connection-parameter registry. Aliases are immutable once
/// registered; overwriting requires an explicit remove first.
#[derive(Default)]
pub struct ConnectionRegistry {
    aliases: RwLock<HashMap<String, ConnectionConfig>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, alias: &str, url: &str) -> DbResult<()> {
        let alias = sanitize_input(alias);
        if alias.is_empty() {
            return Err(DbError::validation("alias must not be empty"));
        }
        let config = parse_connection_url(url)?;

        let mut aliases = self.aliases.write().await;
        if aliases.contains_key(&alias) {
            return Err(DbError::validation(format!(
                "alias '{}' is already registered; remove it first",
                alias
            )));
        }
        log::debug!("registering alias '{}' ({})", alias, config.db_type);
        aliases.insert(alias, config);
        Ok(())
    }

    pub async fn remove(&self, alias: &str) -> DbResult<()> {
        let mut aliases = self.aliases.write().await;
        match aliases.remove(alias) {
            Some(_) => Ok(()),
            None => Err(DbError::validation(format!("unknown alias '{}'", alias))),
        }
    }

    pub async fn get(&self, alias: &str) -> DbResult<ConnectionConfig> {
        let aliases = self.aliases.read().await;
        aliases
            .get(alias)
            .cloned()
            .ok_or_else(|| DbError::validation(format!("unknown alias '{}'", alias)))
    }

    pub async fn aliases(&self) -> Vec<String> {
        let mut names: Vec<String> = self.aliases.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

/// One live connection, dispatched by dialect at the few points where the
/// wire behavior differs.
pub enum DbConnection {
    MySQL(sqlx::mysql::MySqlConnection),
    PostgreSQL(sqlx::postgres::PgConnection),
}

impl DbConnection {
    pub async fn acquire(config: &ConnectionConfig) -> DbResult<Self> {
        match config.db_type {
            DatabaseType::MySQL => Ok(DbConnection::MySQL(mysql::connect(config).await?)),
            DatabaseType::PostgreSQL => {
                Ok(DbConnection::PostgreSQL(postgres::connect(config).await?))
            }
        }
    }

    pub async fn fetch_grid(
        &mut self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> DbResult<QueryResult> {
        match self {
            DbConnection::MySQL(conn) => mysql::fetch_grid(conn, sql, params).await,
            DbConnection::PostgreSQL(conn) => postgres::fetch_grid(conn, sql, params).await,
        }
    }

    pub async fn fetch_maps(
        &mut self,
        catalog: &CatalogQuery,
    ) -> DbResult<Vec<serde_json::Map<String, serde_json::Value>>> {
        match self {
            DbConnection::MySQL(conn) => mysql::fetch_maps(conn, catalog).await,
            DbConnection::PostgreSQL(conn) => postgres::fetch_maps(conn, catalog).await,
        }
    }

    pub async fn fetch_execution_plan(&mut self, sql: &str) -> DbResult<serde_json::Value> {
        match self {
            DbConnection::MySQL(conn) => mysql::fetch_execution_plan(conn, sql).await,
            DbConnection::PostgreSQL(conn) => postgres::fetch_execution_plan(conn, sql).await,
        }
    }

    /// Cheap handshake check used by `test_connection`.
    pub async fn handshake(&mut self) -> DbResult<()> {
        self.fetch_grid("SELECT 1", &[]).await.map(|_| ())
    }

    /// Best-effort close; failures are logged, never raised.
    pub async fn release(self) {
        match self {
            DbConnection::MySQL(conn) => mysql::close(conn).await,
            DbConnection::PostgreSQL(conn) => postgres::close(conn).await,
        }
    }
}

#[cfg(test)]
mod tests;
