//! Postgres-backed [`DatabaseExecutor`]: pool, placeholder translation, and
//! the schema-pin discipline that is the sole mechanism of project
//! isolation at the SQL layer (spec §4.1).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dementia_domain::error::{Error, Result};
use dementia_domain::ports::database::{DatabaseExecutor, SchemaPinnedConnection, SqlParam, SqlRow};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tokio::sync::Mutex;

/// Namespace sessions live in; they route *to* a project, they are not
/// project data (see SPEC_FULL.md §4.2).
pub const CONTROL_NAMESPACE: &str = "dementia_control";

/// Tables created in every project namespace (and in the control
/// namespace, where only `sessions` is used).
const PROJECT_SCHEMA_TEMPLATE: &str = include_str!("storage/project_schema.sql");
const CONTROL_SCHEMA_TEMPLATE: &str = include_str!("storage/control_schema.sql");

pub struct PgStorageAdapter {
    pool: PgPool,
    statement_timeout_secs: u64,
}

impl PgStorageAdapter {
    pub async fn connect(
        database_url: &str,
        min_connections: u32,
        max_connections: u32,
        statement_timeout_secs: u64,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(60))
            .connect(database_url)
            .await
            .map_err(|err| Error::transient_io_with_source("failed to connect to database", err))?;
        Ok(Self {
            pool,
            statement_timeout_secs,
        })
    }

    async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM pg_catalog.pg_namespace WHERE nspname = $1")
            .bind(namespace)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::query_with_source("failed to check namespace existence", err))?;
        Ok(row.is_some())
    }

    async fn pin(&self, namespace: &str) -> Result<Arc<dyn SchemaPinnedConnection>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|err| Error::transient_io_with_source("failed to acquire a pooled connection", err))?;

        sqlx::query(&format!("SET search_path TO \"{namespace}\", public"))
            .execute(&mut *conn)
            .await
            .map_err(|err| Error::query_with_source(format!("failed to pin search_path to '{namespace}'"), err))?;

        sqlx::query(&format!(
            "SET statement_timeout = {}",
            self.statement_timeout_secs * 1000
        ))
        .execute(&mut *conn)
        .await
        .map_err(|err| Error::query_with_source("failed to set statement_timeout", err))?;

        Ok(Arc::new(PgSchemaPinnedConnection {
            conn: Mutex::new(Some(conn)),
        }))
    }

    /// The underlying pool, for callers that need to run
    /// [`ensure_control_namespace`] against the same connections.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseExecutor for PgStorageAdapter {
    async fn borrow(&self, namespace: &str) -> Result<Arc<dyn SchemaPinnedConnection>> {
        if !self.namespace_exists(namespace).await? {
            return Err(Error::ProjectUnknown {
                name: namespace.to_string(),
            });
        }
        self.pin(namespace).await
    }

    async fn borrow_control(&self) -> Result<Arc<dyn SchemaPinnedConnection>> {
        self.pin(CONTROL_NAMESPACE).await
    }

    async fn ensure_namespace(&self, namespace: &str) -> Result<()> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{namespace}\""))
            .execute(&self.pool)
            .await
            .map_err(|err| Error::query_with_source(format!("failed to create namespace '{namespace}'"), err))?;

        let conn = self.pin(namespace).await?;
        for statement in PROJECT_SCHEMA_TEMPLATE.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            conn.execute(statement, &[]).await?;
        }
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT nspname FROM pg_catalog.pg_namespace WHERE nspname LIKE 'dementia_%' ORDER BY nspname",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::query_with_source("failed to list namespaces", err))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.try_get::<String, _>("nspname").ok())
            .collect())
    }
}

/// Ensure the control namespace and its `sessions` table exist; called once
/// at startup (`dementia migrate`/server boot).
pub async fn ensure_control_namespace(pool: &PgPool) -> Result<()> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{CONTROL_NAMESPACE}\""))
        .execute(pool)
        .await
        .map_err(|err| Error::query_with_source("failed to create control namespace", err))?;

    let mut conn = pool
        .acquire()
        .await
        .map_err(|err| Error::transient_io_with_source("failed to acquire a pooled connection", err))?;
    sqlx::query(&format!("SET search_path TO \"{CONTROL_NAMESPACE}\", public"))
        .execute(&mut *conn)
        .await
        .map_err(|err| Error::query_with_source("failed to pin search_path to control namespace", err))?;

    for statement in CONTROL_SCHEMA_TEMPLATE.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(|err| Error::query_with_source("failed to apply control schema", err))?;
    }
    Ok(())
}

struct PgSchemaPinnedConnection {
    conn: Mutex<Option<sqlx::pool::PoolConnection<Postgres>>>,
}

impl PgSchemaPinnedConnection {
    fn translate(sql: &str) -> Result<String> {
        let has_positional = sql.contains('?');
        let has_dollar = sql.contains('$');
        if has_positional && has_dollar {
            return Err(Error::query("mixed placeholder styles in one statement"));
        }
        if !has_positional {
            return Ok(sql.to_string());
        }
        let mut out = String::with_capacity(sql.len());
        let mut n = 0u32;
        for ch in sql.chars() {
            if ch == '?' {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            } else {
                out.push(ch);
            }
        }
        Ok(out)
    }

    fn bind<'q>(
        mut query: Query<'q, Postgres, PgArguments>,
        params: &'q [SqlParam],
    ) -> Query<'q, Postgres, PgArguments> {
        for param in params {
            query = match param {
                SqlParam::String(s) => query.bind(s),
                SqlParam::I64(i) => query.bind(i),
                SqlParam::F64(f) => query.bind(f),
                SqlParam::Bool(b) => query.bind(b),
                SqlParam::Json(j) => query.bind(j),
                SqlParam::Null => query.bind(Option::<String>::None),
            };
        }
        query
    }
}

#[async_trait]
impl SchemaPinnedConnection for PgSchemaPinnedConnection {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64> {
        let translated = Self::translate(sql)?;
        let mut guard = self.conn.lock().await;
        let conn = guard.as_deref_mut().ok_or_else(|| Error::internal("connection already released"))?;
        let query = Self::bind(sqlx::query(&translated), params);
        let result = query
            .execute(conn)
            .await
            .map_err(|err| Error::query_with_source(format!("statement failed: {translated}"), err))?;
        Ok(result.rows_affected())
    }

    async fn query_one(&self, sql: &str, params: &[SqlParam]) -> Result<Option<Arc<dyn SqlRow>>> {
        let translated = Self::translate(sql)?;
        let mut guard = self.conn.lock().await;
        let conn = guard.as_deref_mut().ok_or_else(|| Error::internal("connection already released"))?;
        let query = Self::bind(sqlx::query(&translated), params);
        let row = query
            .fetch_optional(conn)
            .await
            .map_err(|err| Error::query_with_source(format!("statement failed: {translated}"), err))?;
        Ok(row.map(|r| Arc::new(PgSqlRow(r)) as Arc<dyn SqlRow>))
    }

    async fn query_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Arc<dyn SqlRow>>> {
        let translated = Self::translate(sql)?;
        let mut guard = self.conn.lock().await;
        let conn = guard.as_deref_mut().ok_or_else(|| Error::internal("connection already released"))?;
        let query = Self::bind(sqlx::query(&translated), params);
        let rows = query
            .fetch_all(conn)
            .await
            .map_err(|err| Error::query_with_source(format!("statement failed: {translated}"), err))?;
        Ok(rows.into_iter().map(|r| Arc::new(PgSqlRow(r)) as Arc<dyn SqlRow>).collect())
    }
}

impl Drop for PgSchemaPinnedConnection {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.conn.try_lock() {
            if let Some(mut conn) = guard.take() {
                tokio::spawn(async move {
                    let _ = sqlx::query("SET search_path TO public").execute(&mut *conn).await;
                });
            }
        }
    }
}

struct PgSqlRow(PgRow);

impl SqlRow for PgSqlRow {
    fn try_get_string(&self, name: &str) -> Result<Option<String>> {
        self.0
            .try_get::<Option<String>, _>(name)
            .map_err(|err| Error::query_with_source(format!("column '{name}' is not a string"), err))
    }

    fn try_get_i64(&self, name: &str) -> Result<Option<i64>> {
        self.0
            .try_get::<Option<i64>, _>(name)
            .map_err(|err| Error::query_with_source(format!("column '{name}' is not an i64"), err))
    }

    fn try_get_f64(&self, name: &str) -> Result<Option<f64>> {
        self.0
            .try_get::<Option<f64>, _>(name)
            .map_err(|err| Error::query_with_source(format!("column '{name}' is not an f64"), err))
    }

    fn try_get_bool(&self, name: &str) -> Result<Option<bool>> {
        self.0
            .try_get::<Option<bool>, _>(name)
            .map_err(|err| Error::query_with_source(format!("column '{name}' is not a bool"), err))
    }

    fn try_get_json(&self, name: &str) -> Result<Option<serde_json::Value>> {
        self.0
            .try_get::<Option<serde_json::Value>, _>(name)
            .map_err(|err| Error::query_with_source(format!("column '{name}' is not JSON"), err))
    }

    fn try_get_timestamp(&self, name: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        self.0
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)
            .map_err(|err| Error::query_with_source(format!("column '{name}' is not a timestamp"), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_positional_placeholders() {
        let translated = PgSchemaPinnedConnection::translate("SELECT * FROM t WHERE a = ? AND b = ?").unwrap();
        assert_eq!(translated, "SELECT * FROM t WHERE a = $1 AND b = $2");
    }

    #[test]
    fn rejects_mixed_placeholder_styles() {
        let err = PgSchemaPinnedConnection::translate("SELECT * FROM t WHERE a = ? AND b = $1").unwrap_err();
        assert_eq!(err.kind(), "query_error");
    }

    #[test]
    fn leaves_dollar_only_statements_untouched() {
        let translated = PgSchemaPinnedConnection::translate("SELECT * FROM t WHERE a = $1").unwrap();
        assert_eq!(translated, "SELECT * FROM t WHERE a = $1");
    }
}
