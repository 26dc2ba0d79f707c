//! Database executor port.
//!
//! Abstraction for SQL execution so repositories and application code do
//! not depend on a concrete driver (sqlx/Postgres). Implementations live
//! in infrastructure and are injected via DI. Repository SQL uses
//! positional `?` placeholders uniformly; the adapter implementation
//! translates them to the driver's native style.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Parameter for prepared statement binding, driver-agnostic.
#[derive(Debug, Clone)]
pub enum SqlParam {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Json(serde_json::Value),
    Null,
}

/// Abstraction for a single query result row.
///
/// Implementations wrap driver-specific rows (e.g. `sqlx::postgres::PgRow`)
/// and expose values by column name so repository code never depends on
/// the driver.
pub trait SqlRow: Send + Sync {
    fn try_get_string(&self, name: &str) -> Result<Option<String>>;
    fn try_get_i64(&self, name: &str) -> Result<Option<i64>>;
    fn try_get_f64(&self, name: &str) -> Result<Option<f64>>;
    fn try_get_bool(&self, name: &str) -> Result<Option<bool>>;
    fn try_get_json(&self, name: &str) -> Result<Option<serde_json::Value>>;
    fn try_get_timestamp(&self, name: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>>;
}

/// Port for executing SQL against a schema-pinned connection.
///
/// A single borrow from this executor is pinned to one project namespace
/// for its lifetime (see `borrow`); statements issued through the
/// returned handle all see that `search_path`. Repositories must not mix
/// statements from two different borrows and assume they share isolation.
#[async_trait]
pub trait DatabaseExecutor: Send + Sync {
    /// Acquire a connection pinned to `namespace` for the duration of the
    /// returned borrow. The pin is reset on drop.
    async fn borrow(&self, namespace: &str) -> Result<Arc<dyn SchemaPinnedConnection>>;

    /// Acquire a connection pinned to the control namespace (sessions are
    /// not project data).
    async fn borrow_control(&self) -> Result<Arc<dyn SchemaPinnedConnection>>;

    /// Create the namespace (and its tables) if it does not already exist.
    async fn ensure_namespace(&self, namespace: &str) -> Result<()>;

    /// List every project namespace known to the database catalog.
    async fn list_namespaces(&self) -> Result<Vec<String>>;
}

/// A connection whose `search_path` has already been pinned to a single
/// namespace; all statements run through it see only that namespace (plus
/// `public`).
#[async_trait]
pub trait SchemaPinnedConnection: Send + Sync {
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64>;
    async fn query_one(&self, sql: &str, params: &[SqlParam]) -> Result<Option<Arc<dyn SqlRow>>>;
    async fn query_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Arc<dyn SqlRow>>>;
}
