//! Repository ports consumed by the application layer's use cases.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{ContextArchive, ContextLock, MemoryCategory, MemoryEntry, Session, SessionSummary};
use crate::error::Result;
use crate::value_objects::{ContextVersion, SessionId};

/// Lifecycle operations for [`Session`] rows, living in the control
/// namespace (sessions route *to* a project; they are not project data).
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Idempotent on `id`: if a row already exists it is returned
    /// unchanged rather than re-created.
    async fn create(&self, id: &SessionId, project_name: &str) -> Result<Session>;

    async fn get(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Single source of truth for project switching. Fails with
    /// `session_not_found`-shaped `Error::NotFound` if `id` is absent.
    async fn update_project(&self, id: &SessionId, project_name: &str) -> Result<bool>;

    async fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Result<()>;

    async fn update_summary(&self, id: &SessionId, summary: &SessionSummary) -> Result<()>;

    /// Remove (or mark) sessions idle beyond `idle_cutoff`; returns the
    /// ids affected.
    async fn cleanup_expired(&self, idle_cutoff: chrono::Duration, now: DateTime<Utc>) -> Result<Vec<SessionId>>;
}

/// A registered project: its sanitized namespace-safe name alongside the
/// original display name the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub sanitized_name: String,
    pub display_name: String,
}

/// Tracks the mapping from sanitized project names back to their original
/// display names, living in the control namespace. This is what makes
/// sanitization-collision detection possible: two differently-named
/// projects ("Alpha One" and "alpha-one") sanitize to the same string, and
/// `create_project` must be able to tell them apart.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Register a new project. Fails if `sanitized_name` is already
    /// registered under a different `display_name`.
    async fn register(&self, sanitized_name: &str, display_name: &str) -> Result<ProjectRecord>;

    async fn find_by_sanitized(&self, sanitized_name: &str) -> Result<Option<ProjectRecord>>;

    async fn list(&self) -> Result<Vec<ProjectRecord>>;
}

/// A ranked keyword search hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub context: ContextLock,
    pub score: f32,
}

/// Filters accepted by [`ContextRepository::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub priority: Option<crate::value_objects::Priority>,
    pub tags: Vec<String>,
}

/// Repository for `context_locks`, `context_archives`, and
/// `memory_entries` within a single, already-resolved project namespace.
/// Callers obtain an instance scoped to the namespace (see
/// `dementia-providers`); no method here takes a project argument because
/// the scoping has already happened at construction/borrow time.
#[async_trait]
pub trait ContextRepository: Send + Sync {
    /// The highest existing version for `label`, if any.
    async fn latest_version(&self, label: &str) -> Result<Option<ContextVersion>>;

    /// Insert a new row. Callers must have already resolved the version
    /// to avoid a collision; on a uniqueness violation the caller should
    /// retry with the next minor.
    async fn insert(&self, lock: &ContextLock) -> Result<ContextLock>;

    async fn find(&self, label: &str, version: Option<ContextVersion>) -> Result<Option<ContextLock>>;

    /// All versions stored for `label`, ordered ascending.
    async fn find_all_versions(&self, label: &str) -> Result<Vec<ContextLock>>;

    async fn touch_access(&self, id: i64, now: DateTime<Utc>) -> Result<()>;

    async fn set_embedding(&self, id: i64, embedding: &[f32]) -> Result<()>;

    /// All non-archived contexts in the namespace.
    async fn list_all(&self) -> Result<Vec<ContextLock>>;

    async fn search(&self, query: &str, filter: &SearchFilter, limit: usize) -> Result<Vec<SearchHit>>;

    /// Top-k contexts by embedding distance to `query_embedding`.
    async fn search_by_embedding(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Move the given rows into `context_archives`, removing them from
    /// `context_locks`, returning the archived rows.
    async fn archive(&self, ids: &[i64], reason: &str, now: DateTime<Utc>) -> Result<Vec<ContextArchive>>;

    async fn list_archived(&self) -> Result<Vec<ContextArchive>>;

    async fn insert_memory_entry(
        &self,
        session_id: &SessionId,
        category: MemoryCategory,
        content: serde_json::Value,
        metadata: serde_json::Map<String, serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<MemoryEntry>;

    /// Most recent memory entry of `category`, if any.
    async fn latest_memory_entry(&self, category: MemoryCategory) -> Result<Option<MemoryEntry>>;
}

/// Produces a [`ContextRepository`] scoped to a single, already-resolved
/// project namespace. Each call obtains a fresh schema-pinned borrow (see
/// `ports::database::DatabaseExecutor::borrow`), so callers must not cache
/// the returned repository across operations.
#[async_trait]
pub trait ContextRepositoryFactory: Send + Sync {
    async fn for_project(&self, namespace: &str) -> Result<Arc<dyn ContextRepository>>;
}
