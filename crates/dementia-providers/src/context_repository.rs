//! Postgres-backed [`ContextRepository`], scoped to a single,
//! already-resolved project namespace via schema pinning.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dementia_domain::entities::{ContextArchive, ContextLock, MemoryCategory, MemoryEntry};
use dementia_domain::error::{Error, Result};
use dementia_domain::ports::database::{DatabaseExecutor, SchemaPinnedConnection, SqlParam};
use dementia_domain::ports::embedding::cosine_similarity;
use dementia_domain::ports::repositories::{
    ContextRepository, ContextRepositoryFactory, SearchFilter, SearchHit,
};
use dementia_domain::value_objects::{ContextVersion, SessionId};

use crate::query_helpers;
use crate::row_convert::{row_to_context_archive, row_to_context_lock, row_to_memory_entry};

pub struct PgContextRepositoryFactory {
    executor: Arc<dyn DatabaseExecutor>,
}

impl PgContextRepositoryFactory {
    pub fn new(executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ContextRepositoryFactory for PgContextRepositoryFactory {
    async fn for_project(&self, namespace: &str) -> Result<Arc<dyn ContextRepository>> {
        // Fails fast with `project_unknown` if the namespace has not been
        // created via `ProjectService::create_project`; the borrow itself
        // is dropped immediately, each repository method takes its own.
        self.executor.borrow(namespace).await?;
        Ok(Arc::new(PgContextRepository {
            executor: self.executor.clone(),
            namespace: namespace.to_string(),
        }))
    }
}

pub struct PgContextRepository {
    executor: Arc<dyn DatabaseExecutor>,
    namespace: String,
}

impl PgContextRepository {
    async fn conn(&self) -> Result<Arc<dyn SchemaPinnedConnection>> {
        self.executor.borrow(&self.namespace).await
    }
}

#[async_trait]
impl ContextRepository for PgContextRepository {
    async fn latest_version(&self, label: &str) -> Result<Option<ContextVersion>> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "SELECT version_major, version_minor FROM context_locks
                 WHERE label = ? ORDER BY version_major DESC, version_minor DESC LIMIT 1",
                &[SqlParam::String(label.to_string())],
            )
            .await?;
        Ok(match row {
            Some(row) => {
                let major = row.try_get_i64("version_major")?.unwrap_or(0) as u32;
                let minor = row.try_get_i64("version_minor")?.unwrap_or(0) as u32;
                Some(ContextVersion::new(major, minor))
            }
            None => None,
        })
    }

    async fn insert(&self, lock: &ContextLock) -> Result<ContextLock> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO context_locks
                    (session_id, label, version_major, version_minor, content, content_hash,
                     preview, key_concepts, priority, metadata, locked_at, last_accessed,
                     access_count, embedding_vector)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?::timestamptz, ?::timestamptz, ?, ?)
                 RETURNING *",
                &[
                    SqlParam::String(lock.session_id.as_str().to_string()),
                    SqlParam::String(lock.label.clone()),
                    SqlParam::I64(lock.version.major() as i64),
                    SqlParam::I64(lock.version.minor() as i64),
                    SqlParam::String(lock.content.clone()),
                    SqlParam::String(lock.content_hash.clone()),
                    SqlParam::String(lock.preview.clone()),
                    SqlParam::Json(serde_json::to_value(&lock.key_concepts)?),
                    SqlParam::String(lock.priority.as_str().to_string()),
                    SqlParam::Json(serde_json::to_value(&lock.metadata)?),
                    SqlParam::String(lock.locked_at.to_rfc3339()),
                    SqlParam::String(lock.last_accessed.to_rfc3339()),
                    SqlParam::I64(lock.access_count),
                    match &lock.embedding_vector {
                        Some(v) => SqlParam::Json(serde_json::to_value(v)?),
                        None => SqlParam::Null,
                    },
                ],
            )
            .await?
            .ok_or_else(|| Error::internal("insert into context_locks did not return a row"))?;
        row_to_context_lock(row.as_ref())
    }

    async fn find(&self, label: &str, version: Option<ContextVersion>) -> Result<Option<ContextLock>> {
        let conn = self.conn().await?;
        match version {
            Some(v) => {
                query_helpers::query_one(
                    &conn,
                    "SELECT * FROM context_locks WHERE label = ? AND version_major = ? AND version_minor = ?",
                    &[
                        SqlParam::String(label.to_string()),
                        SqlParam::I64(v.major() as i64),
                        SqlParam::I64(v.minor() as i64),
                    ],
                    row_to_context_lock,
                )
                .await
            }
            None => {
                query_helpers::query_one(
                    &conn,
                    "SELECT * FROM context_locks WHERE label = ?
                     ORDER BY version_major DESC, version_minor DESC LIMIT 1",
                    &[SqlParam::String(label.to_string())],
                    row_to_context_lock,
                )
                .await
            }
        }
    }

    async fn find_all_versions(&self, label: &str) -> Result<Vec<ContextLock>> {
        let conn = self.conn().await?;
        query_helpers::query_all(
            &conn,
            "SELECT * FROM context_locks WHERE label = ? ORDER BY version_major ASC, version_minor ASC",
            &[SqlParam::String(label.to_string())],
            row_to_context_lock,
        )
        .await
    }

    async fn touch_access(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE context_locks SET last_accessed = ?::timestamptz, access_count = access_count + 1 WHERE id = ?",
            &[SqlParam::String(now.to_rfc3339()), SqlParam::I64(id)],
        )
        .await?;
        Ok(())
    }

    async fn set_embedding(&self, id: i64, embedding: &[f32]) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE context_locks SET embedding_vector = ? WHERE id = ?",
            &[SqlParam::Json(serde_json::to_value(embedding)?), SqlParam::I64(id)],
        )
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ContextLock>> {
        let conn = self.conn().await?;
        query_helpers::query_all(
            &conn,
            "SELECT * FROM context_locks ORDER BY label, version_major, version_minor",
            &[],
            row_to_context_lock,
        )
        .await
    }

    /// Keyword fallback: substring match of `query` against `content`,
    /// `preview`, `key_concepts`, `label`, scored by the weighted formula in
    /// [`dementia_domain::utils::keyword_relevance_score`] (exact label
    /// match 1.0, key-concept match 0.7, content 0.5, preview 0.3, summed).
    /// The `ILIKE`/`jsonb` clause below is only a candidate-set narrowing
    /// optimization over the four columns the score itself reads; it must
    /// never be stricter than the Rust-side scoring that follows it.
    async fn search(&self, query: &str, filter: &SearchFilter, limit: usize) -> Result<Vec<SearchHit>> {
        let conn = self.conn().await?;
        let needle = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let mut sql = String::from(
            "SELECT * FROM context_locks
             WHERE (label ILIKE ? OR content ILIKE ? OR preview ILIKE ? OR key_concepts::text ILIKE ?)",
        );
        let mut params = vec![
            SqlParam::String(needle.clone()),
            SqlParam::String(needle.clone()),
            SqlParam::String(needle.clone()),
            SqlParam::String(needle),
        ];

        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            params.push(SqlParam::String(priority.as_str().to_string()));
        }
        for tag in &filter.tags {
            sql.push_str(" AND metadata->'tags' @> to_jsonb(?::text)");
            params.push(SqlParam::String(tag.clone()));
        }

        let rows = conn.query_all(&sql, &params).await?;
        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let context = row_to_context_lock(row.as_ref())?;
            let score = dementia_domain::utils::keyword_relevance_score(
                &context.label,
                &context.content,
                &context.preview,
                &context.key_concepts,
                query,
            );
            if score > 0.0 {
                hits.push(SearchHit { context, score });
            }
        }
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.context.last_accessed.cmp(&a.context.last_accessed))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn search_by_embedding(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let conn = self.conn().await?;
        let rows = query_helpers::query_all(
            &conn,
            "SELECT * FROM context_locks WHERE embedding_vector IS NOT NULL",
            &[],
            row_to_context_lock,
        )
        .await?;

        let mut hits: Vec<SearchHit> = rows
            .into_iter()
            .filter_map(|context| {
                let embedding = context.embedding_vector.clone()?;
                let score = cosine_similarity(query_embedding, &embedding);
                Some(SearchHit { context, score })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn archive(&self, ids: &[i64], reason: &str, now: DateTime<Utc>) -> Result<Vec<ContextArchive>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn().await?;
        let placeholders: Vec<&str> = ids.iter().map(|_| "?").collect();
        let sql = format!(
            "DELETE FROM context_locks WHERE id IN ({})
             RETURNING id, session_id, label, version_major, version_minor, content, content_hash,
                       preview, key_concepts, priority, metadata, locked_at, last_accessed, access_count,
                       embedding_vector",
            placeholders.join(",")
        );
        let params: Vec<SqlParam> = ids.iter().map(|id| SqlParam::I64(*id)).collect();
        let deleted = conn.query_all(&sql, &params).await?;

        let mut archived = Vec::with_capacity(deleted.len());
        for row in &deleted {
            let lock = row_to_context_lock(row.as_ref())?;
            let archive_row = conn
                .query_one(
                    "INSERT INTO context_archives
                        (original_id, session_id, label, version_major, version_minor, content,
                         content_hash, preview, key_concepts, priority, metadata, locked_at,
                         last_accessed, access_count, embedding_vector, deleted_at, delete_reason)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?::timestamptz, ?::timestamptz, ?, ?, ?::timestamptz, ?)
                     RETURNING *",
                    &[
                        SqlParam::I64(lock.id),
                        SqlParam::String(lock.session_id.as_str().to_string()),
                        SqlParam::String(lock.label.clone()),
                        SqlParam::I64(lock.version.major() as i64),
                        SqlParam::I64(lock.version.minor() as i64),
                        SqlParam::String(lock.content.clone()),
                        SqlParam::String(lock.content_hash.clone()),
                        SqlParam::String(lock.preview.clone()),
                        SqlParam::Json(serde_json::to_value(&lock.key_concepts)?),
                        SqlParam::String(lock.priority.as_str().to_string()),
                        SqlParam::Json(serde_json::to_value(&lock.metadata)?),
                        SqlParam::String(lock.locked_at.to_rfc3339()),
                        SqlParam::String(lock.last_accessed.to_rfc3339()),
                        SqlParam::I64(lock.access_count),
                        match &lock.embedding_vector {
                            Some(v) => SqlParam::Json(serde_json::to_value(v)?),
                            None => SqlParam::Null,
                        },
                        SqlParam::String(now.to_rfc3339()),
                        SqlParam::String(reason.to_string()),
                    ],
                )
                .await?
                .ok_or_else(|| Error::internal("insert into context_archives did not return a row"))?;
            archived.push(row_to_context_archive(archive_row.as_ref())?);
        }
        Ok(archived)
    }

    async fn list_archived(&self) -> Result<Vec<ContextArchive>> {
        let conn = self.conn().await?;
        query_helpers::query_all(
            &conn,
            "SELECT * FROM context_archives ORDER BY deleted_at DESC",
            &[],
            row_to_context_archive,
        )
        .await
    }

    async fn insert_memory_entry(
        &self,
        session_id: &SessionId,
        category: MemoryCategory,
        content: serde_json::Value,
        metadata: serde_json::Map<String, serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<MemoryEntry> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO memory_entries (session_id, category, content, metadata, timestamp)
                 VALUES (?, ?, ?, ?, ?::timestamptz)
                 RETURNING *",
                &[
                    SqlParam::String(session_id.as_str().to_string()),
                    SqlParam::String(category.as_str().to_string()),
                    SqlParam::Json(content),
                    SqlParam::Json(serde_json::Value::Object(metadata)),
                    SqlParam::String(now.to_rfc3339()),
                ],
            )
            .await?
            .ok_or_else(|| Error::internal("insert into memory_entries did not return a row"))?;
        row_to_memory_entry(row.as_ref())
    }

    async fn latest_memory_entry(&self, category: MemoryCategory) -> Result<Option<MemoryEntry>> {
        let conn = self.conn().await?;
        query_helpers::query_one(
            &conn,
            "SELECT * FROM memory_entries WHERE category = ? ORDER BY timestamp DESC LIMIT 1",
            &[SqlParam::String(category.as_str().to_string())],
            row_to_memory_entry,
        )
        .await
    }
}
