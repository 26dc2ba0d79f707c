//! Memory Core: the heart of the engine. Context locking/recall/search,
//! archival, and handover packaging — all scoped to an already-resolved
//! project namespace (resolution itself lives in [`super::project_service`]).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dementia_domain::entities::{
    ContextArchive, ContextLock, ContextMetadata, MemoryCategory, Session, SessionSummary,
};
use dementia_domain::error::{Error, Result};
use dementia_domain::ports::embedding::EmbeddingProvider;
use dementia_domain::ports::repositories::{
    ContextRepository, ContextRepositoryFactory, SearchFilter, SearchHit, SessionRepository,
};
use dementia_domain::utils::{content_hash, extract_key_concepts, truncate_preview};
use dementia_domain::value_objects::{ContextVersion, Priority, SessionId};

/// Upper bound on version-collision retries before surfacing
/// `version_collision` to the caller (spec §7).
const MAX_VERSION_RETRIES: u32 = 5;

/// Contexts not accessed within this many days are flagged as stale by
/// `context_dashboard`.
const STALENESS_DAYS: i64 = 30;

/// Default limit for `search_contexts`/`semantic_search_contexts` when the
/// caller does not specify one.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Arguments accepted by [`MemoryCoreService::lock_context`].
#[derive(Debug, Clone, Default)]
pub struct LockRequest {
    pub topic: String,
    pub content: String,
    pub tags: Vec<String>,
    pub priority: Option<Priority>,
    pub version_base: Option<ContextVersion>,
}

/// Result of [`MemoryCoreService::lock_context`].
#[derive(Debug, Clone, PartialEq)]
pub struct LockOutcome {
    pub label: String,
    pub version: ContextVersion,
    pub hash: String,
    pub preview: String,
    pub priority: Priority,
    pub embedded: bool,
    pub branched_from: Option<ContextVersion>,
}

/// Result of [`MemoryCoreService::recall_context`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecallOutcome {
    pub content: String,
    pub version: ContextVersion,
    pub preview: String,
    pub metadata: ContextMetadata,
}

/// Result of [`MemoryCoreService::unlock_context`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnlockOutcome {
    pub archived: usize,
    pub affected: Vec<(String, ContextVersion)>,
}

/// Result of a search operation, with an optional degradation warning
/// (set when `semantic_search_contexts` falls back to keyword search).
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub warning: Option<String>,
}

/// Result of [`MemoryCoreService::explore_context_tree`].
#[derive(Debug, Clone)]
pub enum ContextTree {
    Flat(Vec<ContextLock>),
    Grouped(BTreeMap<String, Vec<ContextLock>>),
}

/// Result of [`MemoryCoreService::context_dashboard`].
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub counts_by_priority: BTreeMap<String, usize>,
    pub total_contexts: usize,
    pub top_accessed: Vec<(String, i64)>,
    pub least_accessed: Vec<(String, i64)>,
    pub never_accessed: Vec<String>,
    pub stale_warnings: Vec<String>,
}

/// Result of [`MemoryCoreService::get_last_handover`] / `wake_up`.
#[derive(Debug, Clone)]
pub enum Handover {
    Current {
        hours_ago: f64,
        summary: SessionSummary,
    },
    Packaged {
        content: serde_json::Value,
    },
}

/// Result of [`MemoryCoreService::wake_up`].
#[derive(Debug, Clone)]
pub struct WakeOutcome {
    pub handover: Option<Handover>,
    pub session_summary: SessionSummary,
}

/// Versioned export envelope for `export_project`/`import_project`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DementiaExport {
    pub schema_version: u32,
    pub project: String,
    pub contexts: Vec<ContextLock>,
    pub exported_at: DateTime<Utc>,
}

const EXPORT_SCHEMA_VERSION: u32 = 1;

/// Orchestrates every Memory Core operation named in spec §4.4.
pub struct MemoryCoreService {
    contexts: Arc<dyn ContextRepositoryFactory>,
    sessions: Arc<dyn SessionRepository>,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    idle_cutoff: chrono::Duration,
}

impl MemoryCoreService {
    pub fn new(
        contexts: Arc<dyn ContextRepositoryFactory>,
        sessions: Arc<dyn SessionRepository>,
        embeddings: Option<Arc<dyn EmbeddingProvider>>,
        idle_cutoff: chrono::Duration,
    ) -> Self {
        Self {
            contexts,
            sessions,
            embeddings,
            idle_cutoff,
        }
    }

    pub async fn lock_context(
        &self,
        namespace: &str,
        session_id: &SessionId,
        request: LockRequest,
        now: DateTime<Utc>,
    ) -> Result<LockOutcome> {
        let priority = match request.priority {
            Some(p) => p,
            None => Priority::detect(&request.content),
        };
        let hash = content_hash(&request.content);
        let preview = truncate_preview(&request.content);
        let key_concepts = extract_key_concepts(&request.content, &request.tags);

        let repo = self.contexts.for_project(namespace).await?;
        let latest = repo.latest_version(&request.topic).await?;

        let (mut candidate, branched_from) = match request.version_base {
            Some(base) => (base.next_minor(), Some(base)),
            None => match latest {
                Some(v) => (v.next_minor(), None),
                None => (ContextVersion::FIRST, None),
            },
        };

        let mut metadata = ContextMetadata {
            tags: request.tags.clone(),
            keywords: key_concepts.clone(),
            branched_from: branched_from.map(|b| b.to_string()),
            extra: serde_json::Map::new(),
        };

        let mut attempts = 0;
        loop {
            if repo.find(&request.topic, Some(candidate)).await?.is_some() {
                attempts += 1;
                if attempts >= MAX_VERSION_RETRIES {
                    return Err(Error::VersionCollision {
                        label: request.topic.clone(),
                        attempts,
                    });
                }
                candidate = candidate.next_minor();
                continue;
            }

            let lock = ContextLock {
                id: 0,
                session_id: session_id.clone(),
                label: request.topic.clone(),
                version: candidate,
                content: request.content.clone(),
                content_hash: hash.clone(),
                preview: preview.clone(),
                key_concepts: key_concepts.clone(),
                priority,
                metadata: metadata.clone(),
                locked_at: now,
                last_accessed: now,
                access_count: 0,
                embedding_vector: None,
            };

            match repo.insert(&lock).await {
                Ok(inserted) => {
                    let embedded = self.try_embed(&repo, inserted.id, &preview).await;
                    repo.insert_memory_entry(
                        session_id,
                        MemoryCategory::Progress,
                        serde_json::json!({"action": "lock_context", "label": request.topic, "version": candidate.to_string()}),
                        serde_json::Map::new(),
                        now,
                    )
                    .await?;
                    return Ok(LockOutcome {
                        label: request.topic,
                        version: candidate,
                        hash,
                        preview,
                        priority,
                        embedded,
                        branched_from,
                    });
                }
                Err(_) => {
                    attempts += 1;
                    if attempts >= MAX_VERSION_RETRIES {
                        return Err(Error::VersionCollision {
                            label: request.topic.clone(),
                            attempts,
                        });
                    }
                    candidate = candidate.next_minor();
                    metadata.branched_from = branched_from.map(|b| b.to_string());
                }
            }
        }
    }

    async fn try_embed(&self, repo: &Arc<dyn ContextRepository>, id: i64, preview: &str) -> bool {
        let Some(provider) = &self.embeddings else {
            return false;
        };
        match provider.embed(preview).await {
            Ok(vector) => match repo.set_embedding(id, &vector).await {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to persist embedding after lock_context");
                    false
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "embedding provider unavailable during lock_context");
                false
            }
        }
    }

    pub async fn recall_context(
        &self,
        namespace: &str,
        topic: &str,
        version: Option<ContextVersion>,
        now: DateTime<Utc>,
    ) -> Result<RecallOutcome> {
        let repo = self.contexts.for_project(namespace).await?;
        let found = repo
            .find(topic, version)
            .await?
            .ok_or_else(|| Error::not_found(format!("context '{topic}'")))?;
        repo.touch_access(found.id, now).await?;
        Ok(RecallOutcome {
            content: found.content,
            version: found.version,
            preview: found.preview,
            metadata: found.metadata,
        })
    }

    pub async fn unlock_context(
        &self,
        namespace: &str,
        topic: &str,
        version: Option<ContextVersion>,
        force: bool,
        archive: bool,
        now: DateTime<Utc>,
    ) -> Result<UnlockOutcome> {
        let repo = self.contexts.for_project(namespace).await?;
        let rows = match version {
            Some(v) => repo.find(topic, Some(v)).await?.into_iter().collect(),
            None => repo.find_all_versions(topic).await?,
        };
        if rows.is_empty() {
            return Err(Error::not_found(format!("context '{topic}'")));
        }
        if !force && rows.iter().any(|r| r.priority == Priority::AlwaysCheck) {
            return Err(Error::confirmation_required(format!(
                "'{topic}' has an always_check context; pass force=true to unlock"
            )));
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let affected: Vec<(String, ContextVersion)> =
            rows.iter().map(|r| (r.label.clone(), r.version)).collect();

        let reason = if archive { "unlocked" } else { "unlocked (not archived)" };
        let archived_rows: Vec<ContextArchive> = repo.archive(&ids, reason, now).await?;

        Ok(UnlockOutcome {
            archived: archived_rows.len(),
            affected,
        })
    }

    pub async fn search_contexts(
        &self,
        namespace: &str,
        query: &str,
        filter: SearchFilter,
        limit: usize,
    ) -> Result<SearchOutcome> {
        let repo = self.contexts.for_project(namespace).await?;
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };
        let hits = repo.search(query, &filter, limit).await?;
        Ok(SearchOutcome { hits, warning: None })
    }

    pub async fn semantic_search_contexts(
        &self,
        namespace: &str,
        query: &str,
        limit: usize,
    ) -> Result<SearchOutcome> {
        let repo = self.contexts.for_project(namespace).await?;
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };

        let Some(provider) = &self.embeddings else {
            let hits = repo.search(query, &SearchFilter::default(), limit).await?;
            return Ok(SearchOutcome {
                hits,
                warning: Some("embedding provider not configured; degraded to keyword search".into()),
            });
        };

        match provider.embed(query).await {
            Ok(embedding) => {
                let hits = repo.search_by_embedding(&embedding, limit).await?;
                Ok(SearchOutcome { hits, warning: None })
            }
            Err(err) => {
                tracing::warn!(error = %err, "embedding provider unavailable; degrading to keyword search");
                let hits = repo.search(query, &SearchFilter::default(), limit).await?;
                Ok(SearchOutcome {
                    hits,
                    warning: Some(format!("embedding service unavailable ({err}); degraded to keyword search")),
                })
            }
        }
    }

    pub async fn check_contexts(&self, namespace: &str, text: &str) -> Result<Vec<ContextLock>> {
        let repo = self.contexts.for_project(namespace).await?;
        let prominent = extract_key_concepts(text, &[]);
        let all = repo.list_all().await?;
        Ok(all
            .into_iter()
            .filter(|c| {
                c.priority == Priority::AlwaysCheck
                    || c.key_concepts.iter().any(|k| prominent.contains(k))
            })
            .collect())
    }

    pub async fn explore_context_tree(&self, namespace: &str, flat: bool) -> Result<ContextTree> {
        let repo = self.contexts.for_project(namespace).await?;
        let all = repo.list_all().await?;
        if flat {
            return Ok(ContextTree::Flat(all));
        }
        let mut grouped: BTreeMap<String, Vec<ContextLock>> = BTreeMap::new();
        for ctx in all {
            grouped.entry(ctx.label.clone()).or_default().push(ctx);
        }
        Ok(ContextTree::Grouped(grouped))
    }

    pub async fn context_dashboard(&self, namespace: &str, now: DateTime<Utc>) -> Result<Dashboard> {
        let repo = self.contexts.for_project(namespace).await?;
        let all = repo.list_all().await?;

        let mut counts_by_priority: BTreeMap<String, usize> = BTreeMap::new();
        let mut never_accessed = Vec::new();
        let mut stale_warnings = Vec::new();
        let mut by_access: Vec<(String, i64)> = Vec::new();

        for ctx in &all {
            *counts_by_priority.entry(ctx.priority.to_string()).or_insert(0) += 1;
            by_access.push((ctx.label.clone(), ctx.access_count));
            if ctx.access_count == 0 {
                never_accessed.push(ctx.label.clone());
            }
            if (now - ctx.last_accessed).num_days() > STALENESS_DAYS {
                stale_warnings.push(format!(
                    "'{}' not accessed in over {STALENESS_DAYS} days",
                    ctx.label
                ));
            }
        }

        by_access.sort_by(|a, b| b.1.cmp(&a.1));
        let top_accessed = by_access.iter().take(5).cloned().collect();
        let mut least = by_access.clone();
        least.sort_by(|a, b| a.1.cmp(&b.1));
        let least_accessed = least.into_iter().take(5).collect();

        Ok(Dashboard {
            counts_by_priority,
            total_contexts: all.len(),
            top_accessed,
            least_accessed,
            never_accessed,
            stale_warnings,
        })
    }

    pub async fn get_last_handover(
        &self,
        namespace: &str,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Handover> {
        if session.is_current(now, self.idle_cutoff) {
            let hours_ago = (now - session.last_active).num_seconds() as f64 / 3600.0;
            return Ok(Handover::Current {
                hours_ago,
                summary: session.session_summary.clone(),
            });
        }
        let repo = self.contexts.for_project(namespace).await?;
        let packaged = repo
            .latest_memory_entry(MemoryCategory::Handover)
            .await?
            .ok_or_else(|| Error::not_found("handover"))?;
        Ok(Handover::Packaged {
            content: packaged.content,
        })
    }

    /// Write a structured handover summary as a `MemoryEntry` and update
    /// the session's live summary.
    pub async fn sleep(
        &self,
        namespace: &str,
        session_id: &SessionId,
        summary: SessionSummary,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let repo = self.contexts.for_project(namespace).await?;
        let content = serde_json::to_value(&summary)?;
        repo.insert_memory_entry(session_id, MemoryCategory::Handover, content, serde_json::Map::new(), now)
            .await?;
        self.sessions.update_summary(session_id, &summary).await?;
        Ok(())
    }

    pub async fn wake_up(&self, namespace: &str, session: &Session, now: DateTime<Utc>) -> Result<WakeOutcome> {
        let handover = match self.get_last_handover(namespace, session, now).await {
            Ok(h) => Some(h),
            Err(Error::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        Ok(WakeOutcome {
            handover,
            session_summary: session.session_summary.clone(),
        })
    }

    pub async fn batch_lock_contexts(
        &self,
        namespace: &str,
        session_id: &SessionId,
        requests: Vec<LockRequest>,
        now: DateTime<Utc>,
    ) -> Vec<Result<LockOutcome>> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            outcomes.push(self.lock_context(namespace, session_id, request, now).await);
        }
        outcomes
    }

    pub async fn batch_recall_contexts(
        &self,
        namespace: &str,
        topics: Vec<(String, Option<ContextVersion>)>,
        now: DateTime<Utc>,
    ) -> Vec<Result<RecallOutcome>> {
        let mut outcomes = Vec::with_capacity(topics.len());
        for (topic, version) in topics {
            outcomes.push(self.recall_context(namespace, &topic, version, now).await);
        }
        outcomes
    }

    pub async fn export_project(&self, namespace: &str, project_display_name: &str, now: DateTime<Utc>) -> Result<DementiaExport> {
        let repo = self.contexts.for_project(namespace).await?;
        let contexts = repo.list_all().await?;
        Ok(DementiaExport {
            schema_version: EXPORT_SCHEMA_VERSION,
            project: project_display_name.to_string(),
            contexts,
            exported_at: now,
        })
    }

    pub async fn import_project(
        &self,
        namespace: &str,
        session_id: &SessionId,
        export: DementiaExport,
    ) -> Result<usize> {
        if export.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(Error::validation(format!(
                "unsupported export schema_version: {}",
                export.schema_version
            )));
        }
        let repo = self.contexts.for_project(namespace).await?;
        let mut imported = 0;
        for mut ctx in export.contexts {
            if repo.find(&ctx.label, Some(ctx.version)).await?.is_some() {
                continue;
            }
            ctx.id = 0;
            ctx.session_id = session_id.clone();
            repo.insert(&ctx).await?;
            imported += 1;
        }
        Ok(imported)
    }
}

#[cfg(test)]
mod tests;
