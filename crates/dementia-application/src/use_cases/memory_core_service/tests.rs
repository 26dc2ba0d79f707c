use super::*;
use async_trait::async_trait;
use dementia_domain::entities::Session;
use std::sync::Mutex;

#[derive(Default)]
struct FakeContextRepository {
    locks: Mutex<Vec<ContextLock>>,
    archives: Mutex<Vec<ContextArchive>>,
    entries: Mutex<Vec<dementia_domain::entities::MemoryEntry>>,
    next_id: Mutex<i64>,
}

impl FakeContextRepository {
    fn next_id(&self) -> i64 {
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        *guard
    }
}

#[async_trait]
impl ContextRepository for FakeContextRepository {
    async fn latest_version(&self, label: &str) -> Result<Option<ContextVersion>> {
        Ok(self
            .locks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.label == label)
            .map(|c| c.version)
            .max())
    }

    async fn insert(&self, lock: &ContextLock) -> Result<ContextLock> {
        let mut stored = lock.clone();
        stored.id = self.next_id();
        self.locks.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, label: &str, version: Option<ContextVersion>) -> Result<Option<ContextLock>> {
        let locks = self.locks.lock().unwrap();
        Ok(match version {
            Some(v) => locks.iter().find(|c| c.label == label && c.version == v).cloned(),
            None => locks
                .iter()
                .filter(|c| c.label == label)
                .max_by_key(|c| c.version)
                .cloned(),
        })
    }

    async fn find_all_versions(&self, label: &str) -> Result<Vec<ContextLock>> {
        Ok(self
            .locks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.label == label)
            .cloned()
            .collect())
    }

    async fn touch_access(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        let mut locks = self.locks.lock().unwrap();
        if let Some(c) = locks.iter_mut().find(|c| c.id == id) {
            c.touch(now);
        }
        Ok(())
    }

    async fn set_embedding(&self, id: i64, embedding: &[f32]) -> Result<()> {
        let mut locks = self.locks.lock().unwrap();
        if let Some(c) = locks.iter_mut().find(|c| c.id == id) {
            c.embedding_vector = Some(embedding.to_vec());
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ContextLock>> {
        Ok(self.locks.lock().unwrap().clone())
    }

    async fn search(&self, query: &str, filter: &SearchFilter, limit: usize) -> Result<Vec<SearchHit>> {
        let locks = self.locks.lock().unwrap();
        let mut hits: Vec<SearchHit> = locks
            .iter()
            .filter(|c| filter.priority.is_none_or(|p| c.priority == p))
            .filter(|c| filter.tags.iter().all(|tag| c.metadata.tags.contains(tag)))
            .filter_map(|c| {
                let score = dementia_domain::utils::keyword_relevance_score(
                    &c.label,
                    &c.content,
                    &c.preview,
                    &c.key_concepts,
                    query,
                );
                (score > 0.0).then(|| SearchHit { context: c.clone(), score })
            })
            .collect();
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
        let locks = self.locks.lock().unwrap();
        let mut hits: Vec<SearchHit> = locks
            .iter()
            .filter_map(|c| {
                c.embedding_vector.as_ref().map(|v| SearchHit {
                    context: c.clone(),
                    score: dementia_domain::ports::embedding::cosine_similarity(v, query_embedding),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(limit);
        Ok(hits)
    }

    async fn archive(&self, ids: &[i64], reason: &str, now: DateTime<Utc>) -> Result<Vec<ContextArchive>> {
        let mut locks = self.locks.lock().unwrap();
        let mut archived = Vec::new();
        locks.retain(|c| {
            if ids.contains(&c.id) {
                archived.push(ContextArchive {
                    id: self.next_id(),
                    original_id: c.id,
                    session_id: c.session_id.clone(),
                    label: c.label.clone(),
                    version: c.version,
                    content: c.content.clone(),
                    content_hash: c.content_hash.clone(),
                    preview: c.preview.clone(),
                    key_concepts: c.key_concepts.clone(),
                    priority: c.priority,
                    metadata: c.metadata.clone(),
                    locked_at: c.locked_at,
                    last_accessed: c.last_accessed,
                    access_count: c.access_count,
                    deleted_at: now,
                    delete_reason: reason.to_string(),
                });
                false
            } else {
                true
            }
        });
        self.archives.lock().unwrap().extend(archived.clone());
        Ok(archived)
    }

    async fn list_archived(&self) -> Result<Vec<ContextArchive>> {
        Ok(self.archives.lock().unwrap().clone())
    }

    async fn insert_memory_entry(
        &self,
        session_id: &SessionId,
        category: MemoryCategory,
        content: serde_json::Value,
        metadata: serde_json::Map<String, serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<dementia_domain::entities::MemoryEntry> {
        let entry = dementia_domain::entities::MemoryEntry {
            id: self.next_id(),
            session_id: session_id.clone(),
            category,
            content,
            metadata,
            timestamp: now,
        };
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn latest_memory_entry(&self, category: MemoryCategory) -> Result<Option<dementia_domain::entities::MemoryEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.category == category)
            .max_by_key(|e| e.timestamp)
            .cloned())
    }
}

#[derive(Default)]
struct FakeContextRepositoryFactory {
    namespaces: Mutex<std::collections::HashMap<String, Arc<FakeContextRepository>>>,
}

impl FakeContextRepositoryFactory {
    fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextRepositoryFactory for FakeContextRepositoryFactory {
    async fn for_project(&self, namespace: &str) -> Result<Arc<dyn ContextRepository>> {
        let mut namespaces = self.namespaces.lock().unwrap();
        let repo = namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(FakeContextRepository::default()))
            .clone();
        Ok(repo)
    }
}

#[derive(Default)]
struct FakeSessionRepository;

#[async_trait]
impl SessionRepository for FakeSessionRepository {
    async fn create(&self, id: &SessionId, project_name: &str) -> Result<Session> {
        let now = Utc::now();
        let mut session = Session::pending(id.clone(), now);
        session.project_name = project_name.to_string();
        Ok(session)
    }
    async fn get(&self, _id: &SessionId) -> Result<Option<Session>> {
        Ok(None)
    }
    async fn update_project(&self, _id: &SessionId, _project_name: &str) -> Result<bool> {
        Ok(true)
    }
    async fn touch(&self, _id: &SessionId, _now: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
    async fn update_summary(&self, _id: &SessionId, _summary: &SessionSummary) -> Result<()> {
        Ok(())
    }
    async fn cleanup_expired(&self, _idle_cutoff: chrono::Duration, _now: DateTime<Utc>) -> Result<Vec<SessionId>> {
        Ok(vec![])
    }
}

struct FakeEmbeddingProvider {
    fail: bool,
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(Error::external_degraded("embedding service down"));
        }
        Ok(vec![text.len() as f32, 1.0])
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::new();
        for t in texts {
            out.push(self.embed(t).await?);
        }
        Ok(out)
    }
}

fn service(embeddings: Option<Arc<dyn EmbeddingProvider>>) -> (MemoryCoreService, SessionId) {
    let factory = Arc::new(FakeContextRepositoryFactory::new());
    let sessions = Arc::new(FakeSessionRepository);
    let service = MemoryCoreService::new(factory, sessions, embeddings, chrono::Duration::hours(2));
    (service, SessionId::new("s1"))
}

#[tokio::test]
async fn lock_then_recall_round_trips_content() {
    let (service, session_id) = service(None);
    let now = Utc::now();
    let outcome = service
        .lock_context(
            "dementia_alpha",
            &session_id,
            LockRequest {
                topic: "architecture".into(),
                content: "we must always validate inputs at the boundary".into(),
                tags: vec!["security".into()],
                priority: None,
                version_base: None,
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(outcome.version, ContextVersion::FIRST);
    assert_eq!(outcome.priority, Priority::AlwaysCheck);
    assert!(!outcome.embedded);

    let recalled = service
        .recall_context("dementia_alpha", "architecture", None, now)
        .await
        .unwrap();
    assert_eq!(recalled.content, "we must always validate inputs at the boundary");
    assert_eq!(recalled.version, ContextVersion::FIRST);
}

#[tokio::test]
async fn locking_the_same_label_twice_bumps_the_minor_version() {
    let (service, session_id) = service(None);
    let now = Utc::now();
    let req = |content: &str| LockRequest {
        topic: "decisions".into(),
        content: content.into(),
        tags: vec![],
        priority: Some(Priority::Reference),
        version_base: None,
    };
    let first = service.lock_context("dementia_a", &session_id, req("v1"), now).await.unwrap();
    let second = service.lock_context("dementia_a", &session_id, req("v2"), now).await.unwrap();
    assert_eq!(first.version, ContextVersion::new(1, 0));
    assert_eq!(second.version, ContextVersion::new(1, 1));
}

#[tokio::test]
async fn recall_missing_topic_is_not_found() {
    let (service, _session_id) = service(None);
    let now = Utc::now();
    let err = service
        .recall_context("dementia_alpha", "nope", None, now)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn unlock_requires_force_for_always_check_priority() {
    let (service, session_id) = service(None);
    let now = Utc::now();
    service
        .lock_context(
            "dementia_alpha",
            &session_id,
            LockRequest {
                topic: "critical-path".into(),
                content: "never skip this step".into(),
                tags: vec![],
                priority: None,
                version_base: None,
            },
            now,
        )
        .await
        .unwrap();

    let err = service
        .unlock_context("dementia_alpha", "critical-path", None, false, true, now)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "confirmation_required");

    let outcome = service
        .unlock_context("dementia_alpha", "critical-path", None, true, true, now)
        .await
        .unwrap();
    assert_eq!(outcome.archived, 1);
}

#[tokio::test]
async fn semantic_search_degrades_to_keyword_search_when_embedding_fails() {
    let (service, session_id) = service(Some(Arc::new(FakeEmbeddingProvider { fail: true })));
    let now = Utc::now();
    service
        .lock_context(
            "dementia_alpha",
            &session_id,
            LockRequest {
                topic: "rollout-plan".into(),
                content: "rollout plan for the release".into(),
                tags: vec![],
                priority: Some(Priority::Reference),
                version_base: None,
            },
            now,
        )
        .await
        .unwrap();

    let outcome = service
        .semantic_search_contexts("dementia_alpha", "rollout-plan", 10)
        .await
        .unwrap();
    assert!(outcome.warning.is_some());
    assert_eq!(outcome.hits.len(), 1);
}

#[tokio::test]
async fn search_contexts_orders_by_the_documented_weighted_score() {
    let (service, session_id) = service(None);
    let now = Utc::now();

    // Label matches the query exactly but nothing else does: label weight
    // (1.0) only.
    service
        .lock_context(
            "dementia_alpha",
            &session_id,
            LockRequest {
                topic: "checkout".into(),
                content: "roadmap notes for q3".into(),
                tags: vec![],
                priority: Some(Priority::Reference),
                version_base: None,
            },
            now,
        )
        .await
        .unwrap();

    // Label does not match, but content (0.5), preview (0.3, preview ==
    // content for short text), and the derived key_concepts (0.7) all do:
    // 1.5 total, outscoring the exact label match above.
    service
        .lock_context(
            "dementia_alpha",
            &session_id,
            LockRequest {
                topic: "other-topic".into(),
                content: "track checkout button clicks".into(),
                tags: vec![],
                priority: Some(Priority::Reference),
                version_base: None,
            },
            now,
        )
        .await
        .unwrap();

    let outcome = service
        .search_contexts("dementia_alpha", "checkout", SearchFilter::default(), 10)
        .await
        .unwrap();

    assert_eq!(outcome.hits.len(), 2);
    assert_eq!(outcome.hits[0].context.label, "other-topic");
    assert!((outcome.hits[0].score - 1.5).abs() < f32::EPSILON);
    assert_eq!(outcome.hits[1].context.label, "checkout");
    assert!((outcome.hits[1].score - 1.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn dashboard_flags_never_accessed_contexts() {
    let (service, session_id) = service(None);
    let now = Utc::now();
    service
        .lock_context(
            "dementia_alpha",
            &session_id,
            LockRequest {
                topic: "unused-topic".into(),
                content: "some reference content".into(),
                tags: vec![],
                priority: Some(Priority::Reference),
                version_base: None,
            },
            now,
        )
        .await
        .unwrap();

    let dashboard = service.context_dashboard("dementia_alpha", now).await.unwrap();
    assert_eq!(dashboard.total_contexts, 1);
    assert_eq!(dashboard.never_accessed, vec!["unused-topic".to_string()]);
}

#[tokio::test]
async fn wake_up_with_no_prior_handover_returns_none() {
    let (service, _session_id) = service(None);
    let now = Utc::now();
    let session = Session::pending(SessionId::new("fresh"), now - chrono::Duration::hours(5));
    let outcome = service.wake_up("dementia_alpha", &session, now).await.unwrap();
    assert!(outcome.handover.is_none());
}

#[tokio::test]
async fn export_then_import_round_trips_contexts_into_a_fresh_namespace() {
    let (service, session_id) = service(None);
    let now = Utc::now();
    service
        .lock_context(
            "dementia_alpha",
            &session_id,
            LockRequest {
                topic: "shared-topic".into(),
                content: "exported content".into(),
                tags: vec![],
                priority: Some(Priority::Reference),
                version_base: None,
            },
            now,
        )
        .await
        .unwrap();

    let export = service.export_project("dementia_alpha", "Alpha", now).await.unwrap();
    assert_eq!(export.contexts.len(), 1);

    let imported = service.import_project("dementia_beta", &session_id, export).await.unwrap();
    assert_eq!(imported, 1);

    let recalled = service
        .recall_context("dementia_beta", "shared-topic", None, now)
        .await
        .unwrap();
    assert_eq!(recalled.content, "exported content");
}

