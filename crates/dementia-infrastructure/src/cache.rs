//! In-memory project-hint cache (spec §5 "Shared resources").
//!
//! Writeable only by `select_project_for_session`/`switch_project`; readable
//! by every tool dispatch. The *database* session row remains authoritative
//! — this cache exists purely to avoid a round-trip on the hot path, and a
//! miss must always be reconciled from the database, never treated as
//! `__PENDING__`.

use dashmap::DashMap;
use dementia_domain::value_objects::SessionId;

/// A read-through hint cache from session id to its currently bound project
/// namespace.
#[derive(Debug, Default)]
pub struct ProjectHintCache {
    hints: DashMap<SessionId, String>,
}

impl ProjectHintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached project namespace for `id`, if any. Callers must treat a
    /// `None` as "unknown", not "pending" — reconcile from the database.
    pub fn get(&self, id: &SessionId) -> Option<String> {
        self.hints.get(id).map(|entry| entry.value().clone())
    }

    /// Update the hint after a successful `select_project_for_session` or
    /// `switch_project`.
    pub fn set(&self, id: SessionId, project_namespace: String) {
        self.hints.insert(id, project_namespace);
    }

    /// Drop a stale hint, forcing the next read to reconcile from the
    /// database.
    pub fn invalidate(&self, id: &SessionId) {
        self.hints.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_returns_none() {
        let cache = ProjectHintCache::new();
        assert!(cache.get(&SessionId::new("s1")).is_none());
    }

    #[test]
    fn set_then_get_returns_the_hint() {
        let cache = ProjectHintCache::new();
        let id = SessionId::new("s1");
        cache.set(id.clone(), "dementia_alpha".to_string());
        assert_eq!(cache.get(&id), Some("dementia_alpha".to_string()));
    }

    #[test]
    fn invalidate_clears_the_hint() {
        let cache = ProjectHintCache::new();
        let id = SessionId::new("s1");
        cache.set(id.clone(), "dementia_alpha".to_string());
        cache.invalidate(&id);
        assert!(cache.get(&id).is_none());
    }
}
