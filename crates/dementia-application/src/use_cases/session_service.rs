//! Session Store use case: lifecycle of MCP sessions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dementia_domain::entities::{Session, SessionSummary};
use dementia_domain::error::Result;
use dementia_domain::ports::repositories::SessionRepository;
use dementia_domain::value_objects::{SessionId, PENDING_PROJECT};

/// Orchestrates session lifecycle over the [`SessionRepository`] port.
pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
}

impl SessionService {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Look up a session, creating it with the pending sentinel if it
    /// does not yet exist. This is the middleware's "resolve" step.
    pub async fn resolve(&self, id: &SessionId) -> Result<Session> {
        if let Some(session) = self.repository.get(id).await? {
            return Ok(session);
        }
        self.repository.create(id, PENDING_PROJECT).await
    }

    pub async fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        self.repository.get(id).await
    }

    /// The single source of truth for project switching.
    pub async fn update_project(&self, id: &SessionId, project_name: &str) -> Result<()> {
        let updated = self.repository.update_project(id, project_name).await?;
        if !updated {
            return Err(dementia_domain::Error::not_found(format!(
                "session {id}"
            )));
        }
        Ok(())
    }

    pub async fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Result<()> {
        self.repository.touch(id, now).await
    }

    pub async fn update_summary(&self, id: &SessionId, summary: &SessionSummary) -> Result<()> {
        self.repository.update_summary(id, summary).await
    }

    /// Remove or mark sessions idle beyond `idle_cutoff`, returning the
    /// affected ids. Intended to be called periodically by a background
    /// task, not from a request handler.
    pub async fn cleanup_expired(&self, idle_cutoff: chrono::Duration, now: DateTime<Utc>) -> Result<Vec<SessionId>> {
        self.repository.cleanup_expired(idle_cutoff, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dementia_domain::ports::repositories::SessionRepository;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSessionRepository {
        sessions: Mutex<std::collections::HashMap<SessionId, Session>>,
    }

    #[async_trait]
    impl SessionRepository for FakeSessionRepository {
        async fn create(&self, id: &SessionId, project_name: &str) -> Result<Session> {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(existing) = sessions.get(id) {
                return Ok(existing.clone());
            }
            let now = Utc::now();
            let mut session = Session::pending(id.clone(), now);
            session.project_name = project_name.to_string();
            sessions.insert(id.clone(), session.clone());
            Ok(session)
        }

        async fn get(&self, id: &SessionId) -> Result<Option<Session>> {
            Ok(self.sessions.lock().unwrap().get(id).cloned())
        }

        async fn update_project(&self, id: &SessionId, project_name: &str) -> Result<bool> {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(session) = sessions.get_mut(id) {
                session.project_name = project_name.to_string();
                Ok(true)
            } else {
                Ok(false)
            }
        }

        async fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Result<()> {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(session) = sessions.get_mut(id) {
                session.last_active = now;
            }
            Ok(())
        }

        async fn update_summary(&self, id: &SessionId, summary: &SessionSummary) -> Result<()> {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(session) = sessions.get_mut(id) {
                session.session_summary = summary.clone();
            }
            Ok(())
        }

        async fn cleanup_expired(
            &self,
            idle_cutoff: chrono::Duration,
            now: DateTime<Utc>,
        ) -> Result<Vec<SessionId>> {
            let mut sessions = self.sessions.lock().unwrap();
            let expired: Vec<SessionId> = sessions
                .values()
                .filter(|s| now - s.last_active >= idle_cutoff)
                .map(|s| s.id.clone())
                .collect();
            for id in &expired {
                sessions.remove(id);
            }
            Ok(expired)
        }
    }

    #[tokio::test]
    async fn resolve_creates_pending_session_on_first_call() {
        let service = SessionService::new(Arc::new(FakeSessionRepository::default()));
        let id = SessionId::new("s1");
        let session = service.resolve(&id).await.unwrap();
        assert_eq!(session.project_name, PENDING_PROJECT);
    }

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let service = SessionService::new(Arc::new(FakeSessionRepository::default()));
        let id = SessionId::new("s1");
        service.resolve(&id).await.unwrap();
        service.update_project(&id, "alpha").await.unwrap();
        let session = service.resolve(&id).await.unwrap();
        assert_eq!(session.project_name, "alpha");
    }

    #[tokio::test]
    async fn update_project_fails_for_unknown_session() {
        let service = SessionService::new(Arc::new(FakeSessionRepository::default()));
        let id = SessionId::new("ghost");
        let err = service.update_project(&id, "alpha").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn cleanup_expired_removes_idle_sessions() {
        let service = SessionService::new(Arc::new(FakeSessionRepository::default()));
        let id = SessionId::new("s1");
        let session = service.resolve(&id).await.unwrap();
        let stale_now = session.last_active + chrono::Duration::hours(3);
        let expired = service
            .cleanup_expired(chrono::Duration::hours(2), stale_now)
            .await
            .unwrap();
        assert_eq!(expired, vec![id.clone()]);
        assert!(service.get(&id).await.unwrap().is_none());
    }
}
