//! Project resolution, sanitization, and namespace lifecycle.

use std::sync::Arc;

use dementia_domain::entities::Session;
use dementia_domain::error::{Error, Result};
use dementia_domain::ports::database::DatabaseExecutor;
use dementia_domain::ports::repositories::ProjectRepository;
use dementia_domain::value_objects::{sanitize_project_name, ProjectName, PENDING_PROJECT};

/// Orchestrates project resolution (spec §4.4 "Project resolution") and
/// the project-management tools (`list_projects`, `create_project`,
/// `select_project_for_session`, `switch_project`).
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    database: Arc<dyn DatabaseExecutor>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectRepository>, database: Arc<dyn DatabaseExecutor>) -> Self {
        Self { projects, database }
    }

    /// Resolve the project to operate on for this call: the explicit
    /// argument wins if present, otherwise the session's current binding;
    /// if neither is set, `project_not_selected`.
    pub fn resolve(&self, explicit: Option<&str>, session: &Session) -> Result<ProjectName> {
        if let Some(name) = explicit.filter(|n| !n.is_empty()) {
            return ProjectName::from_raw(name);
        }
        if session.project_name != PENDING_PROJECT && !session.project_name.is_empty() {
            return Ok(ProjectName::from_sanitized(session.project_name.clone()));
        }
        Err(Error::ProjectNotSelected)
    }

    /// Create (register) a new project, rejecting a sanitized-name
    /// collision against an existing, differently-named project (see
    /// SPEC_FULL.md §9's resolution of the truncation-collision Open
    /// Question).
    pub async fn create_project(&self, display_name: &str) -> Result<ProjectName> {
        let sanitized = sanitize_project_name(display_name)?;
        if let Some(existing) = self.projects.find_by_sanitized(&sanitized).await? {
            if existing.display_name != display_name {
                return Err(Error::validation(format!(
                    "project name '{display_name}' sanitizes to '{sanitized}', which is already \
                     registered to project '{}'",
                    existing.display_name
                )));
            }
        } else {
            self.projects.register(&sanitized, display_name).await?;
        }
        let project = ProjectName::from_sanitized(sanitized);
        self.database.ensure_namespace(&project.namespace()).await?;
        Ok(project)
    }

    /// All registered projects, by display name.
    pub async fn list_projects(&self) -> Result<Vec<String>> {
        let records = self.projects.list().await?;
        Ok(records.into_iter().map(|r| r.display_name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dementia_domain::ports::database::SchemaPinnedConnection;
    use dementia_domain::ports::repositories::ProjectRecord;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProjectRepository {
        records: Mutex<Vec<ProjectRecord>>,
    }

    #[async_trait]
    impl ProjectRepository for FakeProjectRepository {
        async fn register(&self, sanitized_name: &str, display_name: &str) -> Result<ProjectRecord> {
            let record = ProjectRecord {
                sanitized_name: sanitized_name.to_string(),
                display_name: display_name.to_string(),
            };
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn find_by_sanitized(&self, sanitized_name: &str) -> Result<Option<ProjectRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.sanitized_name == sanitized_name)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<ProjectRecord>> {
            Ok(self.records.lock().unwrap().clone())
        }
    }

    struct FakeDatabaseExecutor;

    #[async_trait]
    impl DatabaseExecutor for FakeDatabaseExecutor {
        async fn borrow(&self, _namespace: &str) -> Result<Arc<dyn SchemaPinnedConnection>> {
            unimplemented!("not exercised by project_service tests")
        }
        async fn borrow_control(&self) -> Result<Arc<dyn SchemaPinnedConnection>> {
            unimplemented!("not exercised by project_service tests")
        }
        async fn ensure_namespace(&self, _namespace: &str) -> Result<()> {
            Ok(())
        }
        async fn list_namespaces(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
    }

    fn service() -> ProjectService {
        ProjectService::new(Arc::new(FakeProjectRepository::default()), Arc::new(FakeDatabaseExecutor))
    }

    fn session_with_project(project_name: &str) -> Session {
        let now = chrono::Utc::now();
        let mut session = Session::pending(dementia_domain::value_objects::SessionId::new("s1"), now);
        session.project_name = project_name.to_string();
        session
    }

    #[test]
    fn resolve_prefers_explicit_argument() {
        let service = service();
        let session = session_with_project("alpha");
        let resolved = service.resolve(Some("Beta"), &session).unwrap();
        assert_eq!(resolved.as_str(), "beta");
    }

    #[test]
    fn resolve_falls_back_to_session_binding() {
        let service = service();
        let session = session_with_project("alpha");
        let resolved = service.resolve(None, &session).unwrap();
        assert_eq!(resolved.as_str(), "alpha");
    }

    #[test]
    fn resolve_fails_when_neither_is_set() {
        let service = service();
        let session = session_with_project(PENDING_PROJECT);
        let err = service.resolve(None, &session).unwrap_err();
        assert_eq!(err.kind(), "project_not_selected");
    }

    #[tokio::test]
    async fn create_project_rejects_sanitized_collisions() {
        let service = service();
        service.create_project("Alpha One").await.unwrap();
        let err = service.create_project("alpha-one").await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn create_project_is_idempotent_for_the_same_display_name() {
        let service = service();
        let first = service.create_project("Alpha").await.unwrap();
        let second = service.create_project("Alpha").await.unwrap();
        assert_eq!(first, second);
    }
}
