//! Turns an [`AppConfig`] into the fully wired application-layer services
//! (spec §6 "External Interfaces" / §5 "shared resources").

use std::sync::Arc;

use dementia_application::use_cases::memory_core_service::MemoryCoreService;
use dementia_application::use_cases::project_service::ProjectService;
use dementia_application::use_cases::session_service::SessionService;
use dementia_domain::error::Result;
use dementia_domain::ports::database::DatabaseExecutor;
use dementia_domain::ports::embedding::EmbeddingProvider;
use dementia_infrastructure::cache::ProjectHintCache;
use dementia_infrastructure::config::AppConfig;
use dementia_infrastructure::storage::PgStorageAdapter;
use dementia_providers::{HttpEmbeddingProvider, PgContextRepositoryFactory, PgProjectRepository, PgSessionRepository};
use dementia_server::DementiaServer;

/// Everything `dementia serve` needs to answer MCP calls, assembled once
/// at startup and shared across every connection/session.
pub struct Application {
    pub storage: Arc<PgStorageAdapter>,
    pub sessions: Arc<SessionService>,
    pub projects: Arc<ProjectService>,
    pub memory: Arc<MemoryCoreService>,
    pub project_cache: Arc<ProjectHintCache>,
    pub config: AppConfig,
}

impl Application {
    pub async fn wire(config: AppConfig) -> Result<Self> {
        let storage = Arc::new(
            PgStorageAdapter::connect(
                &config.database.url,
                config.database.min_connections,
                config.database.max_connections,
                config.database.statement_timeout_secs,
            )
            .await?,
        );
        let executor: Arc<dyn DatabaseExecutor> = storage.clone();

        let session_repository = Arc::new(PgSessionRepository::new(executor.clone()));
        let project_repository = Arc::new(PgProjectRepository::new(executor.clone()));
        let contexts = Arc::new(PgContextRepositoryFactory::new(executor.clone()));

        let embeddings: Option<Arc<dyn EmbeddingProvider>> = config
            .embedding
            .endpoint
            .clone()
            .map(|endpoint| {
                Arc::new(HttpEmbeddingProvider::new(endpoint, config.embedding.api_key.clone()))
                    as Arc<dyn EmbeddingProvider>
            });

        let sessions = Arc::new(SessionService::new(session_repository.clone()));
        let projects = Arc::new(ProjectService::new(project_repository, executor));
        let memory = Arc::new(MemoryCoreService::new(contexts, session_repository, embeddings, config.idle_cutoff()));
        let project_cache = Arc::new(ProjectHintCache::new());

        Ok(Self {
            storage,
            sessions,
            projects,
            memory,
            project_cache,
            config,
        })
    }

    /// A fresh [`DementiaServer`] sharing this application's services. One
    /// instance is created per stdio process / per streamable-HTTP
    /// connection so each gets its own synthesized session identity.
    pub fn server(&self) -> DementiaServer {
        DementiaServer::new(
            self.sessions.clone(),
            self.projects.clone(),
            self.memory.clone(),
            self.project_cache.clone(),
        )
    }

    /// Spawn the background idle-session sweep (spec §5). Returns the
    /// join handle so callers can decide whether to await or detach it.
    pub fn spawn_cleanup_task(&self) -> tokio::task::JoinHandle<()> {
        let sessions = self.sessions.clone();
        let idle_cutoff = self.config.idle_cutoff();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                match sessions.cleanup_expired(idle_cutoff, chrono::Utc::now()).await {
                    Ok(expired) if !expired.is_empty() => {
                        tracing::info!(count = expired.len(), "swept expired sessions");
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!(error = %err, "session cleanup sweep failed"),
                }
            }
        })
    }
}
