//! The `DementiaServer` MCP tool surface and session middleware.
//!
//! `DementiaServer` implements [`rmcp::ServerHandler`] with a `call_tool`
//! override that runs spec §4.3's identify/resolve/gate/publish/dispatch/
//! touch sequence around the macro-generated [`rmcp::handler::server::
//! router::tool::ToolRouter`], the same way the reference workspace's MCP
//! server layers cross-cutting behavior around `ToolRouter::call`.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dementia_application::use_cases::memory_core_service::{Handover, LockRequest, MemoryCoreService};
use dementia_application::use_cases::project_service::ProjectService;
use dementia_application::use_cases::session_service::SessionService;
use dementia_domain::entities::{ContextLock, Session, SessionSummary};
use dementia_domain::error::{Error, Result as DomainResult};
use dementia_domain::ports::repositories::{SearchFilter, SearchHit};
use dementia_domain::value_objects::{ContextVersion, Priority, SessionId};
use dementia_infrastructure::cache::ProjectHintCache;
use dementia_infrastructure::logging::log_tool_call;
use dementia_infrastructure::session_task;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::{IntoCallToolResult, ToolCallContext};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler, tool, tool_router};
use tokio::sync::RwLock;

use crate::requests::*;
use crate::responses::*;

/// Tools callable before a project has been selected (spec §4.3).
const WHITELIST: &[&str] = &[
    "list_projects",
    "create_project",
    "select_project_for_session",
    "switch_project",
];

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn parse_version(raw: &Option<String>) -> DomainResult<Option<ContextVersion>> {
    raw.as_deref()
        .map(|v| ContextVersion::from_str(v).map_err(|_| Error::validation(format!("invalid version '{v}'"))))
        .transpose()
}

fn parse_priority(raw: &Option<String>) -> DomainResult<Option<Priority>> {
    raw.as_deref()
        .map(|p| Priority::from_str(p).map_err(|_| Error::validation(format!("invalid priority '{p}'"))))
        .transpose()
}

fn search_hit_data(hit: &SearchHit) -> SearchHitData {
    SearchHitData {
        label: hit.context.label.clone(),
        version: hit.context.version.to_string(),
        preview: hit.context.preview.clone(),
        priority: hit.context.priority.to_string(),
        score: hit.score,
    }
}

fn context_lock_as_hit(ctx: &ContextLock) -> SearchHitData {
    SearchHitData {
        label: ctx.label.clone(),
        version: ctx.version.to_string(),
        preview: ctx.preview.clone(),
        priority: ctx.priority.to_string(),
        score: 1.0,
    }
}

/// MCP tool surface over the Memory Core and Project services.
pub struct DementiaServer {
    sessions: Arc<SessionService>,
    projects: Arc<ProjectService>,
    memory: Arc<MemoryCoreService>,
    project_cache: Arc<ProjectHintCache>,
    identity: RwLock<Option<SessionId>>,
    tool_router: ToolRouter<Self>,
}

impl DementiaServer {
    pub fn new(
        sessions: Arc<SessionService>,
        projects: Arc<ProjectService>,
        memory: Arc<MemoryCoreService>,
        project_cache: Arc<ProjectHintCache>,
    ) -> Self {
        Self {
            sessions,
            projects,
            memory,
            project_cache,
            identity: RwLock::new(None),
            tool_router: Self::tool_router(),
        }
    }

    /// Spec §4.3 step 1 ("Identify"): one session id per connection.
    /// `rmcp` instantiates one handler per stdio process / per
    /// streamable-HTTP connection, so caching the synthesized id on
    /// `self` gives every call on this connection the same identity.
    async fn identify(&self) -> SessionId {
        if let Some(id) = self.identity.read().await.clone() {
            return id;
        }
        let mut guard = self.identity.write().await;
        if let Some(id) = guard.clone() {
            return id;
        }
        let id = SessionId::generate();
        *guard = Some(id.clone());
        id
    }

    fn failure<D>(err: &Error) -> ToolOutput<D> {
        tracing::error!(error = ?err, error_type = err.kind(), "tool call failed");
        ToolOutput::failure(err.to_string(), err.kind(), now())
    }

    /// Fetch the full [`Session`] for the currently published session id.
    /// Every tool needs the full row (for project resolution or
    /// handover), so unlike the hint cache this always reconciles from
    /// the session store.
    async fn current_session(&self) -> DomainResult<Session> {
        let id = session_task::current().expect("session id published by call_tool before dispatch");
        self.sessions.resolve(&id).await
    }

    async fn select_or_switch(&self, name: &str) -> DomainResult<(String, String)> {
        let project = self.projects.create_project(name).await?;
        let session = self.current_session().await?;
        self.sessions
            .update_project(&session.id, project.as_str())
            .await?;
        self.project_cache.set(session.id.clone(), project.namespace());
        Ok((name.to_string(), project.namespace()))
    }
}

#[tool_router]
impl DementiaServer {
    #[tool(description = "List every registered project by display name. Callable before a project is selected.")]
    async fn list_projects(&self) -> Result<CallToolResult, ErrorData> {
        let out = match self.projects.list_projects().await {
            Ok(projects) => ToolOutput::success("listed projects", ProjectsData { projects }, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Register a new project; sanitizes the display name into a storage namespace. Callable before a project is selected.")]
    async fn create_project(
        &self,
        Parameters(req): Parameters<CreateProjectRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.projects.create_project(&req.name).await {
            Ok(project) => ToolOutput::success(
                format!("project '{}' ready", req.name),
                ProjectData { project: req.name.clone(), schema: project.namespace() },
                now(),
            ),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Bind this session to a project, creating it if it does not already exist. Callable before a project is selected.")]
    async fn select_project_for_session(
        &self,
        Parameters(req): Parameters<SelectProjectRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.select_or_switch(&req.name).await {
            Ok((project, schema)) => {
                ToolOutput::success(format!("session bound to '{project}'"), ProjectData { project, schema }, now())
            }
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Rebind this session to a different project. Callable before a project is selected.")]
    async fn switch_project(
        &self,
        Parameters(req): Parameters<SelectProjectRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.select_or_switch(&req.name).await {
            Ok((project, schema)) => {
                ToolOutput::success(format!("session switched to '{project}'"), ProjectData { project, schema }, now())
            }
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Lock a versioned context under a topic label, auto-detecting priority and best-effort embedding.")]
    async fn lock_context(
        &self,
        Parameters(req): Parameters<LockContextRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_lock_context(req).await {
            Ok(data) => ToolOutput::success(format!("locked '{}' @ {}", data.label, data.version), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Recall a locked context by topic, optionally at a specific version.")]
    async fn recall_context(
        &self,
        Parameters(req): Parameters<RecallContextRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_recall_context(req).await {
            Ok(data) => ToolOutput::success("recalled context", data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Archive and remove a locked context (all versions, or one). Always-check contexts require force=true.")]
    async fn unlock_context(
        &self,
        Parameters(req): Parameters<UnlockContextRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_unlock_context(req).await {
            Ok(data) => ToolOutput::success(format!("archived {} context(s)", data.archived), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Keyword-search locked contexts by content, preview, key concepts, and label.")]
    async fn search_contexts(
        &self,
        Parameters(req): Parameters<SearchContextsRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_search_contexts(req).await {
            Ok(data) => ToolOutput::success(format!("{} result(s)", data.results.len()), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Semantic search over locked contexts by embedding similarity; degrades to keyword search if embeddings are unavailable.")]
    async fn semantic_search_contexts(
        &self,
        Parameters(req): Parameters<SemanticSearchContextsRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_semantic_search_contexts(req).await {
            Ok(data) => ToolOutput::success(format!("{} result(s)", data.results.len()), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Return contexts that are always-check or whose key concepts overlap the given text.")]
    async fn check_contexts(
        &self,
        Parameters(req): Parameters<CheckContextsRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_check_contexts(req).await {
            Ok(data) => ToolOutput::success(format!("{} match(es)", data.matches.len()), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "List every locked context, flat or grouped by label.")]
    async fn explore_context_tree(
        &self,
        Parameters(req): Parameters<ExploreContextTreeRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_explore_context_tree(req).await {
            Ok(data) => ToolOutput::success("explored context tree", data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Summarize the project's locked contexts: counts by priority, access frequency, and staleness warnings.")]
    async fn context_dashboard(
        &self,
        Parameters(req): Parameters<ContextDashboardRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_context_dashboard(req).await {
            Ok(data) => ToolOutput::success("dashboard ready", data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Return the current session's live summary if still active, otherwise the last packaged handover.")]
    async fn get_last_handover(
        &self,
        Parameters(req): Parameters<GetLastHandoverRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_get_last_handover(req).await {
            Ok(data) => ToolOutput::success(format!("handover: {}", data.status), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Record a handover summary for this session before ending work.")]
    async fn sleep(
        &self,
        Parameters(req): Parameters<SleepRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_sleep(req).await {
            Ok(()) => ToolOutput::success("handover recorded", SleepData {}, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Resume a session: returns the last handover (current or packaged) plus the live session summary.")]
    async fn wake_up(
        &self,
        Parameters(req): Parameters<WakeUpRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_wake_up(req).await {
            Ok(data) => ToolOutput::success("woke up", data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Lock multiple contexts in one call; each entry succeeds or fails independently.")]
    async fn batch_lock_contexts(
        &self,
        Parameters(req): Parameters<BatchLockContextsRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_batch_lock_contexts(req).await {
            Ok(data) => ToolOutput::success(format!("{} outcome(s)", data.outcomes.len()), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Recall multiple contexts in one call; each entry succeeds or fails independently.")]
    async fn batch_recall_contexts(
        &self,
        Parameters(req): Parameters<BatchRecallContextsRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_batch_recall_contexts(req).await {
            Ok(data) => ToolOutput::success(format!("{} outcome(s)", data.outcomes.len()), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Export every locked context in the resolved project as a versioned JSON envelope.")]
    async fn export_project(
        &self,
        Parameters(req): Parameters<ExportProjectRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_export_project(req).await {
            Ok(data) => ToolOutput::success(format!("exported {} context(s)", data.contexts.as_array().map(|a| a.len()).unwrap_or(0)), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }

    #[tool(description = "Import a previously exported project envelope, skipping contexts that already exist.")]
    async fn import_project(
        &self,
        Parameters(req): Parameters<ImportProjectRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let out = match self.do_import_project(req).await {
            Ok(data) => ToolOutput::success(format!("imported {} context(s)", data.imported), data, now()),
            Err(err) => Self::failure(&err),
        };
        Json(out).into_call_tool_result()
    }
}

/// Business logic bodies, kept out of the `#[tool_router]` block so
/// `?`-based error propagation reads naturally.
impl DementiaServer {
    async fn do_lock_context(&self, req: LockContextRequest) -> DomainResult<LockData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let request = LockRequest {
            topic: req.topic,
            content: req.content,
            tags: req.tags,
            priority: parse_priority(&req.priority)?,
            version_base: parse_version(&req.version_base)?,
        };
        let outcome = self
            .memory
            .lock_context(&project.namespace(), &session.id, request, now())
            .await?;
        Ok(LockData {
            label: outcome.label,
            version: outcome.version.to_string(),
            hash: outcome.hash,
            preview: outcome.preview,
            priority: outcome.priority.to_string(),
            embedded: outcome.embedded,
            branched_from: outcome.branched_from.map(|v| v.to_string()),
        })
    }

    async fn do_recall_context(&self, req: RecallContextRequest) -> DomainResult<RecallData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let version = parse_version(&req.version)?;
        let outcome = self.memory.recall_context(&project.namespace(), &req.topic, version, now()).await?;
        Ok(RecallData {
            content: outcome.content,
            version: outcome.version.to_string(),
            preview: outcome.preview,
            metadata: serde_json::to_value(&outcome.metadata)?,
        })
    }

    async fn do_unlock_context(&self, req: UnlockContextRequest) -> DomainResult<UnlockData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let version = match req.version.as_deref() {
            Some("all") | None => None,
            Some(v) => Some(ContextVersion::from_str(v).map_err(|_| Error::validation(format!("invalid version '{v}'")))?),
        };
        let outcome = self
            .memory
            .unlock_context(&project.namespace(), &req.topic, version, req.force, req.archive, now())
            .await?;
        Ok(UnlockData {
            archived: outcome.archived,
            affected: outcome
                .affected
                .into_iter()
                .map(|(label, version)| AffectedVersion { label, version: version.to_string() })
                .collect(),
        })
    }

    async fn do_search_contexts(&self, req: SearchContextsRequest) -> DomainResult<SearchData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let filter = SearchFilter { priority: parse_priority(&req.priority)?, tags: req.tags };
        let outcome = self.memory.search_contexts(&project.namespace(), &req.query, filter, req.limit).await?;
        Ok(SearchData {
            results: outcome.hits.iter().map(search_hit_data).collect(),
            warning: outcome.warning,
        })
    }

    async fn do_semantic_search_contexts(&self, req: SemanticSearchContextsRequest) -> DomainResult<SearchData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let outcome = self.memory.semantic_search_contexts(&project.namespace(), &req.query, req.limit).await?;
        Ok(SearchData {
            results: outcome.hits.iter().map(search_hit_data).collect(),
            warning: outcome.warning,
        })
    }

    async fn do_check_contexts(&self, req: CheckContextsRequest) -> DomainResult<CheckData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let matches = self.memory.check_contexts(&project.namespace(), &req.text).await?;
        Ok(CheckData { matches: matches.iter().map(context_lock_as_hit).collect() })
    }

    async fn do_explore_context_tree(&self, req: ExploreContextTreeRequest) -> DomainResult<ContextTreeData> {
        use dementia_application::use_cases::memory_core_service::ContextTree;
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let tree = self.memory.explore_context_tree(&project.namespace(), req.flat).await?;
        Ok(match tree {
            ContextTree::Flat(all) => ContextTreeData {
                flat: Some(all.iter().map(context_lock_as_hit).collect()),
                grouped: None,
            },
            ContextTree::Grouped(groups) => {
                let value: serde_json::Map<String, serde_json::Value> = groups
                    .into_iter()
                    .map(|(label, rows)| {
                        let rows: Vec<SearchHitData> = rows.iter().map(context_lock_as_hit).collect();
                        (label, serde_json::to_value(rows).unwrap_or_default())
                    })
                    .collect();
                ContextTreeData { flat: None, grouped: Some(serde_json::Value::Object(value)) }
            }
        })
    }

    async fn do_context_dashboard(&self, req: ContextDashboardRequest) -> DomainResult<DashboardData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let dashboard = self.memory.context_dashboard(&project.namespace(), now()).await?;
        Ok(DashboardData {
            counts_by_priority: serde_json::to_value(&dashboard.counts_by_priority)?,
            total_contexts: dashboard.total_contexts,
            top_accessed: dashboard.top_accessed,
            least_accessed: dashboard.least_accessed,
            never_accessed: dashboard.never_accessed,
            stale_warnings: dashboard.stale_warnings,
        })
    }

    async fn do_get_last_handover(&self, req: GetLastHandoverRequest) -> DomainResult<HandoverData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let handover = self.memory.get_last_handover(&project.namespace(), &session, now()).await?;
        Ok(handover_data(handover))
    }

    async fn do_sleep(&self, req: SleepRequest) -> DomainResult<()> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let summary = SessionSummary {
            work_done: req.work_done,
            tools_used: req.tools_used,
            next_steps: req.next_steps,
            important_context: req.important_context,
        };
        self.memory.sleep(&project.namespace(), &session.id, summary, now()).await
    }

    async fn do_wake_up(&self, req: WakeUpRequest) -> DomainResult<WakeData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let outcome = self.memory.wake_up(&project.namespace(), &session, now()).await?;
        Ok(WakeData {
            handover: outcome.handover.map(handover_data),
            session_summary: serde_json::to_value(&outcome.session_summary)?,
        })
    }

    async fn do_batch_lock_contexts(&self, req: BatchLockContextsRequest) -> DomainResult<BatchLockData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let mut requests = Vec::with_capacity(req.requests.len());
        for entry in req.requests {
            requests.push(LockRequest {
                topic: entry.topic,
                content: entry.content,
                tags: entry.tags,
                priority: parse_priority(&entry.priority)?,
                version_base: parse_version(&entry.version_base)?,
            });
        }
        let outcomes = self
            .memory
            .batch_lock_contexts(&project.namespace(), &session.id, requests, now())
            .await;
        Ok(BatchLockData { outcomes: outcomes.into_iter().map(|r| outcome_to_json(r.map(|o| serde_json::json!({
            "label": o.label,
            "version": o.version.to_string(),
            "hash": o.hash,
            "preview": o.preview,
            "priority": o.priority.to_string(),
            "embedded": o.embedded,
            "branched_from": o.branched_from.map(|v| v.to_string()),
        })))).collect() })
    }

    async fn do_batch_recall_contexts(&self, req: BatchRecallContextsRequest) -> DomainResult<BatchRecallData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let mut topics = Vec::with_capacity(req.topics.len());
        for entry in req.topics {
            topics.push((entry.topic, parse_version(&entry.version)?));
        }
        let outcomes = self.memory.batch_recall_contexts(&project.namespace(), topics, now()).await;
        Ok(BatchRecallData { outcomes: outcomes.into_iter().map(|r| outcome_to_json(r.map(|o| serde_json::json!({
            "content": o.content,
            "version": o.version.to_string(),
            "preview": o.preview,
            "metadata": o.metadata,
        })))).collect() })
    }

    async fn do_export_project(&self, req: ExportProjectRequest) -> DomainResult<ExportData> {
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let export = self.memory.export_project(&project.namespace(), project.as_str(), now()).await?;
        Ok(ExportData {
            schema_version: export.schema_version,
            project: export.project,
            contexts: serde_json::to_value(&export.contexts)?,
            exported_at: export.exported_at,
        })
    }

    async fn do_import_project(&self, req: ImportProjectRequest) -> DomainResult<ImportData> {
        use dementia_application::use_cases::memory_core_service::DementiaExport;
        let session = self.current_session().await?;
        let project = self.projects.resolve(req.project.as_deref(), &session)?;
        let export: DementiaExport = serde_json::from_value(req.export)?;
        let imported = self.memory.import_project(&project.namespace(), &session.id, export).await?;
        Ok(ImportData { imported })
    }
}

fn handover_data(handover: Handover) -> HandoverData {
    match handover {
        Handover::Current { hours_ago, summary } => HandoverData {
            status: "current".into(),
            hours_ago: Some(hours_ago),
            content: serde_json::to_value(&summary).unwrap_or_default(),
        },
        Handover::Packaged { content } => HandoverData { status: "packaged".into(), hours_ago: None, content },
    }
}

fn outcome_to_json(result: DomainResult<serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(value) => serde_json::json!({"success": true, "data": value}),
        Err(err) => serde_json::json!({"success": false, "error": err.to_string(), "error_type": err.kind()}),
    }
}

impl ServerHandler for DementiaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "dementia".into(),
                title: Some("Dementia memory and context engine".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Versioned, project-scoped context memory for long-running agent sessions.".into(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult { tools: self.tool_router.list_all(), next_cursor: None, meta: None }))
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            // 1. Identify.
            let id = self.identify().await;

            // 2. Resolve.
            let session = self.sessions.resolve(&id).await.map_err(|err| {
                ErrorData::internal_error(format!("failed to resolve session: {err}"), None)
            })?;

            // 3. Gate.
            let tool_name = request.name.to_string();
            if !WHITELIST.contains(&tool_name.as_str()) && !session.has_project() {
                let out: ProjectsOutput = ToolOutput::failure(
                    Error::ProjectNotSelected.to_string(),
                    Error::ProjectNotSelected.kind(),
                    now(),
                );
                return Json(out).into_call_tool_result();
            }

            let project = session.has_project().then_some(session.project_name.as_str());
            log_tool_call(&tool_name, &id, project);

            // 4. Publish + 5. Dispatch.
            let result = session_task::scope(id.clone(), || async {
                let ctx = ToolCallContext::new(self, request, context);
                self.tool_router.call(ctx).await
            })
            .await;

            // 6. Touch.
            if let Err(err) = self.sessions.touch(&id, now()).await {
                tracing::warn!(error = %err, "failed to touch session after tool dispatch");
            }

            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_matches_spec() {
        assert_eq!(
            WHITELIST,
            &["list_projects", "create_project", "select_project_for_session", "switch_project"]
        );
    }
}
