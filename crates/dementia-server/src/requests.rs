//! Tool input structs (spec §4.5 "argument coercion").
//!
//! Every field that needs project resolution carries an optional
//! `project` override (spec §4.4 project-resolution priority: explicit
//! argument wins over the session binding).

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProjectRequest {
    #[schemars(description = "Display name for the new project; sanitized to a namespace")]
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SelectProjectRequest {
    #[schemars(description = "Project display name to bind this session to")]
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LockContextRequest {
    #[schemars(description = "Label identifying this context across versions")]
    pub topic: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[schemars(description = "always_check | important | reference; auto-detected when omitted")]
    #[serde(default)]
    pub priority: Option<String>,
    #[schemars(description = "Explicit version (\"M.m\") to branch from")]
    #[serde(default)]
    pub version_base: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecallContextRequest {
    pub topic: String,
    #[schemars(description = "Specific version (\"M.m\"); latest when omitted")]
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UnlockContextRequest {
    pub topic: String,
    #[schemars(description = "Specific version (\"M.m\"), or \"all\" for every version")]
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub force: bool,
    #[serde(default = "default_true")]
    pub archive: bool,
    #[serde(default)]
    pub project: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchContextsRequest {
    pub query: String,
    #[schemars(description = "always_check | important | reference")]
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SemanticSearchContextsRequest {
    pub query: String,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckContextsRequest {
    pub text: String,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExploreContextTreeRequest {
    #[serde(default)]
    pub flat: bool,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContextDashboardRequest {
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetLastHandoverRequest {
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SleepRequest {
    #[serde(default)]
    pub work_done: Vec<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub important_context: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WakeUpRequest {
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchLockEntry {
    pub topic: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub version_base: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchLockContextsRequest {
    pub requests: Vec<BatchLockEntry>,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchRecallEntry {
    pub topic: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchRecallContextsRequest {
    pub topics: Vec<BatchRecallEntry>,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExportProjectRequest {
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImportProjectRequest {
    pub export: serde_json::Value,
    #[serde(default)]
    pub project: Option<String>,
}
