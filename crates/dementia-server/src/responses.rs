//! Structured tool output types (spec §4.5/§6 response envelope).
//!
//! Every tool returns a `Json<T>` where `T` flattens a shared [`Envelope`]
//! (the `success`/`error`/`error_type`/`timestamp` fields named in §6) over
//! a tool-specific payload. `Json<T>` carries the human-readable message in
//! `CallToolResult.content` while publishing the full structured payload as
//! `structured_content`, so `rmcp` can still advertise an `outputSchema`.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use rmcp::ErrorData;
use rmcp::handler::server::tool::IntoCallToolResult;
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Serialize;

/// Fields present on every tool response, success or failure.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn ok(now: DateTime<Utc>) -> Self {
        Self { success: true, error: None, error_type: None, timestamp: now }
    }

    pub fn failed(error: impl Into<String>, error_type: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            error_type: Some(error_type.into()),
            timestamp: now,
        }
    }
}

/// Outputs that can render themselves as the one-line message carried in
/// `CallToolResult.content` alongside the full structured payload.
pub trait HasMessage {
    fn message(&self) -> String;
}

/// Generic tool output: the flattened envelope plus a message and an
/// optional typed payload.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ToolOutput<D> {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,
}

impl<D> ToolOutput<D> {
    pub fn success(message: impl Into<String>, data: D, now: DateTime<Utc>) -> Self {
        Self { envelope: Envelope::ok(now), message: message.into(), data: Some(data) }
    }

    pub fn failure(message: impl Into<String>, error_type: impl Into<String>, now: DateTime<Utc>) -> Self {
        let message = message.into();
        Self {
            envelope: Envelope::failed(message.clone(), error_type, now),
            message,
            data: None,
        }
    }
}

impl<D> HasMessage for ToolOutput<D> {
    fn message(&self) -> String {
        self.message.clone()
    }
}

/// Wrapper whose `into_call_tool_result` publishes `T` as structured
/// content while keeping `T::message()` as the human-readable text.
pub struct Json<T>(pub T);

impl<T: JsonSchema> JsonSchema for Json<T> {
    fn schema_name() -> Cow<'static, str> {
        T::schema_name()
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        T::json_schema(generator)
    }
}

impl<T: Serialize + JsonSchema + HasMessage + 'static> IntoCallToolResult for Json<T> {
    fn into_call_tool_result(self) -> Result<CallToolResult, ErrorData> {
        let message = self.0.message();
        let value = serde_json::to_value(&self.0)
            .map_err(|err| ErrorData::internal_error(format!("failed to serialize tool output: {err}"), None))?;
        Ok(CallToolResult {
            content: vec![Content::text(message)],
            structured_content: Some(value),
            is_error: Some(false),
            meta: None,
        })
    }
}

// Per-tool payload types. One `Data` struct per operation named in spec §4.4.

#[derive(Debug, Serialize, JsonSchema)]
pub struct ProjectsData {
    pub projects: Vec<String>,
}
pub type ProjectsOutput = ToolOutput<ProjectsData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct ProjectData {
    pub project: String,
    pub schema: String,
}
pub type ProjectOutput = ToolOutput<ProjectData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct LockData {
    pub label: String,
    pub version: String,
    pub hash: String,
    pub preview: String,
    pub priority: String,
    pub embedded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branched_from: Option<String>,
}
pub type LockOutput = ToolOutput<LockData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct RecallData {
    pub content: String,
    pub version: String,
    pub preview: String,
    pub metadata: serde_json::Value,
}
pub type RecallOutput = ToolOutput<RecallData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct UnlockData {
    pub archived: usize,
    pub affected: Vec<AffectedVersion>,
}
#[derive(Debug, Serialize, JsonSchema)]
pub struct AffectedVersion {
    pub label: String,
    pub version: String,
}
pub type UnlockOutput = ToolOutput<UnlockData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchHitData {
    pub label: String,
    pub version: String,
    pub preview: String,
    pub priority: String,
    pub score: f32,
}
#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchData {
    pub results: Vec<SearchHitData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
pub type SearchOutput = ToolOutput<SearchData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct CheckData {
    pub matches: Vec<SearchHitData>,
}
pub type CheckOutput = ToolOutput<CheckData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct ContextTreeData {
    pub flat: Option<Vec<SearchHitData>>,
    pub grouped: Option<serde_json::Value>,
}
pub type ExploreOutput = ToolOutput<ContextTreeData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct DashboardData {
    pub counts_by_priority: serde_json::Value,
    pub total_contexts: usize,
    pub top_accessed: Vec<(String, i64)>,
    pub least_accessed: Vec<(String, i64)>,
    pub never_accessed: Vec<String>,
    pub stale_warnings: Vec<String>,
}
pub type DashboardOutput = ToolOutput<DashboardData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct HandoverData {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_ago: Option<f64>,
    pub content: serde_json::Value,
}
pub type HandoverOutput = ToolOutput<HandoverData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct SleepData {}
pub type SleepOutput = ToolOutput<SleepData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct WakeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handover: Option<HandoverData>,
    pub session_summary: serde_json::Value,
}
pub type WakeOutput = ToolOutput<WakeData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct BatchLockData {
    pub outcomes: Vec<serde_json::Value>,
}
pub type BatchLockOutput = ToolOutput<BatchLockData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct BatchRecallData {
    pub outcomes: Vec<serde_json::Value>,
}
pub type BatchRecallOutput = ToolOutput<BatchRecallData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExportData {
    pub schema_version: u32,
    pub project: String,
    pub contexts: serde_json::Value,
    pub exported_at: DateTime<Utc>,
}
pub type ExportOutput = ToolOutput<ExportData>;

#[derive(Debug, Serialize, JsonSchema)]
pub struct ImportData {
    pub imported: usize,
}
pub type ImportOutput = ToolOutput<ImportData>;
