use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value_objects::SessionId;

/// Classification for a [`MemoryEntry`] in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Handover,
    Progress,
    Decision,
    Error,
}

impl MemoryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handover => "handover",
            Self::Progress => "progress",
            Self::Decision => "decision",
            Self::Error => "error",
        }
    }
}

/// A categorized event in the project's audit log, used by handover
/// retrieval (`category == handover`) and general auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MemoryEntry {
    pub id: i64,
    pub session_id: SessionId,
    pub category: MemoryCategory,
    pub content: serde_json::Value,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}
