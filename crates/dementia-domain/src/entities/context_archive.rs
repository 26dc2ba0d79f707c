use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::context_lock::ContextMetadata;
use crate::value_objects::{ContextVersion, Priority, SessionId};

/// Soft-delete mirror of a [`ContextLock`](super::ContextLock), created by
/// `unlock_context`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContextArchive {
    pub id: i64,
    pub original_id: i64,
    pub session_id: SessionId,
    pub label: String,
    pub version: ContextVersion,
    pub content: String,
    pub content_hash: String,
    pub preview: String,
    pub key_concepts: Vec<String>,
    pub priority: Priority,
    pub metadata: ContextMetadata,
    pub locked_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: i64,
    pub deleted_at: DateTime<Utc>,
    pub delete_reason: String,
}
