use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value_objects::{ContextVersion, Priority, SessionId};

/// Metadata carried alongside a [`ContextLock`], free-form beyond the
/// fields the engine itself reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContextMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branched_from: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An immutable, versioned knowledge artifact.
///
/// Rows are never updated in place except for access-tracking fields
/// (`last_accessed`, `access_count`); superseding content is inserted as a
/// new version. `(label, version)` is unique within a project namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContextLock {
    pub id: i64,
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
    pub embedding_vector: Option<Vec<f32>>,
}

impl ContextLock {
    /// Record a read for access-tracking purposes.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
        self.access_count += 1;
    }
}
