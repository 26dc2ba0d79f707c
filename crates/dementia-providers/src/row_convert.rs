//! Row -> entity conversion. Isolated here so repository methods read as
//! "build SQL, decode rows" with no inline `serde_json` plumbing.

use std::str::FromStr;

use dementia_domain::entities::{
    ContextArchive, ContextLock, ContextMetadata, MemoryCategory, MemoryEntry, Session, SessionSummary,
};
use dementia_domain::error::{Error, Result};
use dementia_domain::ports::database::SqlRow;
use dementia_domain::ports::repositories::ProjectRecord;
use dementia_domain::value_objects::{ContextVersion, Priority, SessionId};

fn required_string(row: &dyn SqlRow, column: &str) -> Result<String> {
    row.try_get_string(column)?
        .ok_or_else(|| Error::internal(format!("column '{column}' was unexpectedly null")))
}

fn required_i64(row: &dyn SqlRow, column: &str) -> Result<i64> {
    row.try_get_i64(column)?
        .ok_or_else(|| Error::internal(format!("column '{column}' was unexpectedly null")))
}

fn required_timestamp(row: &dyn SqlRow, column: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    row.try_get_timestamp(column)?
        .ok_or_else(|| Error::internal(format!("column '{column}' was unexpectedly null")))
}

fn required_json(row: &dyn SqlRow, column: &str) -> Result<serde_json::Value> {
    row.try_get_json(column)?
        .ok_or_else(|| Error::internal(format!("column '{column}' was unexpectedly null")))
}

fn version(row: &dyn SqlRow) -> Result<ContextVersion> {
    let major = required_i64(row, "version_major")? as u32;
    let minor = required_i64(row, "version_minor")? as u32;
    Ok(ContextVersion::new(major, minor))
}

fn priority(row: &dyn SqlRow) -> Result<Priority> {
    Priority::from_str(&required_string(row, "priority")?)
}

fn key_concepts(row: &dyn SqlRow) -> Result<Vec<String>> {
    let value = required_json(row, "key_concepts")?;
    serde_json::from_value(value).map_err(|err| Error::internal(format!("invalid key_concepts JSON: {err}")))
}

fn metadata(row: &dyn SqlRow) -> Result<ContextMetadata> {
    let value = required_json(row, "metadata")?;
    serde_json::from_value(value).map_err(|err| Error::internal(format!("invalid metadata JSON: {err}")))
}

fn embedding_vector(row: &dyn SqlRow) -> Result<Option<Vec<f32>>> {
    match row.try_get_json("embedding_vector")? {
        Some(value) => {
            serde_json::from_value(value).map_err(|err| Error::internal(format!("invalid embedding JSON: {err}")))
        }
        None => Ok(None),
    }
}

pub fn row_to_context_lock(row: &dyn SqlRow) -> Result<ContextLock> {
    Ok(ContextLock {
        id: required_i64(row, "id")?,
        session_id: SessionId::new(required_string(row, "session_id")?),
        label: required_string(row, "label")?,
        version: version(row)?,
        content: required_string(row, "content")?,
        content_hash: required_string(row, "content_hash")?,
        preview: required_string(row, "preview")?,
        key_concepts: key_concepts(row)?,
        priority: priority(row)?,
        metadata: metadata(row)?,
        locked_at: required_timestamp(row, "locked_at")?,
        last_accessed: required_timestamp(row, "last_accessed")?,
        access_count: required_i64(row, "access_count")?,
        embedding_vector: embedding_vector(row)?,
    })
}

pub fn row_to_context_archive(row: &dyn SqlRow) -> Result<ContextArchive> {
    Ok(ContextArchive {
        id: required_i64(row, "id")?,
        original_id: required_i64(row, "original_id")?,
        session_id: SessionId::new(required_string(row, "session_id")?),
        label: required_string(row, "label")?,
        version: version(row)?,
        content: required_string(row, "content")?,
        content_hash: required_string(row, "content_hash")?,
        preview: required_string(row, "preview")?,
        key_concepts: key_concepts(row)?,
        priority: priority(row)?,
        metadata: metadata(row)?,
        locked_at: required_timestamp(row, "locked_at")?,
        last_accessed: required_timestamp(row, "last_accessed")?,
        access_count: required_i64(row, "access_count")?,
        deleted_at: required_timestamp(row, "deleted_at")?,
        delete_reason: required_string(row, "delete_reason")?,
    })
}

pub fn row_to_memory_entry(row: &dyn SqlRow) -> Result<MemoryEntry> {
    let category = match required_string(row, "category")?.as_str() {
        "handover" => MemoryCategory::Handover,
        "progress" => MemoryCategory::Progress,
        "decision" => MemoryCategory::Decision,
        "error" => MemoryCategory::Error,
        other => return Err(Error::internal(format!("unknown memory category '{other}'"))),
    };
    let metadata = required_json(row, "metadata")?;
    let metadata = match metadata {
        serde_json::Value::Object(map) => map,
        _ => return Err(Error::internal("memory_entries.metadata was not a JSON object")),
    };
    Ok(MemoryEntry {
        id: required_i64(row, "id")?,
        session_id: SessionId::new(required_string(row, "session_id")?),
        category,
        content: required_json(row, "content")?,
        metadata,
        timestamp: required_timestamp(row, "timestamp")?,
    })
}

pub fn row_to_session(row: &dyn SqlRow) -> Result<Session> {
    let summary_value = required_json(row, "session_summary")?;
    let session_summary: SessionSummary = serde_json::from_value(summary_value)
        .map_err(|err| Error::internal(format!("invalid session_summary JSON: {err}")))?;
    Ok(Session {
        id: SessionId::new(required_string(row, "id")?),
        project_name: required_string(row, "project_name")?,
        created_at: required_timestamp(row, "created_at")?,
        last_active: required_timestamp(row, "last_active")?,
        session_summary,
    })
}

pub fn row_to_project_record(row: &dyn SqlRow) -> Result<ProjectRecord> {
    Ok(ProjectRecord {
        sanitized_name: required_string(row, "sanitized_name")?,
        display_name: required_string(row, "display_name")?,
    })
}
