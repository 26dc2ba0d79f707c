use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value_objects::{SessionId, PENDING_PROJECT};

/// Structured snapshot of a session's in-progress work, written by `sleep`
/// and read back by `get_last_handover` / `wake_up`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionSummary {
    #[serde(default)]
    pub work_done: Vec<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub important_context: serde_json::Map<String, serde_json::Value>,
}

/// An MCP conversation thread.
///
/// Exactly one row exists per logical session id. `project_name` is the
/// sentinel [`PENDING_PROJECT`] until a project is selected; every
/// non-whitelisted tool requires it to have moved past that sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Session {
    pub id: SessionId,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub session_summary: SessionSummary,
}

impl Session {
    /// Create a fresh session with no project bound yet.
    pub fn pending(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            project_name: PENDING_PROJECT.to_string(),
            created_at: now,
            last_active: now,
            session_summary: SessionSummary::default(),
        }
    }

    /// Whether this session has selected a project yet.
    pub fn has_project(&self) -> bool {
        self.project_name != PENDING_PROJECT
    }

    /// Whether the session is still within the "current" handover window.
    pub fn is_current(&self, now: DateTime<Utc>, idle_cutoff: chrono::Duration) -> bool {
        now - self.last_active < idle_cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_session_has_sentinel_project() {
        let now = Utc::now();
        let session = Session::pending(SessionId::new("s1"), now);
        assert!(!session.has_project());
        assert_eq!(session.project_name, PENDING_PROJECT);
    }

    #[test]
    fn is_current_respects_cutoff() {
        let now = Utc::now();
        let mut session = Session::pending(SessionId::new("s1"), now);
        session.last_active = now - chrono::Duration::minutes(10);
        assert!(session.is_current(now, chrono::Duration::hours(2)));

        session.last_active = now - chrono::Duration::hours(3);
        assert!(!session.is_current(now, chrono::Duration::hours(2)));
    }
}
