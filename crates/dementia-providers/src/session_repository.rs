//! Postgres-backed [`SessionRepository`], scoped to the control namespace.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dementia_domain::entities::{Session, SessionSummary};
use dementia_domain::error::{Error, Result};
use dementia_domain::ports::database::{DatabaseExecutor, SqlParam};
use dementia_domain::ports::repositories::SessionRepository;
use dementia_domain::value_objects::SessionId;

use crate::query_helpers;
use crate::row_convert::row_to_session;

pub struct PgSessionRepository {
    executor: Arc<dyn DatabaseExecutor>,
}

impl PgSessionRepository {
    pub fn new(executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, id: &SessionId, project_name: &str) -> Result<Session> {
        let conn = self.executor.borrow_control().await?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO sessions (id, project_name, created_at, last_active, session_summary)
             VALUES (?, ?, ?::timestamptz, ?::timestamptz, ?)
             ON CONFLICT (id) DO NOTHING",
            &[
                SqlParam::String(id.as_str().to_string()),
                SqlParam::String(project_name.to_string()),
                SqlParam::String(now.to_rfc3339()),
                SqlParam::String(now.to_rfc3339()),
                SqlParam::Json(serde_json::to_value(SessionSummary::default())?),
            ],
        )
        .await?;

        query_helpers::query_one(
            &conn,
            "SELECT * FROM sessions WHERE id = ?",
            &[SqlParam::String(id.as_str().to_string())],
            row_to_session,
        )
        .await?
        .ok_or_else(|| Error::internal("session row missing immediately after insert"))
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        let conn = self.executor.borrow_control().await?;
        query_helpers::query_one(
            &conn,
            "SELECT * FROM sessions WHERE id = ?",
            &[SqlParam::String(id.as_str().to_string())],
            row_to_session,
        )
        .await
    }

    async fn update_project(&self, id: &SessionId, project_name: &str) -> Result<bool> {
        let conn = self.executor.borrow_control().await?;
        let affected = conn
            .execute(
                "UPDATE sessions SET project_name = ? WHERE id = ?",
                &[
                    SqlParam::String(project_name.to_string()),
                    SqlParam::String(id.as_str().to_string()),
                ],
            )
            .await?;
        Ok(affected > 0)
    }

    async fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Result<()> {
        let conn = self.executor.borrow_control().await?;
        conn.execute(
            "UPDATE sessions SET last_active = ?::timestamptz WHERE id = ?",
            &[SqlParam::String(now.to_rfc3339()), SqlParam::String(id.as_str().to_string())],
        )
        .await?;
        Ok(())
    }

    async fn update_summary(&self, id: &SessionId, summary: &SessionSummary) -> Result<()> {
        let conn = self.executor.borrow_control().await?;
        conn.execute(
            "UPDATE sessions SET session_summary = ? WHERE id = ?",
            &[
                SqlParam::Json(serde_json::to_value(summary)?),
                SqlParam::String(id.as_str().to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn cleanup_expired(&self, idle_cutoff: chrono::Duration, now: DateTime<Utc>) -> Result<Vec<SessionId>> {
        let conn = self.executor.borrow_control().await?;
        let cutoff = now - idle_cutoff;
        let rows = conn
            .query_all(
                "DELETE FROM sessions WHERE last_active < ?::timestamptz RETURNING id",
                &[SqlParam::String(cutoff.to_rfc3339())],
            )
            .await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row
                .try_get_string("id")?
                .ok_or_else(|| Error::internal("sessions.id was unexpectedly null"))?;
            ids.push(SessionId::new(id));
        }
        Ok(ids)
    }
}
