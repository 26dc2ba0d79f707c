//! Postgres-backed [`ProjectRepository`], scoped to the control namespace.

use std::sync::Arc;

use async_trait::async_trait;
use dementia_domain::error::{Error, Result};
use dementia_domain::ports::database::{DatabaseExecutor, SqlParam};
use dementia_domain::ports::repositories::{ProjectRecord, ProjectRepository};

use crate::query_helpers;
use crate::row_convert::row_to_project_record;

pub struct PgProjectRepository {
    executor: Arc<dyn DatabaseExecutor>,
}

impl PgProjectRepository {
    pub fn new(executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn register(&self, sanitized_name: &str, display_name: &str) -> Result<ProjectRecord> {
        let conn = self.executor.borrow_control().await?;

        if let Some(existing) = self.find_by_sanitized(sanitized_name).await? {
            if existing.display_name != display_name {
                return Err(Error::validation(format!(
                    "project name '{display_name}' sanitizes to '{sanitized_name}', already taken by '{}'",
                    existing.display_name
                )));
            }
            return Ok(existing);
        }

        conn.execute(
            "INSERT INTO projects (sanitized_name, display_name) VALUES (?, ?)",
            &[
                SqlParam::String(sanitized_name.to_string()),
                SqlParam::String(display_name.to_string()),
            ],
        )
        .await?;

        Ok(ProjectRecord {
            sanitized_name: sanitized_name.to_string(),
            display_name: display_name.to_string(),
        })
    }

    async fn find_by_sanitized(&self, sanitized_name: &str) -> Result<Option<ProjectRecord>> {
        let conn = self.executor.borrow_control().await?;
        query_helpers::query_one(
            &conn,
            "SELECT * FROM projects WHERE sanitized_name = ?",
            &[SqlParam::String(sanitized_name.to_string())],
            row_to_project_record,
        )
        .await
    }

    async fn list(&self) -> Result<Vec<ProjectRecord>> {
        let conn = self.executor.borrow_control().await?;
        query_helpers::query_all(
            &conn,
            "SELECT * FROM projects ORDER BY sanitized_name",
            &[],
            row_to_project_record,
        )
        .await
    }
}
