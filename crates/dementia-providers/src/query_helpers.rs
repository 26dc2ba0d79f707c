//! Thin `query_one`/`query_all` wrappers over a [`SchemaPinnedConnection`],
//! decoding rows through a caller-supplied conversion function so each
//! repository method stays a one-liner.

use std::sync::Arc;

use dementia_domain::error::{Error, Result};
use dementia_domain::ports::database::{SchemaPinnedConnection, SqlParam, SqlRow};

pub async fn query_one<T, F>(
    conn: &Arc<dyn SchemaPinnedConnection>,
    sql: &str,
    params: &[SqlParam],
    convert: F,
) -> Result<Option<T>>
where
    F: FnOnce(&dyn SqlRow) -> Result<T>,
{
    match conn.query_one(sql, params).await? {
        Some(row) => Ok(Some(convert(row.as_ref())?)),
        None => Ok(None),
    }
}

pub async fn query_all<T, F>(
    conn: &Arc<dyn SchemaPinnedConnection>,
    sql: &str,
    params: &[SqlParam],
    convert: F,
) -> Result<Vec<T>>
where
    F: Fn(&dyn SqlRow) -> Result<T>,
{
    let rows = conn.query_all(sql, params).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(convert(row.as_ref()).map_err(|err| Error::query_with_source("failed to decode row", err))?);
    }
    Ok(out)
}
