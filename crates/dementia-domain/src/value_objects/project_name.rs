use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_SANITIZED_LEN: usize = 32;

/// Sanitize a user-supplied project name into a namespace-safe form:
/// lowercase, non-`[a-z0-9]` runs collapsed to a single `_`, leading and
/// trailing `_` stripped, truncated to 32 characters.
///
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize_project_name(raw: &str) -> Result<String> {
    let lower = raw.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut last_was_underscore = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    let truncated: String = trimmed.chars().take(MAX_SANITIZED_LEN).collect();
    let truncated = truncated.trim_end_matches('_');

    if truncated.is_empty() {
        return Err(Error::validation(format!(
            "project name '{raw}' sanitizes to an empty string"
        )));
    }
    Ok(truncated.to_string())
}

/// A sanitized, namespace-safe project name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ProjectName(String);

impl ProjectName {
    /// Sanitize `raw` and wrap the result.
    pub fn from_raw(raw: &str) -> Result<Self> {
        sanitize_project_name(raw).map(Self)
    }

    /// Wrap an already-sanitized name without re-validating, for
    /// round-tripping values read back from storage.
    pub fn from_sanitized(sanitized: impl Into<String>) -> Self {
        Self(sanitized.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The database namespace name for this project: `dementia_<name>`.
    pub fn namespace(&self) -> String {
        format!("dementia_{}", self.0)
    }
}

impl std::fmt::Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
