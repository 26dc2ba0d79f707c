use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Importance classification for a [`ContextLock`](crate::entities::ContextLock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Must be surfaced by `check_contexts` unconditionally; blocks
    /// unforced `unlock_context`.
    AlwaysCheck,
    /// Surfaced prominently but does not block unlock.
    Important,
    /// Default: retrievable but not proactively surfaced.
    Reference,
}

impl Priority {
    /// Auto-detect priority from content keywords, per the lock_context
    /// contract: "always"/"never"/"must" (case-insensitive) wins first,
    /// then "important"/"critical"/"required", else `reference`.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();
        const ALWAYS_TOKENS: [&str; 3] = ["always", "never", "must"];
        const IMPORTANT_TOKENS: [&str; 3] = ["important", "critical", "required"];

        if ALWAYS_TOKENS.iter().any(|t| lower.contains(t)) {
            Self::AlwaysCheck
        } else if IMPORTANT_TOKENS.iter().any(|t| lower.contains(t)) {
            Self::Important
        } else {
            Self::Reference
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysCheck => "always_check",
            Self::Important => "important",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "always_check" => Ok(Self::AlwaysCheck),
            "important" => Ok(Self::Important),
            "reference" => Ok(Self::Reference),
            other => Err(Error::validation(format!("invalid priority: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_always_check_tokens() {
        assert_eq!(
            Priority::detect("You must always validate input"),
            Priority::AlwaysCheck
        );
    }

    #[test]
    fn detects_important_tokens() {
        assert_eq!(
            Priority::detect("Critical path for checkout"),
            Priority::Important
        );
    }

    #[test]
    fn defaults_to_reference() {
        assert_eq!(Priority::detect("Random note"), Priority::Reference);
    }

    #[test]
    fn rejects_unknown_priority_strings() {
        assert!("urgent".parse::<Priority>().is_err());
    }
}
