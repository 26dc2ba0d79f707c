use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A session identifier.
///
/// Unlike every other identifier in this crate, `SessionId` wraps an
/// opaque, caller-supplied string rather than a UUID: MCP transports mint
/// their own session tokens, and the engine must accept whatever string
/// shape a given transport chooses. When no transport-supplied id is
/// available (e.g. a fresh stdio connection), the middleware synthesizes
/// one with [`SessionId::generate`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing transport-supplied token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Synthesize a fresh session id for transports that do not supply one.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the underlying token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first 8 characters, for logging without leaking the full token.
    pub fn masked(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_truncates_to_eight_chars() {
        let id = SessionId::new("abcdefghijklmnop");
        assert_eq!(id.masked(), "abcdefgh");
    }

    #[test]
    fn masked_handles_short_ids() {
        let id = SessionId::new("abc");
        assert_eq!(id.masked(), "abc");
    }

    #[test]
    fn generate_produces_distinct_ids() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
