//! Error taxonomy shared across every layer.
//!
//! One flat enum rather than per-crate error types: every operation in the
//! memory engine ultimately surfaces through the tool envelope as
//! `{success:false, error, error_type}`, and `error_type` is this enum's
//! variant name in snake_case (see `Error::kind`).

use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the memory engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing/invalid argument, empty or invalid project name, unknown
    /// priority. Never retried.
    #[error("validation error: {message}")]
    Validation {
        /// Description of what failed validation.
        message: String,
    },

    /// A non-whitelisted tool was reached with `session.project_name ==
    /// __PENDING__`.
    #[error("no project selected for this session; call select_project_for_session first")]
    ProjectNotSelected,

    /// The resolved project namespace does not exist for a read.
    #[error("unknown project: {name}")]
    ProjectUnknown {
        /// The sanitized project name that has no namespace.
        name: String,
    },

    /// Topic/version absent.
    #[error("not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// A destructive operation on an `always_check` context was attempted
    /// without `force`.
    #[error("confirmation required: {message}")]
    ConfirmationRequired {
        /// Explanation of what requires confirmation.
        message: String,
    },

    /// Concurrent lock on the same `(label, version)` exhausted its retry
    /// budget.
    #[error("version collision on '{label}' after {attempts} attempts")]
    VersionCollision {
        /// The context label in contention.
        label: String,
        /// Number of retries attempted before giving up.
        attempts: u32,
    },

    /// Connection acquisition timeout, statement timeout, or broken
    /// connection. Never retried internally; callers may retry.
    #[error("transient I/O error: {message}")]
    TransientIo {
        /// Description of the transient failure.
        message: String,
        /// Optional underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An external collaborator (embedding/LLM service) is unreachable;
    /// the read path degraded rather than failed outright.
    #[error("external service degraded: {message}")]
    ExternalDegraded {
        /// Description of the degraded collaborator.
        message: String,
    },

    /// Unexpected internal failure; logged with its full chain, surfaced
    /// to callers with only the error_type.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal failure.
        message: String,
    },

    /// A query could not be executed as written (e.g. mixed placeholder
    /// styles, schema-pin failure surfaced as a query error).
    #[error("query error: {message}")]
    Query {
        /// Description of the query failure.
        message: String,
        /// Optional underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// I/O error (config file reads, migration file reads, ...).
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// The `error_type` string surfaced in the tool response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::ProjectNotSelected => "project_not_selected",
            Self::ProjectUnknown { .. } => "project_unknown",
            Self::NotFound { .. } => "not_found",
            Self::ConfirmationRequired { .. } => "confirmation_required",
            Self::VersionCollision { .. } => "version_collision",
            Self::TransientIo { .. } => "transient_io",
            Self::ExternalDegraded { .. } => "external_degraded",
            Self::Internal { .. } => "internal",
            Self::Query { .. } => "query_error",
            Self::Json { .. } => "internal",
            Self::Io { .. } => "internal",
        }
    }

    /// Build a validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a not-found error.
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Build a confirmation-required error.
    pub fn confirmation_required<S: Into<String>>(message: S) -> Self {
        Self::ConfirmationRequired {
            message: message.into(),
        }
    }

    /// Build a transient I/O error.
    pub fn transient_io<S: Into<String>>(message: S) -> Self {
        Self::TransientIo {
            message: message.into(),
            source: None,
        }
    }

    /// Build a transient I/O error with an underlying cause.
    pub fn transient_io_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::TransientIo {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build an internal error.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Build a query error.
    pub fn query<S: Into<String>>(message: S) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    /// Build a query error with an underlying cause.
    pub fn query_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build an external-degraded error.
    pub fn external_degraded<S: Into<String>>(message: S) -> Self {
        Self::ExternalDegraded {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_taxonomy_name() {
        assert_eq!(Error::validation("x").kind(), "validation");
        assert_eq!(Error::ProjectNotSelected.kind(), "project_not_selected");
        assert_eq!(
            Error::ProjectUnknown { name: "x".into() }.kind(),
            "project_unknown"
        );
        assert_eq!(Error::not_found("x").kind(), "not_found");
        assert_eq!(
            Error::confirmation_required("x").kind(),
            "confirmation_required"
        );
        assert_eq!(
            Error::VersionCollision {
                label: "x".into(),
                attempts: 3
            }
            .kind(),
            "version_collision"
        );
        assert_eq!(Error::transient_io("x").kind(), "transient_io");
        assert_eq!(Error::external_degraded("x").kind(), "external_degraded");
        assert_eq!(Error::internal("x").kind(), "internal");
    }
}
