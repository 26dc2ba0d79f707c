//! Value objects: small, validated types with no identity of their own.

mod context_version;
mod priority;
mod project_name;
mod session_id;

pub use context_version::ContextVersion;
pub use priority::Priority;
pub use project_name::{sanitize_project_name, ProjectName};
pub use session_id::SessionId;

/// Sentinel project binding meaning "no project selected yet".
pub const PENDING_PROJECT: &str = "__PENDING__";
