//! Tracing bootstrap. Single entry point for wiring the process's log
//! subscriber; every other layer just calls `tracing::{info,warn,error}!`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `json` selects structured JSON output (suited to production log
/// shipping); the human-readable formatter is used otherwise (suited to a
/// developer's terminal). The filter defaults to `info` and honors
/// `RUST_LOG` when set.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Log a tool invocation at `info`, masking the session id to its first 8
/// characters per the logging contract.
pub fn log_tool_call(tool: &str, session_id: &dementia_domain::value_objects::SessionId, project: Option<&str>) {
    tracing::info!(
        tool,
        session_id = session_id.masked(),
        project = project.unwrap_or("<pending>"),
        "tool invoked"
    );
}
