//! Use cases: one module per Memory Core/Session Store responsibility.

pub mod memory_core_service;
pub mod project_service;
pub mod session_service;
