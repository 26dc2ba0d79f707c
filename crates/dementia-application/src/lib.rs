//! Application layer for Dementia.
//!
//! Use cases orchestrate domain ports into the operations named by the
//! tool surface, but know nothing about MCP, HTTP, or SQL.

pub mod use_cases;
