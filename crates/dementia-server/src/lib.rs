//! MCP tool surface and session middleware for Dementia.
//!
//! This crate is the only one aware of MCP request/response types (spec
//! §4.5): it translates `rmcp` tool calls into calls against the
//! application layer's use-case services and back into the response
//! envelope named in spec §6.

pub mod requests;
pub mod responses;
pub mod server;

pub use server::DementiaServer;
