//! Provider implementations for Dementia.
//!
//! Concrete `dementia-domain` ports over Postgres (via the infrastructure
//! layer's `DatabaseExecutor`) and over HTTP (the embedding service).
//! Nothing here knows about MCP, tool schemas, or session middleware —
//! that belongs to `dementia-server`.

pub mod context_repository;
pub mod embedding;
pub mod project_repository;
mod query_helpers;
mod row_convert;
pub mod session_repository;

pub use context_repository::PgContextRepositoryFactory;
pub use embedding::HttpEmbeddingProvider;
pub use project_repository::PgProjectRepository;
pub use session_repository::PgSessionRepository;
