//! Domain entities.

mod context_archive;
mod context_lock;
mod memory_entry;
mod session;

pub use context_archive::ContextArchive;
pub use context_lock::{ContextLock, ContextMetadata};
pub use memory_entry::{MemoryCategory, MemoryEntry};
pub use session::{Session, SessionSummary};
