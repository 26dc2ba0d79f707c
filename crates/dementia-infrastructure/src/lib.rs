//! Infrastructure layer for Dementia.
//!
//! Configuration, logging bootstrap, the project-hint cache, the
//! request-scoped session publishing mechanism, and the Postgres storage
//! adapter — the ambient concerns every other layer relies on but none of
//! them should know the implementation of.

pub mod cache;
pub mod config;
pub mod logging;
pub mod session_task;
pub mod storage;
