//! Dependency wiring for the `dementia` binary (spec §6 "External
//! Interfaces" ambient additions).
//!
//! Kept as a thin library so `tests/cli.rs` can exercise the wiring and
//! config-validation helpers without spawning the binary as a subprocess.

pub mod wiring;
