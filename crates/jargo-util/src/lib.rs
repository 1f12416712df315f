//! Shared utilities for the Jargo build engine.
//!
//! This crate provides cross-cutting concerns used by all other Jargo crates:
//! error types, filesystem helpers, checksum hashing, process spawning,
//! and terminal status lines.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;
