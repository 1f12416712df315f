//! Core data types for the Jargo build engine.
//!
//! This crate defines the fundamental types shared by the resolver, the
//! staleness engine and the build orchestrator: dependency coordinates and
//! scopes, the Maven version order and ranges, project nodes with their
//! session-scoped freshness cache, parsed project descriptors, the
//! `${...}` expansion primitive, and user configuration.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod config;
pub mod coordinate;
pub mod descriptor;
pub mod project;
pub mod properties;
pub mod version;
