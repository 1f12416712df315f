//! Maven repository protocol: POM parsing, metadata, repository layout,
//! artifact download and checksum verification.

pub mod checksum;
pub mod download;
pub mod metadata;
pub mod pom;
pub mod repository;
