//! Compilation and packaging for Jargo: source scanning, up-to-date checks,
//! the compiler and archive-writer seams with their `javac` and jar
//! implementations, classpath assembly and build planning.

pub mod artifact;
pub mod classpath;
pub mod compiler;
pub mod jar;
pub mod javac;
pub mod plan;
pub mod sources;
pub mod staleness;
