//! The archive-writing seam and manifest composition.

use std::path::PathBuf;

/// Main attributes of `META-INF/MANIFEST.MF`, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    pub const VERSION: &'static str = "Manifest-Version";
    pub const CREATED_BY: &'static str = "Created-By";
    pub const MAIN_CLASS: &'static str = "Main-Class";
    pub const CLASS_PATH: &'static str = "Class-Path";

    /// A manifest carrying only `Manifest-Version: 1.0`.
    pub fn new() -> Self {
        let mut manifest = Self::default();
        manifest.set(Self::VERSION, "1.0");
        manifest
    }

    /// Set `name`, replacing an existing value in place.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Serialized form: CRLF line endings, lines folded at 72 bytes with a
    /// leading space on continuation lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.attributes {
            let line = format!("{name}: {value}");
            let mut rest = line.as_str();
            let mut first = true;
            while !rest.is_empty() {
                let limit = if first { 72 } else { 71 };
                let mut cut = rest.len().min(limit);
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                if !first {
                    out.push(' ');
                }
                out.push_str(&rest[..cut]);
                out.push_str("\r\n");
                rest = &rest[cut..];
                first = false;
            }
        }
        out.push_str("\r\n");
        out
    }
}

/// One archive to write.
#[derive(Debug, Clone)]
pub struct PackageRequest {
    /// Compiled classes and copied resources; becomes the archive root.
    pub output_dir: PathBuf,
    pub manifest: Manifest,
    /// Extra files as `(archive name, file or directory on disk)`.
    /// A directory is added recursively below the given name.
    pub extra_entries: Vec<(String, PathBuf)>,
    pub destination: PathBuf,
}

/// Implemented by archive writers.
pub trait ArtifactWriter: Send + Sync {
    /// Write the archive described by `request` and return its path.
    fn package(&self, request: &PackageRequest) -> miette::Result<PathBuf>;
}
