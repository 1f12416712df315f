//! Parsed project descriptors and the source they are loaded from.
//!
//! The engine never reads descriptor syntax itself; it asks a
//! [`DescriptorSource`] for an already-parsed [`ProjectDescriptor`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::coordinate::Coordinate;

/// File name of a project descriptor inside a project directory.
pub const DESCRIPTOR_FILE: &str = "pom.xml";

/// Reference to a parent descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Path of the parent directory relative to the child, if declared.
    pub relative_path: Option<String>,
}

impl ParentRef {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(&self.group_id, &self.artifact_id, Some(&self.version))
    }
}

/// Build section of a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSettings {
    pub source_directory: Option<String>,
    pub resource_directories: Vec<String>,
    /// Compiler `-source` level.
    pub source: Option<String>,
    /// Compiler `-target` level.
    pub target: Option<String>,
    pub main_class: Option<String>,
}

/// One descriptor with all profiles already applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Coordinate>,
    pub dependency_management: Vec<Coordinate>,
    pub modules: Vec<String>,
    pub repositories: Vec<String>,
    pub build: BuildSettings,
}

impl ProjectDescriptor {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: Some(group_id.to_string()),
            artifact_id: artifact_id.to_string(),
            version: Some(version.to_string()),
            ..Default::default()
        }
    }

    pub fn packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }
}

/// Supplier of parsed descriptors.
///
/// `load` receives the path of a descriptor file (`pom.xml` or a repository
/// `.pom`) and returns `Ok(None)` when no such file exists.
pub trait DescriptorSource: Send + Sync {
    fn load(&self, path: &Path) -> miette::Result<Option<ProjectDescriptor>>;

    /// Whether a descriptor exists at `path`, without parsing it if possible.
    fn exists(&self, path: &Path) -> bool {
        matches!(self.load(path), Ok(Some(_)))
    }
}

/// Descriptors held in memory, keyed by file path.
///
/// Lets the resolver and the build engine run without any descriptor syntax.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDescriptors {
    entries: HashMap<PathBuf, ProjectDescriptor>,
}

impl InMemoryDescriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, descriptor: ProjectDescriptor) {
        self.entries.insert(path.into(), descriptor);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, descriptor: ProjectDescriptor) -> Self {
        self.insert(path, descriptor);
        self
    }
}

impl DescriptorSource for InMemoryDescriptors {
    fn load(&self, path: &Path) -> miette::Result<Option<ProjectDescriptor>> {
        Ok(self.entries.get(path).cloned())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }
}
