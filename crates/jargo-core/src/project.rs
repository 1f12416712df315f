//! Project nodes and their session-scoped build state.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::coordinate::Coordinate;
use crate::descriptor::BuildSettings;

/// Index of a node in its session's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cached verdict of one up-to-date check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    #[default]
    Unknown,
    Fresh,
    Stale,
}

impl Freshness {
    pub fn from_fresh(fresh: bool) -> Self {
        if fresh {
            Self::Fresh
        } else {
            Self::Stale
        }
    }
}

/// The two independent up-to-date checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// Classes are current.
    Compiled,
    /// Classes are current and the archive is at least as new as every input.
    Packaged,
}

/// One build unit: a source tree with a descriptor, or an artifact from a
/// repository.
#[derive(Debug)]
pub struct ProjectNode {
    pub id: NodeId,
    /// Expanded identity. Declared dependencies stay unexpanded until resolved
    /// against this node.
    pub coordinate: Coordinate,
    pub directory: PathBuf,
    /// Descriptor file the node was created from, if any.
    pub descriptor_path: Option<PathBuf>,
    /// Compiled classes directory.
    pub output_dir: PathBuf,
    /// Final artifact: the archive written by a build or found in a repository.
    pub target: PathBuf,
    pub packaging: String,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Coordinate>,
    pub dependency_management: Vec<Coordinate>,
    pub modules: Vec<String>,
    pub repositories: Vec<String>,
    pub build: BuildSettings,
    pub parent: Option<NodeId>,
    pub build_from_source: bool,
    children: RwLock<Vec<NodeId>>,
    built: AtomicBool,
    compiled: Mutex<Freshness>,
    packaged: Mutex<Freshness>,
}

/// Everything needed to create a [`ProjectNode`].
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub coordinate: Coordinate,
    pub directory: PathBuf,
    pub descriptor_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub target: PathBuf,
    pub packaging: String,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Coordinate>,
    pub dependency_management: Vec<Coordinate>,
    pub modules: Vec<String>,
    pub repositories: Vec<String>,
    pub build: BuildSettings,
    pub parent: Option<NodeId>,
    pub build_from_source: bool,
}

impl ProjectNode {
    pub fn new(id: NodeId, spec: NodeSpec) -> Self {
        Self {
            id,
            coordinate: spec.coordinate,
            directory: spec.directory,
            descriptor_path: spec.descriptor_path,
            output_dir: spec.output_dir,
            target: spec.target,
            packaging: spec.packaging,
            properties: spec.properties,
            dependencies: spec.dependencies,
            dependency_management: spec.dependency_management,
            modules: spec.modules,
            repositories: spec.repositories,
            build: spec.build,
            parent: spec.parent,
            build_from_source: spec.build_from_source,
            children: RwLock::new(Vec::new()),
            built: AtomicBool::new(false),
            compiled: Mutex::new(Freshness::Unknown),
            packaged: Mutex::new(Freshness::Unknown),
        }
    }

    pub fn children(&self) -> Vec<NodeId> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add_child(&self, child: NodeId) {
        let mut children = self.children.write().unwrap_or_else(PoisonError::into_inner);
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Whether this node produces an archive (as opposed to `pom` aggregators).
    pub fn is_jar(&self) -> bool {
        matches!(self.packaging.as_str(), "jar" | "bundle" | "maven-plugin")
    }

    pub fn source_directory(&self) -> PathBuf {
        self.resolve_dir(
            self.build
                .source_directory
                .as_deref()
                .unwrap_or("src/main/java"),
        )
    }

    pub fn resource_directories(&self) -> Vec<PathBuf> {
        if self.build.resource_directories.is_empty() {
            vec![self.resolve_dir("src/main/resources")]
        } else {
            self.build
                .resource_directories
                .iter()
                .map(|d| self.resolve_dir(d))
                .collect()
        }
    }

    fn resolve_dir(&self, dir: &str) -> PathBuf {
        let path = Path::new(dir);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.directory.join(path)
        }
    }

    /// A node with neither sources nor resources only groups modules.
    pub fn is_aggregator(&self) -> bool {
        !self.source_directory().is_dir() && !self.resource_directories().iter().any(|d| d.is_dir())
    }

    pub fn is_built(&self) -> bool {
        self.built.load(Ordering::Acquire)
    }

    pub fn mark_built(&self) {
        self.built.store(true, Ordering::Release);
    }

    fn slot(&self, kind: CheckKind) -> &Mutex<Freshness> {
        match kind {
            CheckKind::Compiled => &self.compiled,
            CheckKind::Packaged => &self.packaged,
        }
    }

    pub fn freshness(&self, kind: CheckKind) -> Freshness {
        *self.slot(kind).lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a verdict unless one is already cached; returns the cached one.
    pub fn record_freshness(&self, kind: CheckKind, fresh: bool) -> Freshness {
        let mut slot = self.slot(kind).lock().unwrap_or_else(PoisonError::into_inner);
        if *slot == Freshness::Unknown {
            *slot = Freshness::from_fresh(fresh);
        }
        *slot
    }
}

impl fmt::Display for ProjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coordinate.gav())
    }
}
