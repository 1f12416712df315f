//! The resolution session: one per top-level invocation.
//!
//! Owns the node arena, the coordinate memo and the once-per-session
//! metadata refresh ledger. Every lookup goes through a per-key slot so that
//! concurrent requests for the same coordinate share a single lookup.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use jargo_core::config::SessionConfig;
use jargo_core::descriptor::DescriptorSource;
use jargo_core::project::{NodeId, NodeSpec, ProjectNode};
use jargo_core::version::{compare_versions, VersionRange};
use jargo_core::coordinate::Coordinate;
use jargo_maven::download::RepositoryFetcher;
use jargo_maven::repository::LocalRepository;

use crate::conflict::{ConflictReport, VersionConflict};

/// Outcome of a memoized lookup.
#[derive(Debug, Clone, Default)]
pub(crate) enum Memo {
    #[default]
    Unresolved,
    Found(NodeId),
    /// Nothing was found for `version`; `downloaded` records whether remote
    /// repositories were consulted.
    Missing {
        version: String,
        downloaded: bool,
    },
}

pub(crate) type MemoSlot = Arc<Mutex<Memo>>;

pub struct Session {
    pub(crate) config: SessionConfig,
    pub(crate) descriptors: Arc<dyn DescriptorSource>,
    pub(crate) fetcher: Option<Arc<dyn RepositoryFetcher>>,
    pub(crate) local: LocalRepository,
    nodes: RwLock<Vec<Arc<ProjectNode>>>,
    pub(crate) by_directory: Mutex<HashMap<PathBuf, NodeId>>,
    pub(crate) system_nodes: Mutex<HashMap<PathBuf, NodeId>>,
    memo: Mutex<HashMap<String, MemoSlot>>,
    refreshed: Mutex<HashSet<PathBuf>>,
    pub(crate) workspaces_scanned: Mutex<bool>,
    conflicts: Mutex<ConflictReport>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        descriptors: Arc<dyn DescriptorSource>,
        fetcher: Option<Arc<dyn RepositoryFetcher>>,
    ) -> Self {
        let local = LocalRepository::new(config.local_repository.clone());
        Self {
            config,
            descriptors,
            fetcher,
            local,
            nodes: RwLock::new(Vec::new()),
            by_directory: Mutex::new(HashMap::new()),
            system_nodes: Mutex::new(HashMap::new()),
            memo: Mutex::new(HashMap::new()),
            refreshed: Mutex::new(HashSet::new()),
            workspaces_scanned: Mutex::new(false),
            conflicts: Mutex::new(ConflictReport::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn local_repository(&self) -> &LocalRepository {
        &self.local
    }

    pub fn node(&self, id: NodeId) -> Arc<ProjectNode> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)[id.0].clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn add_node(&self, spec: NodeSpec) -> NodeId {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        let id = NodeId(nodes.len());
        nodes.push(Arc::new(ProjectNode::new(id, spec)));
        id
    }

    /// Walk parent links to the top of `id`'s tree.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        let mut steps = 0;
        while let Some(parent) = self.node(current).parent {
            current = parent;
            steps += 1;
            if steps > self.node_count() {
                break;
            }
        }
        current
    }

    /// `id` followed by its ancestors, nearest first.
    pub fn ancestry(&self, id: NodeId) -> Vec<Arc<ProjectNode>> {
        let mut chain = vec![self.node(id)];
        while let Some(parent) = chain.last().and_then(|n| n.parent) {
            if chain.iter().any(|n| n.id == parent) {
                break;
            }
            chain.push(self.node(parent));
        }
        chain
    }

    pub(crate) fn memo_slot(&self, key: &str) -> MemoSlot {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Memoize a source-built node unless a newer one is already known.
    pub(crate) fn register(&self, id: NodeId) {
        let coordinate = self.node(id).coordinate.clone();
        let slot = self.memo_slot(&coordinate.key());
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Memo::Found(existing) = &*entry {
            let existing = self.node(*existing);
            let newer = compare_versions(
                coordinate.get_version().unwrap_or_default(),
                existing.coordinate.get_version().unwrap_or_default(),
            );
            if newer.is_lt() {
                return;
            }
        }
        *entry = Memo::Found(id);
    }

    /// Whether memoized node `id` can stand in for a request of `dep`.
    ///
    /// A range is satisfied by any version inside it; an exact request by any
    /// version at least as new.
    pub(crate) fn satisfies(&self, id: NodeId, dep: &Coordinate) -> miette::Result<bool> {
        let node = self.node(id);
        let have = node.coordinate.get_version().unwrap_or_default();
        let Some(wanted) = dep.version.as_deref() else {
            return Ok(true);
        };
        if let Some(range) = VersionRange::parse(wanted)? {
            return Ok(range.contains(&jargo_core::version::MavenVersion::parse(have)));
        }
        Ok(!compare_versions(dep.get_version().unwrap_or(wanted), have).is_gt())
    }

    /// Returns `true` the first time it is called for `path` in this session.
    pub(crate) fn mark_refreshed(&self, path: PathBuf) -> bool {
        self.refreshed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path)
    }

    pub(crate) fn record_conflict(&self, conflict: VersionConflict) {
        tracing::debug!("version conflict: {conflict}");
        self.conflicts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(conflict);
    }

    /// Conflicts recorded so far.
    pub fn conflicts(&self) -> ConflictReport {
        self.conflicts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether remote fetches are possible for a request.
    pub(crate) fn may_download(&self, requested: bool) -> bool {
        self.fetcher.is_some() && self.config.may_download(requested)
    }
}
