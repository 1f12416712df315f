//! Depth-first, nearest-wins transitive dependency resolution.
//!
//! A dependency reached first claims its (artifactId, groupId, classifier)
//! identity; later requests for the same identity are dropped, and recorded
//! as conflicts when they asked for a different version.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use jargo_core::coordinate::{Coordinate, Scope, SortKey};
use jargo_core::project::NodeId;
use jargo_util::errors::JargoError;

use crate::conflict::VersionConflict;
use crate::session::Session;

/// Deepest dependency chain accepted before resolution is aborted.
pub const MAX_DEPTH: usize = 256;

/// Which dependencies a resolution walk follows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveFilter {
    pub exclude_optionals: bool,
    pub download_automatically: bool,
    pub exclude_scopes: BTreeSet<Scope>,
    /// Drop required dependencies that cannot be located instead of failing.
    pub tolerate_missing: bool,
}

impl ResolveFilter {
    pub fn new(exclude_optionals: bool, download_automatically: bool) -> Self {
        Self {
            exclude_optionals,
            download_automatically,
            ..Default::default()
        }
    }

    pub fn excluding(mut self, scopes: impl IntoIterator<Item = Scope>) -> Self {
        self.exclude_scopes.extend(scopes);
        self
    }

    pub fn tolerating_missing(mut self) -> Self {
        self.tolerate_missing = true;
        self
    }

    /// Dependencies whose freshness and builds a project build depends on.
    pub fn build(download: bool) -> Self {
        Self::new(true, download).excluding([Scope::Test])
    }

    /// The compile classpath (`forCompile`) or the runtime classpath.
    pub fn classpath(for_compile: bool, download: bool) -> Self {
        let second = if for_compile {
            Scope::Runtime
        } else {
            Scope::Provided
        };
        Self::new(true, download).excluding([Scope::Test, second])
    }

    pub fn is_excluded(&self, scope: Scope) -> bool {
        self.exclude_scopes.contains(&scope)
    }
}

/// One member of a resolved set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub node: NodeId,
    /// The located node's coordinate, with any range or snapshot pinned.
    pub coordinate: Coordinate,
    pub scope: Scope,
    /// Node whose declaration pulled this entry in.
    pub via: NodeId,
}

impl fmt::Display for ResolvedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.coordinate.gav(), self.scope)
    }
}

type Identity = (String, String, Option<String>);

/// Resolution result ordered by artifactId, groupId, version, classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    entries: BTreeMap<SortKey, ResolvedEntry>,
    identities: HashMap<Identity, NodeId>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` unless its identity is already taken. Returns whether
    /// it was inserted.
    pub fn insert(&mut self, entry: ResolvedEntry) -> bool {
        let identity = entry.coordinate.identity();
        if self.identities.contains_key(&identity) {
            return false;
        }
        self.identities.insert(identity, entry.node);
        self.entries.insert(entry.coordinate.sort_key(), entry);
        true
    }

    /// The node holding `coordinate`'s identity, if any.
    pub fn holder(&self, coordinate: &Coordinate) -> Option<NodeId> {
        self.identities.get(&coordinate.identity()).copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.identities.values().any(|n| *n == node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.values()
    }

    /// Node ids in set order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.entries.values().map(|e| e.node).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `groupId:artifactId:version[:classifier] (scope)`, one per entry.
    pub fn listing(&self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl Session {
    /// Resolve the transitive dependencies of `root` under `filter`.
    pub fn resolve(&self, root: NodeId, filter: &ResolveFilter) -> miette::Result<ResolvedSet> {
        let mut result = ResolvedSet::new();
        self.resolve_into(root, filter, &BTreeSet::new(), &mut result, 0)?;
        tracing::debug!("resolved {} dependencies of {}", result.len(), self.node(root));
        Ok(result)
    }

    fn resolve_into(
        &self,
        id: NodeId,
        filter: &ResolveFilter,
        exclusions: &BTreeSet<String>,
        result: &mut ResolvedSet,
        depth: usize,
    ) -> miette::Result<()> {
        let node = self.node(id);
        if depth > MAX_DEPTH {
            return Err(JargoError::Resolution {
                message: format!(
                    "dependency chain below {} is deeper than {MAX_DEPTH} levels",
                    node
                ),
            }
            .into());
        }

        for dependency in &node.dependencies {
            if filter.exclude_optionals && dependency.optional {
                continue;
            }
            let scope = match self.expand_opt(id, dependency.scope.as_deref())? {
                None => Scope::Compile,
                Some(name) => match Scope::parse(&name) {
                    Some(scope) => scope,
                    None => {
                        tracing::warn!(
                            "unknown scope '{name}' on {} in {node}; treating it as compile",
                            dependency.artifact_id
                        );
                        Scope::Compile
                    }
                },
            };
            if filter.is_excluded(scope) {
                continue;
            }

            let expanded = self.expand_coordinate(id, dependency)?;
            if exclusions.contains(&expanded.group_artifact()) {
                tracing::debug!("{} excluded below {node}", expanded.group_artifact());
                continue;
            }
            let mut carried = exclusions.clone();
            carried.extend(expanded.exclusions.iter().cloned());
            if let Some(group) = expanded.group_id.as_deref() {
                carried.extend(self.management_exclusions(id, group, &expanded.artifact_id)?);
            }

            let Some(target) = self.locate(id, &expanded, scope, filter)? else {
                continue;
            };

            let located = self.node(target);
            if let Some(holder) = result.holder(&located.coordinate) {
                if holder != target {
                    let resolved = self.node(holder);
                    if resolved.coordinate.get_version() != located.coordinate.get_version() {
                        self.record_conflict(VersionConflict {
                            group: located.coordinate.group_id.clone().unwrap_or_default(),
                            artifact: located.coordinate.artifact_id.clone(),
                            requested: located.coordinate.get_version().unwrap_or_default().to_string(),
                            resolved: resolved.coordinate.get_version().unwrap_or_default().to_string(),
                            dependent: node.coordinate.gav(),
                        });
                    }
                }
                continue;
            }
            result.insert(ResolvedEntry {
                node: target,
                coordinate: located.coordinate.clone(),
                scope,
                via: id,
            });
            self.resolve_into(target, filter, &carried, result, depth + 1)?;
        }
        Ok(())
    }

    /// Find the node for an expanded dependency of `id`, applying the
    /// missing-dependency policy.
    fn locate(
        &self,
        id: NodeId,
        expanded: &Coordinate,
        scope: Scope,
        filter: &ResolveFilter,
    ) -> miette::Result<Option<NodeId>> {
        if let Some(path) = expanded.system_path.as_deref() {
            let file = Path::new(path);
            if file.exists() {
                return Ok(Some(self.system_node(expanded, file)));
            }
        }

        let droppable = expanded.optional
            || (scope == Scope::Provided && expanded.version.is_none());
        let found = match self.find_node(Some(id), expanded, filter.download_automatically) {
            Ok(found) => found,
            Err(e) if droppable || filter.tolerate_missing => {
                tracing::warn!("dropping {} of {}: {e}", expanded.gav(), self.node(id));
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if found.is_some() || droppable {
            return Ok(found);
        }
        if filter.tolerate_missing {
            tracing::warn!("{} of {} not found", expanded.gav(), self.node(id));
            return Ok(None);
        }
        Err(JargoError::MissingDependency {
            coordinate: expanded.gav(),
            dependent: self.node(id).coordinate.gav(),
        }
        .into())
    }
}
