//! Property and version resolution against a node's parent chain.

use std::collections::BTreeMap;
use std::path::Path;

use jargo_core::coordinate::Coordinate;
use jargo_core::descriptor::DESCRIPTOR_FILE;
use jargo_core::project::NodeId;
use jargo_core::properties::{expand_opt, expand_with};

use crate::session::Session;

/// The facts a property lookup needs about one node.
///
/// Exists separately from `ProjectNode` so a descriptor's coordinate can be
/// expanded before its node is created.
pub(crate) struct PropertyScope<'a> {
    pub properties: &'a BTreeMap<String, String>,
    pub directory: &'a Path,
    pub coordinate: &'a Coordinate,
    pub parent: Option<NodeId>,
}

impl Session {
    /// Value of property `name` as seen from node `id`.
    ///
    /// Lookup order: configured overrides, the node's own properties,
    /// built-in properties, then the parent chain.
    pub fn get_property(&self, id: NodeId, name: &str) -> Option<String> {
        let node = self.node(id);
        self.property_in(
            &PropertyScope {
                properties: &node.properties,
                directory: &node.directory,
                coordinate: &node.coordinate,
                parent: node.parent,
            },
            name,
            0,
        )
    }

    pub(crate) fn property_in(
        &self,
        scope: &PropertyScope<'_>,
        name: &str,
        depth: usize,
    ) -> Option<String> {
        if let Some(v) = self.config.property_overrides.get(name) {
            return Some(v.clone());
        }
        if let Some(v) = scope.properties.get(name) {
            return Some(v.clone());
        }
        match name {
            "project.basedir" | "basedir" => {
                return Some(scope.directory.display().to_string());
            }
            "rootdir" => return Some(self.root_directory(scope.directory)),
            "project.groupId" | "pom.groupId" if scope.coordinate.group_id.is_some() => {
                return scope.coordinate.group_id.clone();
            }
            "project.artifactId" | "pom.artifactId" => {
                return Some(scope.coordinate.artifact_id.clone());
            }
            "project.version" | "pom.version" if scope.coordinate.version.is_some() => {
                return scope.coordinate.version.clone();
            }
            _ => {}
        }
        if let Some(var) = name.strip_prefix("env.") {
            if let Ok(v) = std::env::var(var) {
                return Some(v);
            }
        }
        let parent = self.node(scope.parent?);
        if depth > self.node_count() {
            return None;
        }
        self.property_in(
            &PropertyScope {
                properties: &parent.properties,
                directory: &parent.directory,
                coordinate: &parent.coordinate,
                parent: parent.parent,
            },
            name,
            depth + 1,
        )
    }

    /// Topmost directory above `dir` reachable through directories that
    /// all hold a descriptor.
    fn root_directory(&self, dir: &Path) -> String {
        let mut current = dir;
        while let Some(parent) = current.parent() {
            if !self.descriptors.exists(&parent.join(DESCRIPTOR_FILE)) {
                break;
            }
            current = parent;
        }
        current.display().to_string()
    }

    /// Expand `${...}` references in `input` as seen from node `id`.
    pub fn expand(&self, id: NodeId, input: &str) -> miette::Result<Option<String>> {
        expand_with(input, |name| Ok(self.get_property(id, name)))
    }

    pub(crate) fn expand_opt(&self, id: NodeId, input: Option<&str>) -> miette::Result<Option<String>> {
        expand_opt(input, |name| Ok(self.get_property(id, name)))
    }

    pub(crate) fn expand_in(
        &self,
        scope: &PropertyScope<'_>,
        input: Option<&str>,
    ) -> miette::Result<Option<String>> {
        expand_opt(input, |name| Ok(self.property_in(scope, name, 0)))
    }

    /// Expand every field of a declared dependency of `id`, falling back to
    /// dependency management for an unset version.
    pub fn expand_coordinate(&self, id: NodeId, dep: &Coordinate) -> miette::Result<Coordinate> {
        let group_id = self.expand_opt(id, dep.group_id.as_deref())?;
        let artifact_id = self
            .expand(id, &dep.artifact_id)?
            .unwrap_or_else(|| dep.artifact_id.clone());
        let mut version = self.expand_opt(id, dep.version.as_deref())?;
        if version.is_none() {
            if let Some(group) = group_id.as_deref() {
                version = self.find_version(id, group, &artifact_id)?;
            }
        }
        Ok(Coordinate {
            group_id,
            artifact_id,
            version,
            snapshot_version: dep.snapshot_version.clone(),
            classifier: self.expand_opt(id, dep.classifier.as_deref())?,
            scope: self.expand_opt(id, dep.scope.as_deref())?,
            optional: dep.optional,
            system_path: self.expand_opt(id, dep.system_path.as_deref())?,
            exclusions: dep.exclusions.clone(),
        })
    }

    /// Default version for `group:artifact` from the nearest management entry.
    pub fn find_version(
        &self,
        id: NodeId,
        group: &str,
        artifact: &str,
    ) -> miette::Result<Option<String>> {
        self.query_dependency_management(id, |owner, entry| {
            if entry.version.is_none() || !self.matches(owner, entry, group, artifact)? {
                return Ok(None);
            }
            self.expand_opt(owner, entry.version.as_deref())
        })
    }

    /// Whether `entry`, declared by `owner`, names `group:artifact`.
    pub(crate) fn matches(
        &self,
        owner: NodeId,
        entry: &Coordinate,
        group: &str,
        artifact: &str,
    ) -> miette::Result<bool> {
        Ok(self.expand_opt(owner, entry.group_id.as_deref())?.as_deref() == Some(group)
            && self.expand(owner, &entry.artifact_id)?.as_deref() == Some(artifact))
    }
}
