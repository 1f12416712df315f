//! Building the node tree from descriptors.

use std::path::{Component, Path, PathBuf};
use std::sync::PoisonError;

use jargo_core::coordinate::Coordinate;
use jargo_core::descriptor::{ProjectDescriptor, DESCRIPTOR_FILE};
use jargo_core::project::{NodeId, NodeSpec};
use jargo_util::errors::JargoError;

use crate::expand::PropertyScope;
use crate::session::Session;

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

impl Session {
    /// Load the project in `dir` together with its modules.
    ///
    /// If the descriptor names a parent that exists on disk, the parent's
    /// tree is loaded first and this project becomes one of its modules when
    /// the parent declares it. A parent found only in a repository is loaded
    /// from there so that its properties and management apply.
    pub fn load_project(&self, dir: &Path) -> miette::Result<NodeId> {
        let dir = normalize(dir);
        if let Some(id) = self.loaded(&dir) {
            return Ok(id);
        }
        let path = dir.join(DESCRIPTOR_FILE);
        let descriptor = self.descriptors.load(&path)?.ok_or_else(|| JargoError::Descriptor {
            path: path.display().to_string(),
            message: "no project descriptor found".to_string(),
        })?;

        let parent = match &descriptor.parent {
            Some(parent_ref) => {
                let relative = parent_ref.relative_path.as_deref().unwrap_or("..");
                let mut parent_dir = normalize(&dir.join(relative));
                if parent_dir.ends_with(DESCRIPTOR_FILE) {
                    parent_dir.pop();
                }
                let on_disk = self
                    .descriptors
                    .load(&parent_dir.join(DESCRIPTOR_FILE))?
                    .filter(|d| parent_dir != dir && d.artifact_id == parent_ref.artifact_id);
                if on_disk.is_some() {
                    let parent = self.load_project(&parent_dir)?;
                    if let Some(id) = self.loaded(&dir) {
                        return Ok(id);
                    }
                    Some(parent)
                } else {
                    let found = self.find_node(
                        None,
                        &parent_ref.coordinate(),
                        self.config.download_automatically,
                    )?;
                    if found.is_none() {
                        tracing::warn!(
                            "parent {} of {} not found",
                            parent_ref.coordinate().gav(),
                            dir.display()
                        );
                    }
                    found
                }
            }
            None => None,
        };
        self.load_with_parent(&dir, descriptor, parent)
    }

    fn loaded(&self, dir: &Path) -> Option<NodeId> {
        self.by_directory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dir)
            .copied()
    }

    fn load_with_parent(
        &self,
        dir: &Path,
        descriptor: ProjectDescriptor,
        parent: Option<NodeId>,
    ) -> miette::Result<NodeId> {
        let modules = descriptor.modules.clone();
        let id = self.add_source_node(dir, descriptor, parent)?;

        for module in &modules {
            let child_dir = normalize(&dir.join(module));
            if let Some(child) = self.loaded(&child_dir) {
                self.node(id).add_child(child);
                continue;
            }
            match self.descriptors.load(&child_dir.join(DESCRIPTOR_FILE))? {
                Some(child) => {
                    self.load_with_parent(&child_dir, child, Some(id))?;
                }
                None => tracing::warn!("module {module} of {} has no descriptor", dir.display()),
            }
        }
        Ok(id)
    }

    fn add_source_node(
        &self,
        dir: &Path,
        descriptor: ProjectDescriptor,
        parent: Option<NodeId>,
    ) -> miette::Result<NodeId> {
        let parent_coordinate = parent.map(|p| self.node(p).coordinate.clone());
        let parent_ref = descriptor.parent.as_ref();
        let raw = Coordinate {
            group_id: descriptor
                .group_id
                .clone()
                .or_else(|| parent_ref.map(|p| p.group_id.clone()))
                .or_else(|| parent_coordinate.as_ref().and_then(|c| c.group_id.clone())),
            artifact_id: descriptor.artifact_id.clone(),
            version: descriptor
                .version
                .clone()
                .or_else(|| parent_ref.map(|p| p.version.clone()))
                .or_else(|| parent_coordinate.as_ref().and_then(|c| c.version.clone())),
            ..Default::default()
        };
        let scope = PropertyScope {
            properties: &descriptor.properties,
            directory: dir,
            coordinate: &raw,
            parent,
        };
        let coordinate = Coordinate {
            group_id: self.expand_in(&scope, raw.group_id.as_deref())?,
            artifact_id: self
                .expand_in(&scope, Some(&raw.artifact_id))?
                .unwrap_or_else(|| raw.artifact_id.clone()),
            version: self.expand_in(&scope, raw.version.as_deref())?,
            ..Default::default()
        };

        let target_dir = dir.join("target");
        let spec = NodeSpec {
            target: target_dir.join(coordinate.jar_name()),
            output_dir: target_dir.join("classes"),
            coordinate,
            directory: dir.to_path_buf(),
            descriptor_path: Some(dir.join(DESCRIPTOR_FILE)),
            packaging: descriptor.packaging().to_string(),
            properties: descriptor.properties,
            dependencies: descriptor.dependencies,
            dependency_management: descriptor.dependency_management,
            modules: descriptor.modules,
            repositories: descriptor.repositories,
            build: descriptor.build,
            parent,
            build_from_source: true,
        };
        let id = self.add_node(spec);
        self.by_directory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dir.to_path_buf(), id);
        if let Some(parent) = parent {
            self.node(parent).add_child(id);
        }
        self.register(id);
        tracing::debug!("loaded {} from {}", self.node(id), dir.display());
        Ok(id)
    }

    /// Load every project below the configured workspace roots, once.
    ///
    /// A root with a descriptor is loaded as one tree; otherwise each
    /// immediate subdirectory with a descriptor is.
    pub fn scan_workspaces(&self) {
        {
            let mut scanned = self
                .workspaces_scanned
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *scanned {
                return;
            }
            *scanned = true;
        }
        for root in &self.config.workspace_roots {
            let mut dirs = Vec::new();
            if self.descriptors.exists(&root.join(DESCRIPTOR_FILE)) {
                dirs.push(root.clone());
            } else if let Ok(entries) = std::fs::read_dir(root) {
                let mut children: Vec<PathBuf> = entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| self.descriptors.exists(&p.join(DESCRIPTOR_FILE)))
                    .collect();
                children.sort();
                dirs.extend(children);
            }
            for dir in dirs {
                if let Err(e) = self.load_project(&dir) {
                    tracing::warn!("skipping workspace project {}: {e}", dir.display());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_parent_components() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/a/b/..")), PathBuf::from("/a"));
    }
}
