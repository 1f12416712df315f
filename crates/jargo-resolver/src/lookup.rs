//! Locating the node for an expanded coordinate.
//!
//! Order: the requester itself, the session memo, workspace projects, the
//! local repository, and finally the remote repositories when downloads are
//! allowed. Ranges and snapshots are pinned from repository metadata first.

use std::path::Path;
use std::sync::PoisonError;

use jargo_core::coordinate::{Coordinate, Scope};
use jargo_core::project::{NodeId, NodeSpec};
use jargo_core::version::VersionRange;
use jargo_maven::download::download_file;
use jargo_maven::metadata::{parse_metadata, parse_snapshot_metadata};
use jargo_maven::repository::{
    self, RANGE_METADATA_FILE, REMOTE_METADATA_FILE, SNAPSHOT_METADATA_FILE,
};
use jargo_util::errors::JargoError;

use crate::session::{Memo, Session};

impl Session {
    /// Find or load the node for `dep`.
    ///
    /// `requester` is the node declaring the dependency; a repository node
    /// without a parent of its own adopts the requester's root as parent.
    /// Returns `Ok(None)` when nothing provides the coordinate.
    pub fn find_node(
        &self,
        requester: Option<NodeId>,
        dep: &Coordinate,
        download: bool,
    ) -> miette::Result<Option<NodeId>> {
        self.find_node_in(requester, dep, download, &mut Vec::new())
    }

    fn find_node_in(
        &self,
        requester: Option<NodeId>,
        dep: &Coordinate,
        download: bool,
        loading: &mut Vec<String>,
    ) -> miette::Result<Option<NodeId>> {
        let Some(version) = dep.version.clone() else {
            if dep.scope() != Some(Scope::Provided) {
                tracing::warn!("Skipping invalid dependency (version unset): {}", dep.gav());
            }
            return Ok(None);
        };
        if dep.group_id.is_none() {
            tracing::warn!("Need fully qualified coordinates: {}", dep.gav());
            return Ok(None);
        }
        if let Some(requester) = requester {
            let own = &self.node(requester).coordinate;
            if own.group_id == dep.group_id
                && own.artifact_id == dep.artifact_id
                && own.version.as_deref() == Some(version.as_str())
            {
                return Ok(Some(requester));
            }
        }

        self.scan_workspaces();

        let key = dep.key();
        if loading.contains(&key) {
            return Err(JargoError::Resolution {
                message: format!("parent chain of {} refers back to itself", dep.gav()),
            }
            .into());
        }
        let slot = self.memo_slot(&key);
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let may_download = self.may_download(download);
        match &*entry {
            Memo::Found(id) if self.satisfies(*id, dep)? => return Ok(Some(*id)),
            Memo::Missing {
                version: missing,
                downloaded,
            } if *missing == version && (*downloaded || !may_download) => return Ok(None),
            _ => {}
        }

        loading.push(key);
        let found = self.load_from_repository(requester, dep, may_download, loading);
        loading.pop();

        match found? {
            Some(id) => {
                *entry = Memo::Found(id);
                Ok(Some(id))
            }
            None => {
                if !matches!(&*entry, Memo::Found(_)) {
                    *entry = Memo::Missing {
                        version,
                        downloaded: may_download,
                    };
                }
                Ok(None)
            }
        }
    }

    fn load_from_repository(
        &self,
        requester: Option<NodeId>,
        dep: &Coordinate,
        may_download: bool,
        loading: &mut Vec<String>,
    ) -> miette::Result<Option<NodeId>> {
        let mut dep = dep.clone();
        let repositories = self.repositories_for(requester)?;
        if dep.is_range() && dep.snapshot_version.is_none() {
            match self.pin_range(&dep, &repositories, may_download)? {
                Some(pinned) => dep.snapshot_version = Some(pinned),
                None => {
                    tracing::debug!("no version of {} satisfies the range", dep.gav());
                    return Ok(None);
                }
            }
        }
        if dep.is_snapshot() && dep.snapshot_version.is_none() {
            dep.snapshot_version = self.pin_snapshot(&dep, &repositories, may_download)?;
        }

        let (Some(pom_rel), Some(jar_rel)) = (
            repository::file_path(&dep, &dep.pom_name()),
            repository::file_path(&dep, &dep.jar_name()),
        ) else {
            return Ok(None);
        };
        let pom_path = self.local.resolve(&pom_rel);
        if !self.descriptors.exists(&pom_path) {
            if !may_download {
                tracing::debug!("{} not in the local repository", dep.gav());
                return Ok(None);
            }
            if !self.download(&repositories, &pom_rel)? {
                return Ok(None);
            }
        }
        let Some(descriptor) = self.descriptors.load(&pom_path)? else {
            return Ok(None);
        };

        let parent = match &descriptor.parent {
            Some(parent_ref) => {
                let parent_coordinate = parent_ref.coordinate();
                match self.find_node_in(requester, &parent_coordinate, may_download, loading)? {
                    Some(parent) => Some(parent),
                    None => {
                        tracing::warn!(
                            "parent {} of {} not found",
                            parent_coordinate.gav(),
                            dep.gav()
                        );
                        requester.map(|r| self.root_of(r))
                    }
                }
            }
            None => requester.map(|r| self.root_of(r)),
        };

        let directory = pom_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let target = self.local.resolve(&jar_rel);
        let packaging = descriptor.packaging().to_string();
        let needs_archive = matches!(packaging.as_str(), "jar" | "bundle");
        if needs_archive
            && !target.is_file()
            && (!may_download || !self.download(&repositories, &jar_rel)?)
        {
            tracing::debug!("{} has no archive", dep.gav());
            return Ok(None);
        }

        let coordinate = Coordinate {
            group_id: dep.group_id.clone(),
            artifact_id: dep.artifact_id.clone(),
            version: if dep.is_snapshot() {
                dep.version.clone()
            } else {
                dep.get_version().map(str::to_string)
            },
            snapshot_version: if dep.is_snapshot() {
                dep.snapshot_version.clone()
            } else {
                None
            },
            classifier: dep.classifier.clone(),
            ..Default::default()
        };
        let id = self.add_node(NodeSpec {
            coordinate,
            output_dir: directory.clone(),
            directory,
            descriptor_path: Some(pom_path),
            target,
            packaging,
            properties: descriptor.properties,
            dependencies: descriptor.dependencies,
            dependency_management: descriptor.dependency_management,
            modules: Vec::new(),
            repositories: descriptor.repositories,
            build: descriptor.build,
            parent,
            build_from_source: false,
        });
        tracing::debug!("loaded {} from the local repository", self.node(id));
        Ok(Some(id))
    }

    /// A stand-in node for a dependency provided by a local file.
    pub(crate) fn system_node(&self, dep: &Coordinate, file: &Path) -> NodeId {
        let mut nodes = self
            .system_nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = nodes.get(file) {
            return *id;
        }
        let id = self.add_node(NodeSpec {
            coordinate: Coordinate {
                group_id: dep.group_id.clone(),
                artifact_id: dep.artifact_id.clone(),
                version: dep.version.clone(),
                classifier: dep.classifier.clone(),
                ..Default::default()
            },
            directory: file.parent().map(Path::to_path_buf).unwrap_or_default(),
            target: file.to_path_buf(),
            packaging: "jar".to_string(),
            ..Default::default()
        });
        nodes.insert(file.to_path_buf(), id);
        id
    }

    /// Remote repositories for lookups on behalf of `requester`: those
    /// declared along its ancestry, then the configured ones.
    pub fn repositories_for(&self, requester: Option<NodeId>) -> miette::Result<Vec<String>> {
        let mut repositories: Vec<String> = Vec::new();
        if let Some(requester) = requester {
            for node in self.ancestry(requester) {
                for url in &node.repositories {
                    if let Some(url) = self.expand(node.id, url)? {
                        repositories.push(url);
                    }
                }
            }
        }
        repositories.extend(self.config.repositories.iter().cloned());
        let mut seen = std::collections::HashSet::new();
        repositories.retain(|r| seen.insert(r.trim_end_matches('/').to_string()));
        Ok(repositories)
    }

    fn download(&self, repositories: &[String], relative: &str) -> miette::Result<bool> {
        let Some(fetcher) = self.fetcher.as_deref() else {
            return Ok(false);
        };
        jargo_util::progress::status("Downloading", relative);
        download_file(fetcher, repositories, &self.local, relative)
    }

    /// Fetch `remote` metadata into `local` once per session, from the first
    /// of `repositories` that has it.
    fn refresh_metadata(
        &self,
        repositories: &[String],
        remote: &str,
        local: &str,
    ) -> miette::Result<()> {
        let local_path = self.local.resolve(local);
        if !self.mark_refreshed(local_path) {
            return Ok(());
        }
        let Some(fetcher) = self.fetcher.as_deref() else {
            return Ok(());
        };
        for base in repositories {
            match fetcher.fetch(base, remote) {
                Ok(Some(data)) => {
                    self.local.store(local, &data)?;
                    return Ok(());
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("{base}: {e}"),
            }
        }
        Ok(())
    }

    /// Pin a range to a concrete version: from refreshed metadata when
    /// possible, else the highest locally installed version inside it.
    fn pin_range(
        &self,
        dep: &Coordinate,
        repositories: &[String],
        may_download: bool,
    ) -> miette::Result<Option<String>> {
        let (Some(group), Some(version)) = (dep.group_id.as_deref(), dep.version.as_deref()) else {
            return Ok(None);
        };
        let Some(range) = VersionRange::parse(version)? else {
            return Ok(None);
        };
        let dir = repository::artifact_path(group, &dep.artifact_id);
        let local = format!("{dir}/{RANGE_METADATA_FILE}");
        if may_download {
            let remote = format!("{dir}/{REMOTE_METADATA_FILE}");
            self.refresh_metadata(repositories, &remote, &local)?;
        }
        let local_path = self.local.resolve(&local);
        if local_path.is_file() {
            let xml = std::fs::read_to_string(&local_path).map_err(JargoError::Io)?;
            match parse_metadata(&xml) {
                Ok(meta) => {
                    if let Some(pinned) = meta.pin(&range) {
                        return Ok(Some(pinned));
                    }
                }
                Err(e) => tracing::warn!("problem parsing {}: {e}", local_path.display()),
            }
        }
        let installed = self.local.installed_versions(group, &dep.artifact_id);
        Ok(range.highest(installed.iter().map(String::as_str)))
    }

    /// Pin a snapshot to its newest timestamped build, if metadata names one.
    fn pin_snapshot(
        &self,
        dep: &Coordinate,
        repositories: &[String],
        may_download: bool,
    ) -> miette::Result<Option<String>> {
        let (Some(group), Some(version)) = (dep.group_id.as_deref(), dep.version.as_deref()) else {
            return Ok(None);
        };
        let dir = repository::coordinate_path(group, &dep.artifact_id, version);
        let local = format!("{dir}/{SNAPSHOT_METADATA_FILE}");
        if may_download {
            let remote = format!("{dir}/{REMOTE_METADATA_FILE}");
            self.refresh_metadata(repositories, &remote, &local)?;
        }
        let local_path = self.local.resolve(&local);
        if !local_path.is_file() {
            return Ok(None);
        }
        let xml = std::fs::read_to_string(&local_path).map_err(JargoError::Io)?;
        match parse_snapshot_metadata(&xml) {
            Ok(meta) => Ok(meta.pinned_version()),
            Err(e) => {
                tracing::warn!("problem parsing {}: {e}", local_path.display());
                Ok(None)
            }
        }
    }
}
