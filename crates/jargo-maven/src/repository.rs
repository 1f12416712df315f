//! Maven repository layout, shared by the local repository and remote URLs.

use std::path::{Path, PathBuf};

use jargo_core::coordinate::Coordinate;
use jargo_util::errors::JargoError;

/// Metadata file pinning a version range, stored in the artifact directory.
pub const RANGE_METADATA_FILE: &str = "maven-metadata-version.xml";

/// Metadata file pinning a snapshot build, stored in the version directory.
pub const SNAPSHOT_METADATA_FILE: &str = "maven-metadata-snapshot.xml";

/// Name of the metadata file on a remote repository.
pub const REMOTE_METADATA_FILE: &str = "maven-metadata.xml";

/// `org.example:lib` becomes `org/example/lib`.
pub fn artifact_path(group: &str, artifact: &str) -> String {
    format!("{}/{}", group.replace('.', "/"), artifact)
}

/// `org.example:lib:1.0` becomes `org/example/lib/1.0`.
pub fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
    format!("{}/{version}", artifact_path(group, artifact))
}

/// Layout-relative path of a file inside the version directory of `coordinate`.
///
/// Returns `None` if the coordinate has no group or concrete version yet.
pub fn file_path(coordinate: &Coordinate, file_name: &str) -> Option<String> {
    let group = coordinate.group_id.as_deref()?;
    let version = coordinate.directory_version()?;
    Some(format!(
        "{}/{file_name}",
        coordinate_path(group, &coordinate.artifact_id, version)
    ))
}

/// Full URL of a layout-relative path on a remote repository.
pub fn remote_url(base: &str, relative: &str) -> String {
    format!("{}/{relative}", base.trim_end_matches('/'))
}

/// The local Maven repository (`~/.m2/repository` by default).
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn artifact_dir(&self, group: &str, artifact: &str) -> PathBuf {
        self.root.join(artifact_path(group, artifact))
    }

    /// Directory holding the files of one version, if the coordinate is concrete.
    pub fn version_dir(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let group = coordinate.group_id.as_deref()?;
        let version = coordinate.directory_version()?;
        Some(self.root.join(coordinate_path(group, &coordinate.artifact_id, version)))
    }

    pub fn pom_path(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        Some(self.version_dir(coordinate)?.join(coordinate.pom_name()))
    }

    pub fn jar_path(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        Some(self.version_dir(coordinate)?.join(coordinate.jar_name()))
    }

    /// Versions present locally: subdirectories of the artifact directory
    /// holding a `.pom` file.
    pub fn installed_versions(&self, group: &str, artifact: &str) -> Vec<String> {
        let dir = self.artifact_dir(group, artifact);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut versions: Vec<String> = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let version = e.file_name().to_string_lossy().to_string();
                let pom = e.path().join(format!("{artifact}-{version}.pom"));
                pom.is_file().then_some(version)
            })
            .collect();
        versions.sort();
        versions
    }

    /// Write `data` at a layout-relative path, creating directories.
    pub fn store(&self, relative: &str, data: &[u8]) -> miette::Result<PathBuf> {
        let dest = self.resolve(relative);
        if let Some(parent) = dest.parent() {
            jargo_util::fs::ensure_dir(parent).map_err(JargoError::Io)?;
        }
        std::fs::write(&dest, data).map_err(JargoError::Io)?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        assert_eq!(
            coordinate_path("org.example.lib", "core", "1.0"),
            "org/example/lib/core/1.0"
        );
        let c = Coordinate::new("org.example", "core", Some("1.0"));
        assert_eq!(
            file_path(&c, &c.jar_name()).as_deref(),
            Some("org/example/core/1.0/core-1.0.jar")
        );
        assert_eq!(
            remote_url("https://repo.example.com/maven2/", "a/b/1/b-1.pom"),
            "https://repo.example.com/maven2/a/b/1/b-1.pom"
        );
    }

    #[test]
    fn snapshot_files_live_in_snapshot_dir() {
        let repo = LocalRepository::new("/m2");
        let mut c = Coordinate::new("g", "lib", Some("2.0-SNAPSHOT"));
        c.snapshot_version = Some("2.0-20240101.120000-3".to_string());
        assert_eq!(
            repo.jar_path(&c),
            Some(PathBuf::from("/m2/g/lib/2.0-SNAPSHOT/lib-2.0-20240101.120000-3.jar"))
        );
    }

    #[test]
    fn installed_versions_requires_pom() {
        let tmp = tempfile::TempDir::new().unwrap();
        let repo = LocalRepository::new(tmp.path());
        repo.store("g/lib/1.0/lib-1.0.pom", b"<project/>").unwrap();
        repo.store("g/lib/1.1/lib-1.1.pom", b"<project/>").unwrap();
        std::fs::create_dir_all(tmp.path().join("g/lib/2.0")).unwrap();
        assert_eq!(repo.installed_versions("g", "lib"), vec!["1.0", "1.1"]);
        assert!(repo.installed_versions("g", "other").is_empty());
    }
}
