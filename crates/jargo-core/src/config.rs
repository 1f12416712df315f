use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jargo_util::errors::JargoError;

/// Repository used when neither the configuration nor a descriptor names one.
pub const DEFAULT_REPOSITORY: &str = "https://repo1.maven.org/maven2/";

/// Global user configuration loaded from `~/.jargo/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Named remote repositories, tried in name order before the default one.
    #[serde(default)]
    pub repositories: BTreeMap<String, String>,

    /// Property overrides consulted before any descriptor property.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Build settings from `[build]` in global config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_jobs")]
    pub jobs: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
        }
    }
}

fn default_jobs() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
}

/// Dependency resolution settings from `[resolve]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default)]
    pub offline: bool,
    #[serde(default, rename = "download-automatically")]
    pub download_automatically: bool,
    #[serde(default, rename = "local-repository")]
    pub local_repository: Option<String>,
    /// Extra directories scanned for source-built projects.
    #[serde(default)]
    pub workspaces: Vec<String>,
}

impl GlobalConfig {
    /// Load the global configuration from `~/.jargo/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| JargoError::Generic {
            message: format!("Failed to read global config: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| {
            JargoError::Generic {
                message: format!("Failed to parse global config: {e}"),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the Jargo data directory (`~/.jargo/`).
pub fn dirs_path() -> PathBuf {
    home_dir().join(".jargo")
}

/// Returns the default local Maven repository (`~/.m2/repository`).
pub fn default_local_repository() -> PathBuf {
    home_dir().join(".m2").join("repository")
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

/// Runtime configuration of one resolution session.
///
/// Built from [`GlobalConfig`] and then adjusted by command-line flags.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Suppress every network fetch.
    pub offline: bool,
    /// Allow missing artifacts to be fetched from remote repositories.
    pub download_automatically: bool,
    pub verbose: bool,
    pub debug: bool,
    pub jobs: usize,
    pub local_repository: PathBuf,
    /// Remote repository base URLs in priority order.
    pub repositories: Vec<String>,
    pub property_overrides: BTreeMap<String, String>,
    /// Directories whose descriptor trees are scanned for source-built projects.
    pub workspace_roots: Vec<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_global(&GlobalConfig::default())
    }
}

impl SessionConfig {
    pub fn from_global(global: &GlobalConfig) -> Self {
        let mut repositories: Vec<String> = global.repositories.values().cloned().collect();
        if !repositories.iter().any(|r| same_url(r, DEFAULT_REPOSITORY)) {
            repositories.push(DEFAULT_REPOSITORY.to_string());
        }
        Self {
            offline: global.resolve.offline,
            download_automatically: global.resolve.download_automatically,
            verbose: false,
            debug: false,
            jobs: global.build.jobs.max(1) as usize,
            local_repository: global
                .resolve
                .local_repository
                .as_deref()
                .map(expand_home)
                .unwrap_or_else(default_local_repository),
            repositories,
            property_overrides: global.properties.clone(),
            workspace_roots: global.resolve.workspaces.iter().map(|w| expand_home(w)).collect(),
        }
    }

    /// Whether a remote fetch may be attempted for a request.
    pub fn may_download(&self, requested: bool) -> bool {
        requested && !self.offline
    }
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}
