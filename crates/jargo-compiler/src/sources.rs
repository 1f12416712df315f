//! Source and resource tree scanning.
//!
//! Java sources map onto class files by path: `com/x/Foo.java` compiles to
//! `<output>/com/x/Foo.class`. `package-info.java` produces no class of its
//! own and is ignored everywhere.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use jargo_util::errors::JargoError;

const SOURCE_EXTENSION: &str = "java";
const CLASS_EXTENSION: &str = "class";
const PACKAGE_INFO: &str = "package-info.java";

/// Result of comparing a source tree against its output directory.
#[derive(Debug, Default, Clone)]
pub struct SourceScan {
    /// Sources lacking a class file or newer than it.
    pub stale: Vec<PathBuf>,
    /// Every counted source file.
    pub all: Vec<PathBuf>,
    /// Newest source modification time.
    pub newest: Option<SystemTime>,
}

impl SourceScan {
    pub fn is_current(&self) -> bool {
        self.stale.is_empty()
    }
}

/// Scan `source_dir` for Java sources and compare each with its class file
/// under `output_dir`.
pub fn scan_sources(source_dir: &Path, output_dir: &Path) -> SourceScan {
    let mut scan = SourceScan::default();
    scan_dir(source_dir, output_dir, &mut scan);
    scan.all.sort();
    scan.stale.sort();
    scan
}

fn scan_dir(dir: &Path, output_dir: &Path, scan: &mut SourceScan) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_dir(&path, &output_dir.join(entry.file_name()), scan);
            continue;
        }
        let name = entry.file_name();
        if name == PACKAGE_INFO || !path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            continue;
        }
        let modified = jargo_util::fs::mtime(&path);
        if modified > scan.newest {
            scan.newest = modified;
        }
        let class_file = output_dir.join(name).with_extension(CLASS_EXTENSION);
        match (jargo_util::fs::mtime(&class_file), modified) {
            (Some(compiled), Some(source)) if compiled >= source => {}
            _ => scan.stale.push(path.clone()),
        }
        scan.all.push(path);
    }
}

/// Newest modification time across the resource trees, without copying.
pub fn newest_resource(resource_dirs: &[PathBuf]) -> Option<SystemTime> {
    resource_dirs
        .iter()
        .filter_map(|d| jargo_util::fs::newest_mtime(d))
        .max()
}

/// Copy resources newer than their copy in `output_dir`. Returns the number
/// of files copied.
pub fn copy_resources(resource_dirs: &[PathBuf], output_dir: &Path) -> miette::Result<usize> {
    let mut copied = 0;
    for dir in resource_dirs {
        if dir.is_dir() {
            copied += copy_newer(dir, output_dir)?;
        }
    }
    Ok(copied)
}

fn copy_newer(src: &Path, dst: &Path) -> miette::Result<usize> {
    let mut copied = 0;
    let entries = std::fs::read_dir(src).map_err(JargoError::Io)?;
    for entry in entries.flatten() {
        let path = entry.path();
        let dest = dst.join(entry.file_name());
        if path.is_dir() {
            copied += copy_newer(&path, &dest)?;
        } else if path.is_file() {
            let current = match (jargo_util::fs::mtime(&dest), jargo_util::fs::mtime(&path)) {
                (Some(copy), Some(original)) => copy >= original,
                _ => false,
            };
            if !current {
                jargo_util::fs::copy_file(&path, &dest).map_err(JargoError::Io)?;
                copied += 1;
            }
        }
    }
    Ok(copied)
}

/// Regular files below `dir`, sorted, as `(path, relative name)` pairs using
/// `/` separators.
pub fn list_files(dir: &Path) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    collect_files(dir, "", &mut files);
    files.sort_by(|a, b| a.1.cmp(&b.1));
    files
}

fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<(PathBuf, String)>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = format!("{prefix}{}", entry.file_name().to_string_lossy());
        if path.is_dir() {
            collect_files(&path, &format!("{name}/"), out);
        } else if path.is_file() {
            out.push((path, name));
        }
    }
}
