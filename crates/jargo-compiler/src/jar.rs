//! Jar writing with the `zip` crate.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use jargo_util::errors::JargoError;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::artifact::{ArtifactWriter, PackageRequest};
use crate::sources::list_files;

const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Writes `.jar` archives: the manifest first, then the output directory,
/// then any extra entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct JarWriter;

impl ArtifactWriter for JarWriter {
    fn package(&self, request: &PackageRequest) -> miette::Result<PathBuf> {
        if let Some(parent) = request.destination.parent() {
            jargo_util::fs::ensure_dir(parent).map_err(JargoError::Io)?;
        }
        let file = File::create(&request.destination).map_err(JargoError::Io)?;
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.add_directory("META-INF/", options).map_err(zip_error)?;
        zip.start_file(MANIFEST_ENTRY, options).map_err(zip_error)?;
        zip.write_all(request.manifest.render().as_bytes())
            .map_err(JargoError::Io)?;

        let mut entries: Vec<(PathBuf, String)> = list_files(&request.output_dir)
            .into_iter()
            .filter(|(_, name)| name != MANIFEST_ENTRY)
            .collect();
        for (name, path) in &request.extra_entries {
            if path.is_dir() {
                let prefix = name.trim_end_matches('/');
                entries.extend(
                    list_files(path)
                        .into_iter()
                        .map(|(p, n)| (p, format!("{prefix}/{n}"))),
                );
            } else if path.is_file() {
                entries.push((path.clone(), name.clone()));
            }
        }

        for (path, name) in entries {
            add_file(&mut zip, &path, &name, options)?;
        }
        zip.finish().map_err(zip_error)?;
        tracing::debug!("wrote {}", request.destination.display());
        Ok(request.destination.clone())
    }
}

fn add_file(
    zip: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    options: SimpleFileOptions,
) -> miette::Result<()> {
    let data = std::fs::read(path).map_err(JargoError::Io)?;
    zip.start_file(name, options).map_err(zip_error)?;
    zip.write_all(&data).map_err(JargoError::Io)?;
    Ok(())
}

fn zip_error(e: zip::result::ZipError) -> JargoError {
    JargoError::Generic {
        message: format!("Failed to write archive: {e}"),
    }
}
