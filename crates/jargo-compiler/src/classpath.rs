//! Classpath assembly from resolved dependency sets.

use std::path::PathBuf;

use jargo_core::project::NodeId;
use jargo_resolver::{ResolveFilter, Session};

/// `id`'s output directory followed by the archive of every dependency on
/// the compile (`for_compile`) or runtime classpath, in resolver order.
pub fn compute_classpath(
    session: &Session,
    id: NodeId,
    for_compile: bool,
    download: bool,
) -> miette::Result<Vec<PathBuf>> {
    let node = session.node(id);
    tracing::debug!(
        "classpath of {node} for {}",
        if for_compile { "compile" } else { "runtime" }
    );
    let mut entries = vec![node.output_dir.clone()];
    for dep in session
        .resolve(id, &ResolveFilter::classpath(for_compile, download))?
        .nodes()
    {
        if dep != id {
            entries.push(session.node(dep).target.clone());
        }
    }
    Ok(entries)
}

/// Value of the manifest `Class-Path` attribute: the file names of the
/// runtime jar dependencies, space separated. `None` when there are none.
pub fn manifest_class_path(
    session: &Session,
    id: NodeId,
    download: bool,
) -> miette::Result<Option<String>> {
    let names: Vec<String> = session
        .resolve(id, &ResolveFilter::classpath(false, download))?
        .nodes()
        .into_iter()
        .filter(|dep| *dep != id)
        .map(|dep| session.node(dep))
        .filter(|dep| dep.is_jar())
        .map(|dep| {
            format!(
                "{}-{}.jar",
                dep.coordinate.artifact_id,
                dep.coordinate.version.as_deref().unwrap_or_default()
            )
        })
        .collect();
    Ok((!names.is_empty()).then(|| names.join(" ")))
}
