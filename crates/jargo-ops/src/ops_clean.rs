//! Operation: remove build output.
//!
//! Cleans the project's classes directory and archive, then those of every
//! source-built project it depends on. Aggregators clean their modules.

use std::collections::HashSet;
use std::path::PathBuf;

use jargo_core::project::NodeId;
use jargo_resolver::ResolveFilter;
use jargo_util::errors::JargoError;

use crate::BuildContext;

/// Result of a clean operation.
#[derive(Debug, PartialEq, Eq)]
pub enum CleanResult {
    /// Paths that existed and were removed.
    Cleaned(Vec<PathBuf>),
    NothingToClean,
}

/// Remove the output of the context's project and its source-built dependencies.
pub fn clean(ctx: &BuildContext) -> miette::Result<CleanResult> {
    let mut removed = Vec::new();
    clean_node(ctx, ctx.root, &mut HashSet::new(), &mut removed)?;
    if removed.is_empty() {
        Ok(CleanResult::NothingToClean)
    } else {
        Ok(CleanResult::Cleaned(removed))
    }
}

fn clean_node(
    ctx: &BuildContext,
    id: NodeId,
    seen: &mut HashSet<NodeId>,
    removed: &mut Vec<PathBuf>,
) -> miette::Result<()> {
    if !seen.insert(id) {
        return Ok(());
    }
    let node = ctx.session.node(id);
    if !node.build_from_source {
        return Ok(());
    }
    if node.packaging == "pom" {
        for child in node.children() {
            clean_node(ctx, child, seen, removed)?;
        }
        return Ok(());
    }

    let filter = ResolveFilter::new(true, ctx.download()).tolerating_missing();
    for dep in ctx.session.resolve(id, &filter)?.nodes() {
        clean_node(ctx, dep, seen, removed)?;
    }

    for path in [&node.output_dir, &node.target] {
        if path.exists() {
            tracing::debug!("removing {}", path.display());
            jargo_util::fs::remove_path(path).map_err(JargoError::Io)?;
            removed.push(path.clone());
        }
    }
    Ok(())
}
