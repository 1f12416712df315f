//! Operation: list resolved dependencies and the version conflicts met.

use jargo_core::coordinate::Scope;
use jargo_resolver::conflict::ConflictReport;
use jargo_resolver::ResolveFilter;
use jargo_util::errors::JargoError;
use jargo_util::progress::status_warn;

use crate::BuildContext;

/// Options for [`list_dependencies`].
#[derive(Debug, Clone, Default)]
pub struct DepsOptions {
    /// Scope names to leave out, e.g. `test`.
    pub exclude_scopes: Vec<String>,
    pub include_optionals: bool,
}

/// Resolved dependencies of one project.
#[derive(Debug, Clone)]
pub struct DependencyListing {
    pub project: String,
    /// `groupId:artifactId:version[:classifier] (scope)` lines in resolver order.
    pub lines: Vec<String>,
}

/// Listings for the project (or each module of an aggregator) plus every
/// conflict recorded while resolving them.
#[derive(Debug, Clone)]
pub struct DepsReport {
    pub listings: Vec<DependencyListing>,
    pub conflicts: ConflictReport,
}

pub fn list_dependencies(ctx: &BuildContext, opts: &DepsOptions) -> miette::Result<DepsReport> {
    let mut scopes = Vec::new();
    for name in &opts.exclude_scopes {
        let scope = Scope::parse(name).ok_or_else(|| JargoError::Generic {
            message: format!("unknown scope `{name}`"),
        })?;
        scopes.push(scope);
    }
    let filter = ResolveFilter::new(!opts.include_optionals, ctx.download()).excluding(scopes);

    let mut listings = Vec::new();
    for id in ctx.buildable_modules(ctx.root) {
        let resolved = ctx.session.resolve(id, &filter)?;
        let lines = resolved
            .iter()
            .filter(|entry| entry.node != id)
            .map(ToString::to_string)
            .collect();
        listings.push(DependencyListing {
            project: ctx.session.node(id).to_string(),
            lines,
        });
    }

    let conflicts = ctx.session.conflicts();
    for conflict in &conflicts.conflicts {
        tracing::warn!("version conflict: {conflict}");
    }
    if !conflicts.is_empty() {
        status_warn(
            "Conflicts",
            &format!("{} dependency version(s) overridden", conflicts.len()),
        );
    }
    Ok(DepsReport {
        listings,
        conflicts,
    })
}
