//! Operation: download every dependency into the local repository.

use std::collections::BTreeSet;

use jargo_core::coordinate::Scope;
use jargo_resolver::ResolveFilter;
use jargo_util::errors::JargoError;
use jargo_util::progress::status;

use crate::BuildContext;

/// Resolve the project (or each module) with downloads enabled, skipping
/// the `test` scope. Returns the number of distinct artifacts resolved.
pub fn fetch_dependencies(ctx: &BuildContext) -> miette::Result<usize> {
    if ctx.session.config().offline {
        return Err(JargoError::Generic {
            message: "cannot fetch dependencies in offline mode".to_string(),
        }
        .into());
    }
    let filter = ResolveFilter::new(true, true).excluding([Scope::Test]);
    let mut artifacts = BTreeSet::new();
    for id in ctx.buildable_modules(ctx.root) {
        for entry in ctx.session.resolve(id, &filter)?.iter() {
            if !ctx.session.node(entry.node).build_from_source {
                artifacts.insert(entry.coordinate.gav());
            }
        }
    }
    status(
        "Fetched",
        &format!(
            "{} artifact(s) into {}",
            artifacts.len(),
            ctx.session.config().local_repository.display()
        ),
    );
    Ok(artifacts.len())
}
