//! Operation: report whether the project is up to date without building.

use jargo_compiler::staleness::StalenessEngine;
use jargo_core::project::CheckKind;

use crate::BuildContext;

/// Up-to-date verdict per buildable project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub kind: CheckKind,
    /// `(project, fresh)` in module order.
    pub projects: Vec<(String, bool)>,
}

impl CheckReport {
    pub fn is_fresh(&self) -> bool {
        self.projects.iter().all(|(_, fresh)| *fresh)
    }
}

/// Check the context's project, or each module of an aggregator, under `kind`.
pub fn check_up_to_date(ctx: &BuildContext, kind: CheckKind) -> miette::Result<CheckReport> {
    let engine = StalenessEngine::new(&ctx.session, ctx.download());
    let mut projects = Vec::new();
    for id in ctx.buildable_modules(ctx.root) {
        let fresh = engine.is_fresh(id, kind)?;
        let node = ctx.session.node(id);
        tracing::debug!("{node}: {}", if fresh { "fresh" } else { "stale" });
        projects.push((node.to_string(), fresh));
    }
    Ok(CheckReport { kind, projects })
}
