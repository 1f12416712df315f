//! Make-like up-to-date checks.
//!
//! A source-built node is fresh when every dependency it builds against is
//! fresh, every source has a class file at least as new, and, for the
//! packaged check, its archive is at least as new as the newest source or
//! resource. Verdicts are cached on the node for the rest of the session.

use std::time::SystemTime;

use jargo_core::project::{CheckKind, Freshness, NodeId, ProjectNode};
use jargo_resolver::{ResolveFilter, Session};

use crate::sources::{newest_resource, scan_sources};

pub struct StalenessEngine<'a> {
    session: &'a Session,
    filter: ResolveFilter,
}

impl<'a> StalenessEngine<'a> {
    pub fn new(session: &'a Session, download: bool) -> Self {
        Self {
            session,
            filter: ResolveFilter::build(download),
        }
    }

    /// Whether `id` is up to date under `kind`.
    pub fn is_fresh(&self, id: NodeId, kind: CheckKind) -> miette::Result<bool> {
        Ok(self.check(id, kind, &mut Vec::new())?.fresh)
    }

    fn check(
        &self,
        id: NodeId,
        kind: CheckKind,
        stack: &mut Vec<NodeId>,
    ) -> miette::Result<Verdict> {
        let node = self.session.node(id);
        match node.freshness(kind) {
            Freshness::Fresh => return Ok(Verdict::settled(true)),
            Freshness::Stale => return Ok(Verdict::settled(false)),
            Freshness::Unknown => {}
        }
        if !node.build_from_source {
            return Ok(Verdict::settled(
                node.record_freshness(kind, true) == Freshness::Fresh,
            ));
        }
        // A node already on the stack is being decided by its caller.
        if let Some(depth) = stack.iter().position(|&v| v == id) {
            return Ok(Verdict {
                fresh: true,
                assumes: Some(depth),
            });
        }
        let depth = stack.len();
        stack.push(id);
        let verdict = self.compute(&node, kind, stack);
        stack.pop();
        let verdict = verdict?;
        match verdict.assumes {
            // Fresh only if an unfinished caller is; left uncached.
            Some(assumed) if verdict.fresh && assumed < depth => Ok(verdict),
            _ => Ok(Verdict::settled(
                node.record_freshness(kind, verdict.fresh) == Freshness::Fresh,
            )),
        }
    }

    fn compute(
        &self,
        node: &ProjectNode,
        kind: CheckKind,
        stack: &mut Vec<NodeId>,
    ) -> miette::Result<Verdict> {
        let mut assumes: Option<usize> = None;
        for dep in self.session.resolve(node.id, &self.filter)?.nodes() {
            if dep == node.id {
                continue;
            }
            let verdict = self.check(dep, kind, stack)?;
            if !verdict.fresh {
                tracing::debug!(
                    "{} not up-to-date because of {}",
                    node.coordinate.artifact_id,
                    self.session.node(dep).coordinate.artifact_id
                );
                return Ok(Verdict::settled(false));
            }
            assumes = match (assumes, verdict.assumes) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }

        let scan = scan_sources(&node.source_directory(), &node.output_dir);
        if !scan.is_current() {
            tracing::debug!(
                "{} not up-to-date because {} source file(s) are newer than their classes",
                node.coordinate.artifact_id,
                scan.stale.len()
            );
            return Ok(Verdict::settled(false));
        }

        if kind == CheckKind::Packaged && node.is_jar() {
            let newest: Option<SystemTime> =
                scan.newest.max(newest_resource(&node.resource_directories()));
            match jargo_util::fs::mtime(&node.target) {
                Some(archive) if Some(archive) >= newest => {}
                _ => {
                    tracing::debug!(
                        "{} not up-to-date because {} is missing or older than its inputs",
                        node.coordinate.artifact_id,
                        node.target.display()
                    );
                    return Ok(Verdict::settled(false));
                }
            }
        }
        Ok(Verdict {
            fresh: true,
            assumes,
        })
    }
}

/// An up-to-date answer, plus the shallowest stack depth it took as fresh
/// while that node was still being decided.
struct Verdict {
    fresh: bool,
    assumes: Option<usize>,
}

impl Verdict {
    fn settled(fresh: bool) -> Self {
        Self {
            fresh,
            assumes: None,
        }
    }
}
