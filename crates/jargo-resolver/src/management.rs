//! The dependency-management query shared by version defaulting and
//! exclusion collection.

use std::collections::BTreeSet;

use jargo_core::coordinate::Coordinate;
use jargo_core::project::NodeId;

use crate::session::Session;

impl Session {
    /// Scan management entries visible from `id`, nearest first, until
    /// `visit` returns `Some`.
    ///
    /// Order: `id`'s own dependency management, then for each ancestor
    /// root-ward its direct dependencies followed by its dependency
    /// management. `visit` receives the declaring node so that entries are
    /// expanded in their own context.
    pub fn query_dependency_management<T, F>(&self, id: NodeId, mut visit: F) -> miette::Result<Option<T>>
    where
        F: FnMut(NodeId, &Coordinate) -> miette::Result<Option<T>>,
    {
        let chain = self.ancestry(id);
        let Some((node, ancestors)) = chain.split_first() else {
            return Ok(None);
        };
        for entry in &node.dependency_management {
            if let Some(found) = visit(node.id, entry)? {
                return Ok(Some(found));
            }
        }
        for ancestor in ancestors {
            for entry in ancestor
                .dependencies
                .iter()
                .chain(&ancestor.dependency_management)
            {
                if let Some(found) = visit(ancestor.id, entry)? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    /// Exclusions attached to every management entry for `group:artifact`
    /// visible from `id`.
    pub fn management_exclusions(
        &self,
        id: NodeId,
        group: &str,
        artifact: &str,
    ) -> miette::Result<BTreeSet<String>> {
        let mut exclusions = BTreeSet::new();
        self.query_dependency_management(id, |owner, entry| {
            if !entry.exclusions.is_empty() && self.matches(owner, entry, group, artifact)? {
                exclusions.extend(entry.exclusions.iter().cloned());
            }
            Ok(None::<()>)
        })?;
        Ok(exclusions)
    }
}
