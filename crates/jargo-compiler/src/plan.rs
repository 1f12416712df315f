//! Build plan: the source-built nodes below a root ordered by dependency.
//!
//! Edges point from a dependency to its dependent. Uses `petgraph` for the
//! topological sort; a cycle among source-built nodes cannot be scheduled.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use jargo_core::project::NodeId;
use jargo_resolver::{ResolveFilter, Session};
use jargo_util::errors::JargoError;

pub struct BuildPlan {
    graph: DiGraph<NodeId, ()>,
    indices: HashMap<NodeId, NodeIndex>,
    order: Vec<NodeId>,
}

impl BuildPlan {
    /// Plan the build of `roots` and every source-built node they depend on.
    pub fn new(session: &Session, roots: &[NodeId], download: bool) -> miette::Result<Self> {
        let filter = ResolveFilter::build(download);
        let mut graph = DiGraph::new();
        let mut indices: HashMap<NodeId, NodeIndex> = HashMap::new();
        let mut pending: Vec<NodeId> = roots.to_vec();

        while let Some(id) = pending.pop() {
            if indices.contains_key(&id) {
                continue;
            }
            let idx = graph.add_node(id);
            indices.insert(id, idx);
            for dep in session.resolve(id, &filter)?.nodes() {
                if dep != id && session.node(dep).build_from_source {
                    pending.push(dep);
                }
            }
        }

        let ids: Vec<NodeId> = indices.keys().copied().collect();
        for id in ids {
            for dep in session.resolve(id, &filter)?.nodes() {
                if let (Some(&from), Some(&to)) = (indices.get(&dep), indices.get(&id)) {
                    if from != to {
                        graph.update_edge(from, to, ());
                    }
                }
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| JargoError::Resolution {
                message: format!(
                    "dependency cycle through {} prevents scheduling the build",
                    session.node(graph[cycle.node_id()])
                ),
            })?
            .into_iter()
            .map(|idx| graph[idx])
            .collect();

        Ok(Self {
            graph,
            indices,
            order,
        })
    }

    /// Nodes with every dependency before its dependents.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Planned nodes `id` must wait for.
    pub fn dependencies(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Planned nodes waiting for `id`.
    pub fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let Some(&idx) = self.indices.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n])
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
