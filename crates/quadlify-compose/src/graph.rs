//! Service dependency graph using `petgraph`.
//!
//! Edges point from a dependency to the service that depends on it, so a
//! topological sort yields dependencies first. Conversion only needs direct
//! predecessors and cycle membership; [`DependencyGraph::start_order`] is
//! used for reporting.

use indexmap::IndexMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use quadlify_common::error::{QuadlifyError, Result};

/// A dependency graph of services.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: IndexMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service node, returning the existing node if already present.
    pub fn add_service(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.nodes.get(name) {
            return index;
        }
        let index = self.graph.add_node(name.to_owned());
        let _ = self.nodes.insert(name.to_owned(), index);
        index
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// Repeated edges are ignored.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.update_edge(dependency, dependent, ());
    }

    /// Returns the node of a service.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<NodeIndex> {
        self.nodes.get(name).copied()
    }

    /// Returns the services `name` depends on directly, in the order the
    /// edges were added.
    #[must_use]
    pub fn direct_dependencies(&self, name: &str) -> Vec<&str> {
        let Some(index) = self.node(name) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .collect();
        edges.sort_by_key(EdgeRef::id);
        edges
            .into_iter()
            .map(|edge| self.graph[edge.source()].as_str())
            .collect()
    }

    /// Returns every dependency cycle.
    ///
    /// A cycle is a strongly connected component with more than one member,
    /// or a service that depends on itself. Members are listed in the order
    /// the services were added, and cycles are ordered by their first member.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<NodeIndex>> = petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|mut component| {
                component.sort_unstable();
                component
            })
            .collect();
        cycles.sort_unstable_by_key(|component| component.first().copied());
        cycles
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .map(|index| self.graph[index].clone())
                    .collect()
            })
            .collect()
    }

    /// Returns an order in which every service starts after its dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn start_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|index| self.graph[index].clone())
                .collect()),
            Err(cycle) => Err(QuadlifyError::DependencyCycle {
                service: self.graph[cycle.node_id()].clone(),
            }),
        }
    }
}
