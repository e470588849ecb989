//! Relation-derived dependency ordering using `petgraph`.
//!
//! Relations are by-name and may point in both directions, so the manifest
//! never needs this graph. It answers a narrower question for planning
//! tools: in which order could the resources be brought up so that every
//! relation target precedes the resources referring to it?

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use topos_common::error::{Result, ToposError};

use crate::resource::Resource;

/// A dependency graph of resources.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<String, ()>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
        }
    }

    /// Builds the graph from resources, one node per resource and one edge
    /// per relation whose target is among them.
    pub fn from_resources<'a>(resources: impl IntoIterator<Item = &'a Resource>) -> Self {
        let resources: Vec<&Resource> = resources.into_iter().collect();
        let mut graph = Self::new();
        let mut nodes = HashMap::new();
        for resource in &resources {
            let idx = graph.add_resource(resource.name());
            let _ = nodes.insert(resource.name(), idx);
        }
        for resource in &resources {
            for relation in resource.relations() {
                if let (Some(&from), Some(&to)) =
                    (nodes.get(resource.name()), nodes.get(relation.target.as_str()))
                {
                    graph.add_dependency(from, to);
                }
            }
        }
        graph
    }

    /// Adds a resource node to the graph.
    pub fn add_resource(&mut self, name: impl Into<String>) -> NodeIndex {
        self.graph.add_node(name.into())
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.add_edge(dependency, dependent, ());
    }

    /// Returns the number of relation edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns a topological ordering of resources, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns an error if relations form a cycle.
    pub fn resolve_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(ToposError::Config {
                message: format!(
                    "cyclic relation involving \"{}\"",
                    self.graph
                        .node_weight(cycle.node_id())
                        .map_or("?", String::as_str)
                ),
            }),
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
