//! Fixed five-node interaction graph.
//!
//! # Overview
//!
//! Every window is scored on the same topology: one node per role in
//! [`ROLES`] order, and one directed arc per distinct `(from, to)` role
//! pair observed. Arc weights count how many hand-offs used that pair, so
//!
//! - the arc count is the number of distinct edges, and
//! - a node's weighted out/in degree is that role's out/in tally.
//!
//! Arcs from a role to itself appear when two different players share a
//! role.

#![allow(clippy::module_name_repetitions)]

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};

use huddle_core::model::{ROLES, Role, RoleTally};

use crate::edges::Edge;

/// Directed role graph with hand-off counts as arc weights.
#[derive(Debug, Clone)]
pub struct InteractionGraph {
    graph: DiGraph<Role, u32>,
    nodes: [NodeIndex; ROLES.len()],
}

impl Default for InteractionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionGraph {
    /// Graph with the five role nodes and no arcs.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = DiGraph::with_capacity(ROLES.len(), ROLES.len() * ROLES.len());
        let nodes = ROLES.map(|role| graph.add_node(role));
        Self { graph, nodes }
    }

    /// Build a graph from a list of edges, duplicates included.
    #[must_use]
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut graph = Self::new();
        for &edge in edges {
            graph.record(edge);
        }
        graph
    }

    /// Add one hand-off, creating the arc on first use.
    pub fn record(&mut self, edge: Edge) {
        let (a, b) = (self.node(edge.from), self.node(edge.to));
        if let Some(arc) = self.graph.find_edge(a, b) {
            if let Some(weight) = self.graph.edge_weight_mut(arc) {
                *weight += 1;
            }
        } else {
            self.graph.add_edge(a, b, 1);
        }
    }

    /// Number of distinct `(from, to)` pairs observed.
    #[must_use]
    pub fn distinct_pairs(&self) -> usize {
        self.graph.edge_count()
    }

    /// Total number of hand-offs (sum of arc weights).
    #[must_use]
    pub fn hand_offs(&self) -> u32 {
        self.graph.edge_weights().sum()
    }

    /// Hand-offs between `from` and `to`.
    #[must_use]
    pub fn weight(&self, from: Role, to: Role) -> u32 {
        self.graph
            .find_edge(self.node(from), self.node(to))
            .and_then(|arc| self.graph.edge_weight(arc))
            .copied()
            .unwrap_or(0)
    }

    /// Weighted out-degree per role.
    #[must_use]
    pub fn out_tally(&self) -> RoleTally {
        self.tally(Direction::Outgoing)
    }

    /// Weighted in-degree per role.
    #[must_use]
    pub fn in_tally(&self) -> RoleTally {
        self.tally(Direction::Incoming)
    }

    fn tally(&self, direction: Direction) -> RoleTally {
        let mut tally = RoleTally::new();
        for role in ROLES {
            let degree = self
                .graph
                .edges_directed(self.node(role), direction)
                .map(|arc| *arc.weight())
                .sum();
            tally.set(role, degree);
        }
        tally
    }

    const fn node(&self, role: Role) -> NodeIndex {
        self.nodes[role.index()]
    }
}
