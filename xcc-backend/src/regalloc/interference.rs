//! Interference graph over SSA values
//!
//! Two values interfere when both are live after the same node, or when
//! one is defined while the other is live. Phis of one block are all
//! written by the same parallel copy, so they always interfere with each
//! other, even when one of them is never read.

use crate::liveness::Liveness;
use crate::schedule::{value_phis, Schedule};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use xcc_ir::graph::{IrGraph, NodeId};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InterferenceGraph {
    edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl InterferenceGraph {
    pub fn build(graph: &IrGraph, schedule: &Schedule, liveness: &Liveness) -> Self {
        let mut interference = Self::default();
        for value in schedule.values(graph) {
            interference.add_vertex(value);
        }

        for scheduled in &schedule.blocks {
            for &node in &scheduled.nodes {
                let live: Vec<NodeId> = liveness.live_after(node).iter().copied().collect();
                for (i, &a) in live.iter().enumerate() {
                    for &b in &live[i + 1..] {
                        interference.add_edge(a, b);
                    }
                }
                if graph.produces_value(node) {
                    for &other in &live {
                        interference.add_edge(node, other);
                    }
                }
            }

            let phis = value_phis(graph, scheduled.block);
            for (i, &a) in phis.iter().enumerate() {
                for &b in &phis[i + 1..] {
                    interference.add_edge(a, b);
                }
            }
        }

        debug!(
            "interference graph for '{}': {} values, {} edges",
            graph.name(),
            interference.edges.len(),
            interference.edge_count()
        );
        interference
    }

    pub fn add_vertex(&mut self, value: NodeId) {
        self.edges.entry(value).or_default();
    }

    /// Self edges are ignored
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        self.edges.entry(a).or_default().insert(b);
        self.edges.entry(b).or_default().insert(a);
    }

    pub fn vertices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.edges.keys().copied()
    }

    pub fn neighbors(&self, value: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges.get(&value).into_iter().flatten().copied()
    }

    pub fn interferes(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.get(&a).is_some_and(|neighbors| neighbors.contains(&b))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_edges_are_symmetric() {
        let mut graph = InterferenceGraph::default();
        graph.add_edge(NodeId(1), NodeId(2));
        graph.add_edge(NodeId(2), NodeId(2));
        graph.add_vertex(NodeId(3));

        assert!(graph.interferes(NodeId(1), NodeId(2)));
        assert!(graph.interferes(NodeId(2), NodeId(1)));
        assert!(!graph.interferes(NodeId(2), NodeId(2)));
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.neighbors(NodeId(3)).count(), 0);
    }
}
