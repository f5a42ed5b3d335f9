//! Greedy coloring in maximum cardinality search order
//!
//! SSA interference graphs are chordal, and coloring them greedily in the
//! order produced by maximum cardinality search uses the fewest colors.
//! Colors past the register pool become stack slots, one slot per color,
//! so interfering spilled values never share a slot.

use super::interference::InterferenceGraph;
use log::{debug, trace};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use xcc_codegen::{CallingConvention, Frame, Operand, Reg};
use xcc_ir::graph::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Location {
    Register(Reg),
    /// Index of an 8-byte slot below the frame pointer
    Spill(usize),
}

impl Location {
    pub fn operand(self) -> Operand {
        match self {
            Location::Register(reg) => Operand::Reg(reg),
            Location::Spill(slot) => Frame::slot(slot),
        }
    }

    fn from_color(color: usize) -> Self {
        let pool = &CallingConvention::ALLOCATABLE;
        match pool.get(color) {
            Some(&reg) => Location::Register(reg),
            None => Location::Spill(color - pool.len()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operand())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RegisterAllocation {
    locations: BTreeMap<NodeId, Location>,
    spill_slots: usize,
}

impl RegisterAllocation {
    pub fn location(&self, value: NodeId) -> Option<Location> {
        self.locations.get(&value).copied()
    }

    pub fn spill_slots(&self) -> usize {
        self.spill_slots
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Location)> + '_ {
        self.locations.iter().map(|(&value, &location)| (value, location))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Maximum cardinality search: repeatedly take the unvisited vertex with
/// the most visited neighbors, lowest id first on ties
pub fn mcs_order(interference: &InterferenceGraph) -> Vec<NodeId> {
    let mut weights: BTreeMap<NodeId, usize> =
        interference.vertices().map(|value| (value, 0)).collect();
    let mut order = Vec::with_capacity(weights.len());

    while let Some(next) = weights
        .iter()
        .max_by(|(a_id, a_weight), (b_id, b_weight)| a_weight.cmp(b_weight).then(b_id.cmp(a_id)))
        .map(|(&value, _)| value)
    {
        weights.remove(&next);
        for neighbor in interference.neighbors(next) {
            if let Some(weight) = weights.get_mut(&neighbor) {
                *weight += 1;
            }
        }
        order.push(next);
    }
    order
}

/// Smallest color not in `taken`; at most `taken.len()`
fn lowest_free_color(taken: &BTreeSet<usize>) -> usize {
    let mut color = 0;
    while taken.contains(&color) {
        color += 1;
    }
    color
}

pub fn allocate(function: &str, interference: &InterferenceGraph) -> RegisterAllocation {
    let mut colors: BTreeMap<NodeId, usize> = BTreeMap::new();
    for value in mcs_order(interference) {
        let taken: BTreeSet<usize> = interference
            .neighbors(value)
            .filter_map(|neighbor| colors.get(&neighbor).copied())
            .collect();
        let color = lowest_free_color(&taken);
        trace!("{} gets color {}", value, color);
        colors.insert(value, color);
    }

    let locations: BTreeMap<NodeId, Location> = colors
        .into_iter()
        .map(|(value, color)| (value, Location::from_color(color)))
        .collect();
    let spill_slots = locations
        .values()
        .filter_map(|location| match location {
            Location::Spill(slot) => Some(slot + 1),
            Location::Register(_) => None,
        })
        .max()
        .unwrap_or(0);

    debug!(
        "allocated {} values in '{}', {} spill slots",
        locations.len(),
        function,
        spill_slots
    );
    RegisterAllocation {
        locations,
        spill_slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clique(size: u32) -> InterferenceGraph {
        let mut graph = InterferenceGraph::default();
        for a in 0..size {
            graph.add_vertex(NodeId(a));
            for b in 0..a {
                graph.add_edge(NodeId(a), NodeId(b));
            }
        }
        graph
    }

    #[test]
    fn test_lowest_free_color_fills_gaps() {
        assert_eq!(lowest_free_color(&BTreeSet::new()), 0);
        assert_eq!(lowest_free_color(&BTreeSet::from([0, 1, 3])), 2);
        assert_eq!(lowest_free_color(&BTreeSet::from([0, 1, 2])), 3);
        assert_eq!(lowest_free_color(&BTreeSet::from([1, 2])), 0);
    }

    #[test]
    fn test_mcs_breaks_ties_by_id() {
        let mut graph = InterferenceGraph::default();
        graph.add_edge(NodeId(5), NodeId(7));
        graph.add_edge(NodeId(7), NodeId(9));
        graph.add_vertex(NodeId(2));
        assert_eq!(mcs_order(&graph), vec![NodeId(2), NodeId(5), NodeId(7), NodeId(9)]);
    }

    #[test]
    fn test_no_spills_when_pool_suffices() {
        let allocation = allocate("f", &clique(13));
        assert_eq!(allocation.spill_slots(), 0);
        let registers: BTreeSet<Reg> = allocation
            .iter()
            .filter_map(|(_, location)| match location {
                Location::Register(reg) => Some(reg),
                Location::Spill(_) => None,
            })
            .collect();
        assert_eq!(registers.len(), 13);
    }

    #[test]
    fn test_spilled_values_never_share_a_location() {
        let graph = clique(16);
        let allocation = allocate("f", &graph);
        assert_eq!(allocation.spill_slots(), 3);
        for (a, location_a) in allocation.iter() {
            for (b, location_b) in allocation.iter() {
                if graph.interferes(a, b) {
                    assert_ne!(location_a, location_b, "{} and {} collide", a, b);
                }
            }
        }
        assert_eq!(
            allocation.location(NodeId(15)).map(Location::operand),
            Some(Operand::Mem { base: Reg::Rbp, offset: -24 })
        );
    }

    #[test]
    fn test_non_interfering_values_reuse_registers() {
        let mut graph = InterferenceGraph::default();
        graph.add_vertex(NodeId(1));
        graph.add_vertex(NodeId(2));
        let allocation = allocate("f", &graph);
        assert_eq!(allocation.location(NodeId(1)), Some(Location::Register(Reg::Rbx)));
        assert_eq!(allocation.location(NodeId(2)), Some(Location::Register(Reg::Rbx)));
    }
}
