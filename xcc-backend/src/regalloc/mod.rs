//! Register allocation by coloring the interference graph

pub mod allocator;
pub mod interference;

pub use allocator::{allocate, mcs_order, Location, RegisterAllocation};
pub use interference::InterferenceGraph;

use crate::liveness::Liveness;
use crate::schedule::Schedule;
use xcc_ir::graph::IrGraph;

/// Builds the interference graph of one function and colors it
pub fn allocate_registers(graph: &IrGraph, schedule: &Schedule, liveness: &Liveness) -> RegisterAllocation {
    let interference = InterferenceGraph::build(graph, schedule, liveness);
    allocate(graph.name(), &interference)
}
