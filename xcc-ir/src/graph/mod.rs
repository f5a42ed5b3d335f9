//! SSA graph data model

mod display;
pub mod ir_graph;
pub mod node;

pub use ir_graph::IrGraph;
pub use node::*;
