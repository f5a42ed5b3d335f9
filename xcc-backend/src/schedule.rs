//! Block layout and per-block node order
//!
//! Blocks are laid out in reverse postorder from the start block. Inside a
//! block, phis come first, then the remaining value nodes in creation
//! order, then the block's control node. Start, projections and
//! side-effect phis carry no value and are left out.

use log::trace;
use std::collections::HashMap;
use xcc_ir::graph::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledBlock {
    pub block: NodeId,
    pub nodes: Vec<NodeId>,
}

impl ScheduledBlock {
    pub fn terminator(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub blocks: Vec<ScheduledBlock>,
    /// Layout position of each block
    positions: HashMap<NodeId, usize>,
}

impl Schedule {
    pub fn build(graph: &IrGraph) -> Self {
        let blocks: Vec<ScheduledBlock> = graph
            .reverse_postorder()
            .into_iter()
            .filter(|&block| block != graph.end_block())
            .map(|block| schedule_block(graph, block))
            .collect();
        let positions = blocks
            .iter()
            .enumerate()
            .map(|(position, scheduled)| (scheduled.block, position))
            .collect();
        Self { blocks, positions }
    }

    pub fn block(&self, block: NodeId) -> Option<&ScheduledBlock> {
        self.blocks.get(*self.positions.get(&block)?)
    }

    /// Block laid out right after `block`, if any
    pub fn next_block(&self, block: NodeId) -> Option<NodeId> {
        let position = *self.positions.get(&block)?;
        self.blocks.get(position + 1).map(|scheduled| scheduled.block)
    }

    /// Every scheduled node with a value, in layout order
    pub fn values<'a>(&'a self, graph: &'a IrGraph) -> impl Iterator<Item = NodeId> + 'a {
        self.blocks
            .iter()
            .flat_map(|scheduled| scheduled.nodes.iter().copied())
            .filter(move |&node| graph.produces_value(node))
    }
}

fn schedule_block(graph: &IrGraph, block: NodeId) -> ScheduledBlock {
    let mut body: Vec<NodeId> = graph
        .block_nodes(block)
        .iter()
        .copied()
        .filter(|&node| !graph.kind(node).is_phi() && graph.produces_value(node))
        .collect();
    body.sort();

    let mut nodes = value_phis(graph, block);
    nodes.extend(body);
    nodes.extend(graph.terminator(block));
    trace!("schedule {}: {:?}", block, nodes);
    ScheduledBlock { block, nodes }
}

/// Value operands a node reads in its own block. Phi operands are read on
/// the incoming edges instead, and side-effect tokens are not values.
pub fn value_operands(graph: &IrGraph, node: NodeId) -> Vec<NodeId> {
    let positions: &[usize] = match graph.kind(node) {
        NodeKind::Binary(_) | NodeKind::Compare(_) => &[LEFT_INDEX, RIGHT_INDEX],
        NodeKind::Branch { .. } => &[BRANCH_CONDITION_INDEX],
        NodeKind::Return => &[RETURN_RESULT_INDEX],
        _ => &[],
    };
    positions
        .iter()
        .filter_map(|&index| graph.predecessor(node, index))
        .map(|operand| graph.skip_proj(operand))
        .collect()
}

/// The value a data phi receives along the edge entered by `control`
pub fn phi_operand_on_edge(graph: &IrGraph, phi: NodeId, control: NodeId) -> Option<NodeId> {
    let block = graph.block_of(phi);
    let index = graph.edge_index(block, control)?;
    graph
        .predecessor(phi, index)
        .map(|operand| graph.skip_proj(operand))
}

/// Data phis of `block`
pub fn value_phis(graph: &IrGraph, block: NodeId) -> Vec<NodeId> {
    let mut phis: Vec<NodeId> = graph
        .phis(block)
        .filter(|&phi| graph.produces_value(phi))
        .collect();
    phis.sort();
    phis
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xcc_frontend::Frontend;
    use xcc_ir::{OptLevel, SsaTranslation};

    #[test]
    fn test_block_lookup_follows_layout() {
        let program = Frontend::analyze_source(
            "int main() { int i = 0; while (i < 3) { i += 1; } return i; }",
            "schedule.l2",
        )
        .unwrap();
        let graph = SsaTranslation::new(&program.functions[0], OptLevel::O1.optimizer())
            .translate()
            .unwrap();
        let schedule = Schedule::build(&graph);

        assert_eq!(schedule.blocks[0].block, graph.start_block());
        for (position, scheduled) in schedule.blocks.iter().enumerate() {
            assert_eq!(schedule.block(scheduled.block), Some(scheduled));
            assert_eq!(
                schedule.next_block(scheduled.block),
                schedule.blocks.get(position + 1).map(|next| next.block)
            );
        }
        assert_eq!(schedule.block(graph.end_block()), None);
        assert_eq!(schedule.next_block(graph.end_block()), None);
    }
}
