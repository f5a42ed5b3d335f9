//! Constant folding and block-local value numbering
//!
//! Numbering is keyed per block so a reused node always dominates the
//! place it is reused from. Div and Mod are never numbered: they sit on
//! the side-effect chain and may trap.

use super::Optimizer;
use crate::graph::*;
use log::trace;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKind {
    ConstInt(i32),
    ConstBool(bool),
    Binary(BinaryOp),
    Compare(CompareOp),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ValueKey {
    block: NodeId,
    kind: ValueKind,
    operands: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct LocalValueNumbering {
    table: HashMap<ValueKey, NodeId>,
}

impl LocalValueNumbering {
    fn key(graph: &IrGraph, node: NodeId) -> Option<ValueKey> {
        let (kind, commutative) = match graph.kind(node) {
            NodeKind::ConstInt(value) => (ValueKind::ConstInt(*value), false),
            NodeKind::ConstBool(value) => (ValueKind::ConstBool(*value), false),
            NodeKind::Binary(op) if !op.has_side_effect() => {
                (ValueKind::Binary(*op), op.is_commutative())
            }
            NodeKind::Compare(op) => (ValueKind::Compare(*op), op.is_commutative()),
            _ => return None,
        };
        let mut operands = graph.predecessors(node).to_vec();
        if commutative {
            operands.sort();
        }
        Some(ValueKey {
            block: graph.block_of(node),
            kind,
            operands,
        })
    }

    fn int_operands(graph: &IrGraph, node: NodeId) -> Option<(i32, i32)> {
        let left = graph.predecessor(node, LEFT_INDEX)?;
        let right = graph.predecessor(node, RIGHT_INDEX)?;
        match (graph.kind(left), graph.kind(right)) {
            (NodeKind::ConstInt(l), NodeKind::ConstInt(r)) => Some((*l, *r)),
            _ => None,
        }
    }

    fn folded_kind(graph: &IrGraph, node: NodeId) -> Option<NodeKind> {
        match graph.kind(node) {
            NodeKind::Binary(op) => {
                let (left, right) = Self::int_operands(graph, node)?;
                op.evaluate(left, right).map(NodeKind::ConstInt)
            }
            NodeKind::Compare(op) => {
                if let Some((left, right)) = Self::int_operands(graph, node) {
                    return Some(NodeKind::ConstBool(op.evaluate(left, right)));
                }
                let left = graph.predecessor(node, LEFT_INDEX)?;
                let right = graph.predecessor(node, RIGHT_INDEX)?;
                match (op, graph.kind(left), graph.kind(right)) {
                    (CompareOp::Eq, NodeKind::ConstBool(l), NodeKind::ConstBool(r)) => {
                        Some(NodeKind::ConstBool(l == r))
                    }
                    (CompareOp::Ne, NodeKind::ConstBool(l), NodeKind::ConstBool(r)) => {
                        Some(NodeKind::ConstBool(l != r))
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Existing equivalent node in the same block, or `node` itself
    fn number(&mut self, graph: &mut IrGraph, node: NodeId) -> NodeId {
        let Some(key) = Self::key(graph, node) else {
            return node;
        };
        match self.table.get(&key) {
            Some(&existing) if graph.contains(existing) => {
                trace!("value numbering: {} reuses {}", node, existing);
                existing
            }
            _ => {
                self.table.insert(key, node);
                node
            }
        }
    }
}

impl Optimizer for LocalValueNumbering {
    fn transform(&mut self, graph: &mut IrGraph, node: NodeId) -> NodeId {
        let Some(kind) = Self::folded_kind(graph, node) else {
            return self.number(graph, node);
        };

        trace!("folding {} ({}) to {}", node, graph.kind(node), kind);
        let block = graph.block_of(node);
        let span = graph.node(node).span.clone();
        let constant = graph.add_node(block, kind, Vec::new(), span);
        let numbered = self.number(graph, constant);
        if numbered != constant {
            graph.remove_node(constant);
        }
        numbered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn constant(graph: &mut IrGraph, opt: &mut LocalValueNumbering, value: i32) -> NodeId {
        let block = graph.start_block();
        let node = graph.add_node(block, NodeKind::ConstInt(value), vec![], None);
        let result = opt.transform(graph, node);
        if result != node {
            graph.remove_node(node);
        }
        result
    }

    #[test]
    fn test_constants_are_shared_per_block() {
        let mut graph = IrGraph::new("f");
        let mut opt = LocalValueNumbering::default();
        let a = constant(&mut graph, &mut opt, 5);
        let b = constant(&mut graph, &mut opt, 5);
        assert_eq!(a, b);
        assert!(!graph.contains(NodeId(b.0 + 1)));
    }

    #[test]
    fn test_folds_arithmetic_with_wrapping() {
        let mut graph = IrGraph::new("f");
        let mut opt = LocalValueNumbering::default();
        let block = graph.start_block();
        let max = constant(&mut graph, &mut opt, i32::MAX);
        let one = constant(&mut graph, &mut opt, 1);
        let sum = graph.add_node(block, NodeKind::Binary(BinaryOp::Add), vec![max, one], None);
        let folded = opt.transform(&mut graph, sum);
        assert_eq!(graph.kind(folded), &NodeKind::ConstInt(i32::MIN));
    }

    #[test]
    fn test_does_not_fold_trapping_division() {
        let mut graph = IrGraph::new("f");
        let mut opt = LocalValueNumbering::default();
        let block = graph.start_block();
        let one = constant(&mut graph, &mut opt, 1);
        let zero = constant(&mut graph, &mut opt, 0);
        let side_effect = graph.start();
        let div = graph.add_node(
            block,
            NodeKind::Binary(BinaryOp::Div),
            vec![one, zero, side_effect],
            None,
        );
        assert_eq!(opt.transform(&mut graph, div), div);
    }

    #[test]
    fn test_commutative_operands_share_a_number() {
        let mut graph = IrGraph::new("f");
        let mut opt = LocalValueNumbering::default();
        let block = graph.start_block();
        let start = graph.start();
        let x = graph.add_node(block, NodeKind::Proj(ProjKind::Result), vec![start], None);
        let y = graph.add_node(block, NodeKind::Proj(ProjKind::Result), vec![start], None);

        let first = graph.add_node(block, NodeKind::Binary(BinaryOp::Mul), vec![x, y], None);
        assert_eq!(opt.transform(&mut graph, first), first);
        let second = graph.add_node(block, NodeKind::Binary(BinaryOp::Mul), vec![y, x], None);
        assert_eq!(opt.transform(&mut graph, second), first);

        let lt = graph.add_node(block, NodeKind::Compare(CompareOp::Lt), vec![x, y], None);
        assert_eq!(opt.transform(&mut graph, lt), lt);
        let gt = graph.add_node(block, NodeKind::Compare(CompareOp::Lt), vec![y, x], None);
        assert_eq!(opt.transform(&mut graph, gt), gt);
    }

    #[test]
    fn test_folds_bool_equality() {
        let mut graph = IrGraph::new("f");
        let mut opt = LocalValueNumbering::default();
        let block = graph.start_block();
        let t = graph.add_node(block, NodeKind::ConstBool(true), vec![], None);
        let f = graph.add_node(block, NodeKind::ConstBool(false), vec![], None);
        let eq = graph.add_node(block, NodeKind::Compare(CompareOp::Eq), vec![t, f], None);
        let folded = opt.transform(&mut graph, eq);
        assert_eq!(graph.kind(folded), &NodeKind::ConstBool(false));
    }
}
