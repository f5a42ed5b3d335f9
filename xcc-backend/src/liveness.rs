//! Liveness of SSA values over the block schedule
//!
//! Phis are defined at the top of their block. A phi operand is used at
//! the end of the predecessor the value arrives from, not in the phi's
//! block. Block sets are iterated to a fixpoint; per-node sets are then
//! derived by walking each block backwards once.

use crate::schedule::{phi_operand_on_edge, value_operands, value_phis, Schedule};
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap};
use xcc_ir::graph::{IrGraph, NodeId};

pub type LiveSet = BTreeSet<NodeId>;

#[derive(Debug, Default, Clone)]
pub struct Liveness {
    live_in: HashMap<NodeId, LiveSet>,
    live_out: HashMap<NodeId, LiveSet>,
    live_before: HashMap<NodeId, LiveSet>,
    live_after: HashMap<NodeId, LiveSet>,
}

static EMPTY: LiveSet = BTreeSet::new();

impl Liveness {
    pub fn analyze(graph: &IrGraph, schedule: &Schedule) -> Self {
        let mut liveness = Self::default();
        for scheduled in &schedule.blocks {
            liveness.live_in.insert(scheduled.block, LiveSet::new());
            liveness.live_out.insert(scheduled.block, LiveSet::new());
        }

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            changed = false;
            rounds += 1;
            for scheduled in schedule.blocks.iter().rev() {
                let block = scheduled.block;
                let out = liveness.block_live_out(graph, block);
                let live_in = liveness.transfer(graph, &scheduled.nodes, out.clone(), false);
                if liveness.live_out.get(&block) != Some(&out) || liveness.live_in.get(&block) != Some(&live_in) {
                    changed = true;
                    liveness.live_out.insert(block, out);
                    liveness.live_in.insert(block, live_in);
                }
            }
        }
        debug!("liveness for '{}' settled after {} rounds", graph.name(), rounds);

        for scheduled in &schedule.blocks {
            let out = liveness.live_out(scheduled.block).clone();
            liveness.transfer(graph, &scheduled.nodes, out, true);
        }
        liveness
    }

    /// Live-in of every successor minus its phis, plus the phi operands
    /// flowing along the edge from `block`
    fn block_live_out(&self, graph: &IrGraph, block: NodeId) -> LiveSet {
        let mut out = LiveSet::new();
        let Some(control) = graph.terminator(block) else {
            return out;
        };
        for successor in graph.block_successors(block) {
            if successor == graph.end_block() {
                continue;
            }
            let phis = value_phis(graph, successor);
            out.extend(
                self.live_in(successor)
                    .iter()
                    .filter(|value| !phis.contains(value)),
            );
            out.extend(
                phis.iter()
                    .filter_map(|&phi| phi_operand_on_edge(graph, phi, control)),
            );
        }
        out
    }

    /// Walks `nodes` backwards from `live`, returning the set live at the
    /// top of the block. Phis end up defined there and are not live-in.
    fn transfer(&mut self, graph: &IrGraph, nodes: &[NodeId], mut live: LiveSet, record: bool) -> LiveSet {
        for &node in nodes.iter().rev() {
            if record {
                self.live_after.insert(node, live.clone());
            }
            live.remove(&node);
            live.extend(value_operands(graph, node));
            if record {
                trace!("{}: live before {:?}", node, live);
                self.live_before.insert(node, live.clone());
            }
        }
        live
    }

    pub fn live_in(&self, block: NodeId) -> &LiveSet {
        self.live_in.get(&block).unwrap_or(&EMPTY)
    }

    pub fn live_out(&self, block: NodeId) -> &LiveSet {
        self.live_out.get(&block).unwrap_or(&EMPTY)
    }

    pub fn live_before(&self, node: NodeId) -> &LiveSet {
        self.live_before.get(&node).unwrap_or(&EMPTY)
    }

    pub fn live_after(&self, node: NodeId) -> &LiveSet {
        self.live_after.get(&node).unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xcc_frontend::Frontend;
    use xcc_ir::graph::{CompareOp, NodeKind};
    use xcc_ir::{OptLevel, SsaTranslation};

    fn build(source: &str) -> IrGraph {
        let program = Frontend::analyze_source(source, "live.l2").unwrap();
        SsaTranslation::new(&program.functions[0], OptLevel::O0.optimizer())
            .translate()
            .unwrap()
    }

    fn set(values: &[NodeId]) -> LiveSet {
        values.iter().copied().collect()
    }

    #[test]
    fn test_straight_line_equations() {
        let graph = build("int main() { int a = 1; int b = 2; int c = a + b; return c * a; }");
        let schedule = Schedule::build(&graph);
        let liveness = Liveness::analyze(&graph, &schedule);

        assert_eq!(schedule.blocks.len(), 1);
        let nodes = &schedule.blocks[0].nodes;
        let [a, b, c, product, ret] = nodes.as_slice() else {
            panic!("unexpected schedule {:?}", nodes);
        };

        assert_eq!(liveness.live_after(*a), &set(&[*a]));
        assert_eq!(liveness.live_after(*b), &set(&[*a, *b]));
        assert_eq!(liveness.live_after(*c), &set(&[*a, *c]));
        assert_eq!(liveness.live_before(*product), &set(&[*a, *c]));
        assert_eq!(liveness.live_after(*product), &set(&[*product]));
        assert_eq!(liveness.live_after(*ret), &set(&[]));
        assert_eq!(liveness.live_before(*a), &set(&[]));

        for &node in nodes {
            let mut expected = liveness.live_after(node).clone();
            expected.remove(&node);
            expected.extend(value_operands(&graph, node));
            assert_eq!(liveness.live_before(node), &expected);
        }
    }

    #[test]
    fn test_loop_carried_values_live_around_back_edge() {
        let graph = build(
            "int main() { int i = 0; int n = 10; while (i < n) { i += 1; } return i; }",
        );
        let schedule = Schedule::build(&graph);
        let liveness = Liveness::analyze(&graph, &schedule);

        let compare = schedule
            .values(&graph)
            .find(|&node| matches!(graph.kind(node), NodeKind::Compare(CompareOp::Lt)))
            .unwrap();
        let header = graph.block_of(compare);
        let n = graph.predecessor(compare, 1).unwrap();

        // n is read in the header on every iteration, so it stays live
        // through the body and into the header again
        assert!(liveness.live_in(header).contains(&n));
        for scheduled in &schedule.blocks {
            if scheduled.block != header && graph.block_successors(scheduled.block).contains(&header) {
                assert!(liveness.live_out(scheduled.block).contains(&n));
            }
        }

        // the header phi is defined in the header, not live into it
        let phi = value_phis(&graph, header)[0];
        assert!(!liveness.live_in(header).contains(&phi));
    }
}
