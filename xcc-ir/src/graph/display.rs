//! Textual dump of a graph, one block per paragraph in reverse postorder

use super::ir_graph::IrGraph;
use super::node::NodeId;
use std::fmt;

impl IrGraph {
    fn fmt_block(&self, f: &mut fmt::Formatter<'_>, block: NodeId) -> fmt::Result {
        let label = if block == self.start_block() {
            " (start)"
        } else if block == self.end_block() {
            " (end)"
        } else {
            ""
        };
        let preds: Vec<String> = self
            .block_predecessors(block)
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(f, "{}{}: preds [{}]", block, label, preds.join(", "))?;

        for &id in self.block_nodes(block) {
            write!(f, "  {} = {}", id, self.kind(id))?;
            let operands = self.predecessors(id);
            if !operands.is_empty() {
                let operands: Vec<String> = operands.iter().map(ToString::to_string).collect();
                write!(f, " ({})", operands.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for IrGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph {} {{", self.name())?;
        for block in self.reverse_postorder() {
            if block != self.end_block() {
                self.fmt_block(f, block)?;
            }
        }
        writeln!(f, "}}")
    }
}
