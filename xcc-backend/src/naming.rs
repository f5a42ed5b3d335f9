//! Label names for one function
//!
//! Block labels end in `_<block>`, edge labels in `to<block>`, so neither
//! can collide with a label of another function.

use xcc_ir::graph::NodeId;

#[derive(Debug, Clone, Copy)]
pub struct LabelNames<'a> {
    function: &'a str,
}

impl<'a> LabelNames<'a> {
    pub fn new(function: &'a str) -> Self {
        Self { function }
    }

    pub fn function(&self) -> String {
        xcc_codegen::function_label(self.function)
    }

    pub fn block(&self, block: NodeId) -> String {
        format!(".L{}_{}", self.function, block.0)
    }

    /// Stub on the edge `from -> to` holding that edge's phi moves
    pub fn edge(&self, from: NodeId, to: NodeId) -> String {
        format!(".L{}_{}to{}", self.function, from.0, to.0)
    }
}
