//! Function lowering - block layout, control flow and phi edges
//!
//! Blocks are emitted in schedule order, so a jump to the next block is
//! left out. A branch edge into a block with phis gets its own stub label
//! after the function body, where that edge's phi moves run.

use super::phi::sequentialize;
use crate::naming::LabelNames;
use crate::regalloc::RegisterAllocation;
use crate::schedule::{phi_operand_on_edge, value_phis, Schedule, ScheduledBlock};
use crate::BackendError;
use log::{debug, info, trace};
use xcc_codegen::{AsmInst, CallingConvention, Cond, Frame, Operand};
use xcc_ir::graph::*;

struct EdgeStub {
    label: String,
    control: NodeId,
    target: NodeId,
}

pub struct FunctionLowering<'a> {
    pub(super) graph: &'a IrGraph,
    schedule: &'a Schedule,
    allocation: &'a RegisterAllocation,
    labels: LabelNames<'a>,
    frame: Frame,
    pub(super) out: Vec<AsmInst>,
    stubs: Vec<EdgeStub>,
}

impl<'a> FunctionLowering<'a> {
    pub fn new(
        graph: &'a IrGraph,
        schedule: &'a Schedule,
        allocation: &'a RegisterAllocation,
    ) -> Result<Self, BackendError> {
        let frame = Frame::new(allocation.spill_slots()).map_err(|source| BackendError::Frame {
            function: graph.name().to_string(),
            source,
        })?;
        Ok(Self {
            graph,
            schedule,
            allocation,
            labels: LabelNames::new(graph.name()),
            frame,
            out: Vec::new(),
            stubs: Vec::new(),
        })
    }

    pub fn lower(mut self) -> Result<Vec<AsmInst>, BackendError> {
        info!("lowering function '{}'", self.graph.name());
        self.out.push(AsmInst::Label(self.labels.function()));
        self.out.extend(self.frame.prologue());

        let schedule = self.schedule;
        for scheduled in &schedule.blocks {
            self.lower_block(scheduled)?;
        }

        for stub in std::mem::take(&mut self.stubs) {
            self.out.push(AsmInst::Label(stub.label));
            let copies = self.edge_copies(stub.control, stub.target)?;
            self.out.extend(copies);
            self.out.push(AsmInst::Jmp(self.labels.block(stub.target)));
        }

        debug!(
            "'{}': {} instructions, frame of {} bytes",
            self.graph.name(),
            self.out.len(),
            self.frame.size()
        );
        Ok(self.out)
    }

    pub(super) fn location(&self, value: NodeId) -> Result<Operand, BackendError> {
        self.allocation
            .location(value)
            .map(|location| location.operand())
            .ok_or_else(|| BackendError::Unallocated {
                function: self.graph.name().to_string(),
                node: value,
            })
    }

    pub(super) fn unsupported(&self, node: NodeId, message: &str) -> BackendError {
        BackendError::Internal {
            function: self.graph.name().to_string(),
            node,
            kind: self.graph.kind(node).to_string(),
            block: self.graph.block_of(node),
            message: message.to_string(),
        }
    }

    fn lower_block(&mut self, scheduled: &ScheduledBlock) -> Result<(), BackendError> {
        self.out.push(AsmInst::Label(self.labels.block(scheduled.block)));
        let graph = self.graph;
        let next = self.schedule.next_block(scheduled.block);

        for &node in &scheduled.nodes {
            match graph.kind(node) {
                NodeKind::Phi { .. } => {}
                NodeKind::Jump { target } => self.lower_jump(node, *target, next)?,
                NodeKind::Branch { on_true, on_false } => {
                    self.lower_branch(node, *on_true, *on_false, next)?
                }
                NodeKind::Return => self.lower_return(node)?,
                _ => self.lower_value(node)?,
            }
        }

        let terminated = scheduled
            .terminator()
            .is_some_and(|last| graph.kind(last).is_terminator());
        if !terminated {
            return Err(self.unsupported(scheduled.block, "block has no control node"));
        }
        Ok(())
    }

    /// Phi moves for the edge entered by `control`
    fn edge_copies(&self, control: NodeId, target: NodeId) -> Result<Vec<AsmInst>, BackendError> {
        let mut moves = Vec::new();
        for phi in value_phis(self.graph, target) {
            let source = phi_operand_on_edge(self.graph, phi, control)
                .ok_or_else(|| self.unsupported(phi, "no operand for incoming edge"))?;
            moves.push((self.location(source)?, self.location(phi)?));
        }
        trace!("edge {} -> {}: {} phi moves", control, target, moves.len());
        Ok(sequentialize(moves))
    }

    fn lower_jump(&mut self, control: NodeId, target: NodeId, next: Option<NodeId>) -> Result<(), BackendError> {
        let copies = self.edge_copies(control, target)?;
        self.out.extend(copies);
        if next != Some(target) {
            self.out.push(AsmInst::Jmp(self.labels.block(target)));
        }
        Ok(())
    }

    fn lower_branch(
        &mut self,
        control: NodeId,
        on_true: NodeId,
        on_false: NodeId,
        next: Option<NodeId>,
    ) -> Result<(), BackendError> {
        let graph = self.graph;
        let condition = graph
            .predecessor(control, BRANCH_CONDITION_INDEX)
            .map(|operand| graph.skip_proj(operand))
            .ok_or_else(|| self.unsupported(control, "branch without condition"))?;

        if let NodeKind::ConstBool(value) = graph.kind(condition) {
            let target = if *value { on_true } else { on_false };
            return self.lower_jump(control, target, next);
        }

        let true_label = self.edge_label(control, on_true);
        let false_label = self.edge_label(control, on_false);
        self.out.push(AsmInst::Cmpl(Operand::Imm(0), self.location(condition)?));
        self.out.push(AsmInst::J(Cond::E, false_label));
        if next != Some(on_true) || true_label != self.labels.block(on_true) {
            self.out.push(AsmInst::Jmp(true_label));
        }
        Ok(())
    }

    /// Direct block label, or a stub label when the edge carries phi moves
    fn edge_label(&mut self, control: NodeId, target: NodeId) -> String {
        if value_phis(self.graph, target).is_empty() {
            return self.labels.block(target);
        }
        let label = self.labels.edge(self.graph.block_of(control), target);
        self.stubs.push(EdgeStub {
            label: label.clone(),
            control,
            target,
        });
        label
    }

    fn lower_return(&mut self, node: NodeId) -> Result<(), BackendError> {
        let value = self
            .graph
            .predecessor(node, RETURN_RESULT_INDEX)
            .map(|operand| self.graph.skip_proj(operand))
            .ok_or_else(|| self.unsupported(node, "return without value"))?;
        let result = Operand::Reg(CallingConvention::RETURN_VALUE);
        self.out.push(AsmInst::Movl(self.location(value)?, result));
        self.out.extend(self.frame.epilogue());
        Ok(())
    }
}
