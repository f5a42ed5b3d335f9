//! Instruction selection for value nodes
//!
//! Results are written only after every operand has been read, since an
//! operand whose last use is here may share the result's location.
//! `%rdx` and `%rcx` are allocatable, so division and variable shifts
//! save them around their implicit use.

use super::function::FunctionLowering;
use crate::BackendError;
use xcc_codegen::{AsmInst, CallingConvention, Cond, Operand, Reg, ShiftCount};
use xcc_ir::graph::*;

fn condition(op: CompareOp) -> Cond {
    match op {
        CompareOp::Lt => Cond::L,
        CompareOp::Le => Cond::Le,
        CompareOp::Gt => Cond::G,
        CompareOp::Ge => Cond::Ge,
        CompareOp::Eq => Cond::E,
        CompareOp::Ne => Cond::Ne,
    }
}

const SCRATCH: Operand = Operand::Reg(CallingConvention::SCRATCH);

impl FunctionLowering<'_> {
    pub(super) fn lower_value(&mut self, node: NodeId) -> Result<(), BackendError> {
        let dst = self.location(node)?;
        match self.graph.kind(node) {
            NodeKind::ConstInt(value) => self.out.push(AsmInst::Movl(Operand::Imm(*value), dst)),
            NodeKind::ConstBool(value) => {
                self.out.push(AsmInst::Movl(Operand::Imm(i32::from(*value)), dst))
            }
            NodeKind::Binary(op) => {
                let op = *op;
                let (left, right) = self.binary_operands(node)?;
                match op {
                    BinaryOp::Div | BinaryOp::Mod => self.lower_division(op, left, right, dst)?,
                    BinaryOp::Shl | BinaryOp::Shr => self.lower_shift(op, left, right, dst)?,
                    BinaryOp::Mul => self.lower_multiply(left, right, dst)?,
                    _ => self.lower_arithmetic(node, op, left, right, dst)?,
                }
            }
            NodeKind::Compare(op) => {
                let cond = condition(*op);
                let (left, right) = self.binary_operands(node)?;
                let (left, right) = (self.location(left)?, self.location(right)?);
                self.out.extend([
                    AsmInst::Movl(left, SCRATCH),
                    AsmInst::Cmpl(right, SCRATCH),
                    AsmInst::Set(cond, CallingConvention::SCRATCH),
                    AsmInst::Movzbl(CallingConvention::SCRATCH, CallingConvention::SCRATCH),
                    AsmInst::Movl(SCRATCH, dst),
                ]);
            }
            _ => return Err(self.unsupported(node, "node kind has no instruction sequence")),
        }
        Ok(())
    }

    fn binary_operands(&self, node: NodeId) -> Result<(NodeId, NodeId), BackendError> {
        let operand = |index| {
            self.graph
                .predecessor(node, index)
                .map(|operand| self.graph.skip_proj(operand))
                .ok_or_else(|| self.unsupported(node, "missing operand"))
        };
        Ok((operand(LEFT_INDEX)?, operand(RIGHT_INDEX)?))
    }

    fn constant(&self, value: NodeId) -> Option<i32> {
        match self.graph.kind(value) {
            NodeKind::ConstInt(constant) => Some(*constant),
            _ => None,
        }
    }

    /// `dst = left op right` for two-address instructions. Computes in
    /// place when `dst` is a register that does not hold `right`.
    fn two_address(
        &mut self,
        left: Operand,
        right: Operand,
        dst: Operand,
        op: impl Fn(Operand, Operand) -> AsmInst,
    ) {
        match dst {
            Operand::Reg(_) if dst != right => {
                if left != dst {
                    self.out.push(AsmInst::Movl(left, dst));
                }
                self.out.push(op(right, dst));
            }
            _ => {
                self.out.push(AsmInst::Movl(left, SCRATCH));
                self.out.push(op(right, SCRATCH));
                self.out.push(AsmInst::Movl(SCRATCH, dst));
            }
        }
    }

    fn lower_arithmetic(
        &mut self,
        node: NodeId,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        dst: Operand,
    ) -> Result<(), BackendError> {
        let (left, right) = (self.location(left)?, self.location(right)?);
        let inst: fn(Operand, Operand) -> AsmInst = match op {
            BinaryOp::Add => AsmInst::Addl,
            BinaryOp::Sub => AsmInst::Subl,
            BinaryOp::BitAnd => AsmInst::Andl,
            BinaryOp::BitOr => AsmInst::Orl,
            BinaryOp::BitXor => AsmInst::Xorl,
            _ => return Err(self.unsupported(node, "not a two-address operator")),
        };
        self.two_address(left, right, dst, inst);
        Ok(())
    }

    /// Multiplying by a positive power of two becomes a left shift
    fn lower_multiply(&mut self, left: NodeId, right: NodeId, dst: Operand) -> Result<(), BackendError> {
        let (value, shift) = match (self.constant(left), self.constant(right)) {
            (_, Some(c)) if c > 0 && (c as u32).is_power_of_two() => (left, c.trailing_zeros()),
            (Some(c), _) if c > 0 && (c as u32).is_power_of_two() => (right, c.trailing_zeros()),
            _ => {
                let (left, right) = (self.location(left)?, self.location(right)?);
                let target = match dst {
                    Operand::Reg(reg) if dst != right => reg,
                    _ => CallingConvention::SCRATCH,
                };
                let target_operand = Operand::Reg(target);
                if left != target_operand {
                    self.out.push(AsmInst::Movl(left, target_operand));
                }
                self.out.push(AsmInst::Imull(right, target));
                if target_operand != dst {
                    self.out.push(AsmInst::Movl(target_operand, dst));
                }
                return Ok(());
            }
        };
        let value = self.location(value)?;
        self.shift_by_immediate(AsmInst::Shll, value, shift as u8, dst);
        Ok(())
    }

    fn shift_by_immediate(
        &mut self,
        inst: fn(ShiftCount, Operand) -> AsmInst,
        value: Operand,
        count: u8,
        dst: Operand,
    ) {
        let target = if matches!(dst, Operand::Reg(_)) { dst } else { SCRATCH };
        if value != target {
            self.out.push(AsmInst::Movl(value, target));
        }
        self.out.push(inst(ShiftCount::Imm(count), target));
        if target != dst {
            self.out.push(AsmInst::Movl(target, dst));
        }
    }

    fn lower_shift(&mut self, op: BinaryOp, left: NodeId, right: NodeId, dst: Operand) -> Result<(), BackendError> {
        let inst: fn(ShiftCount, Operand) -> AsmInst = if op == BinaryOp::Shl {
            AsmInst::Shll
        } else {
            AsmInst::Sarl
        };
        let value = self.location(left)?;
        if let Some(count) = self.constant(right) {
            self.shift_by_immediate(inst, value, (count & 31) as u8, dst);
            return Ok(());
        }

        let count = self.location(right)?;
        let rcx = CallingConvention::SHIFT_COUNT;
        self.out.extend([
            AsmInst::Pushq(rcx.into()),
            AsmInst::Movl(value, SCRATCH),
            AsmInst::Movl(count, rcx.into()),
            inst(ShiftCount::Cl, SCRATCH),
        ]);
        self.restore(rcx, dst);
        self.out.push(AsmInst::Movl(SCRATCH, dst));
        Ok(())
    }

    /// `cltd` and `idivl` use `%edx:%eax`. A divisor living in `%edx` is
    /// read back from the saved copy on the stack.
    fn lower_division(&mut self, op: BinaryOp, left: NodeId, right: NodeId, dst: Operand) -> Result<(), BackendError> {
        let rdx = CallingConvention::DIVIDEND_HIGH;
        let (dividend, divisor) = (self.location(left)?, self.location(right)?);
        let divisor = if divisor == Operand::Reg(rdx) {
            Operand::Mem {
                base: CallingConvention::STACK_PTR,
                offset: 0,
            }
        } else {
            divisor
        };

        self.out.extend([
            AsmInst::Pushq(rdx.into()),
            AsmInst::Movl(dividend, SCRATCH),
            AsmInst::Cltd,
            AsmInst::Idivl(divisor),
        ]);
        if op == BinaryOp::Mod {
            self.out.push(AsmInst::Movl(rdx.into(), SCRATCH));
        }
        self.restore(rdx, dst);
        self.out.push(AsmInst::Movl(SCRATCH, dst));
        Ok(())
    }

    /// Pops a saved register, or drops the saved copy when the result
    /// is about to overwrite it anyway
    fn restore(&mut self, saved: Reg, dst: Operand) {
        if dst == Operand::Reg(saved) {
            self.out.push(AsmInst::Addq(8, CallingConvention::STACK_PTR));
        } else {
            self.out.push(AsmInst::Popq(saved.into()));
        }
    }
}
