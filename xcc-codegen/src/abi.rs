//! Register conventions and stack frame layout
//!
//! Every function keeps a frame pointer. Spill slots are 8 bytes apart
//! below `%rbp`, and the frame is padded so `%rsp` stays 16-byte aligned.

use crate::asm::{AsmInst, Operand, Reg};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbiError {
    #[error("Stack frame too large: {0} spill slots")]
    FrameTooLarge(usize),
}

/// Register roles
///
/// - `%eax` is never allocated: it stages operands, receives results of
///   `idivl`, `setcc` and return values, and breaks parallel-copy cycles.
/// - `%rsp` and `%rbp` hold the stack and frame pointers.
/// - Everything else is available to the allocator.
pub struct CallingConvention;

impl CallingConvention {
    pub const SCRATCH: Reg = Reg::Rax;
    pub const RETURN_VALUE: Reg = Reg::Rax;
    pub const STACK_PTR: Reg = Reg::Rsp;
    pub const FRAME_PTR: Reg = Reg::Rbp;

    /// Allocation order
    pub const ALLOCATABLE: [Reg; 13] = [
        Reg::Rbx, Reg::Rcx, Reg::Rdx, Reg::Rsi, Reg::Rdi,
        Reg::R8, Reg::R9, Reg::R10, Reg::R11, Reg::R12, Reg::R13, Reg::R14, Reg::R15,
    ];

    /// Implicit operand of `idivl` and `cltd`, besides the scratch register
    pub const DIVIDEND_HIGH: Reg = Reg::Rdx;

    /// Variable shift counts must live in `%cl`
    pub const SHIFT_COUNT: Reg = Reg::Rcx;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    spill_slots: usize,
}

impl Frame {
    const SLOT_SIZE: i32 = 8;
    const MAX_SLOTS: usize = 1 << 24;

    pub fn new(spill_slots: usize) -> Result<Self, AbiError> {
        if spill_slots > Self::MAX_SLOTS {
            return Err(AbiError::FrameTooLarge(spill_slots));
        }
        Ok(Self { spill_slots })
    }

    pub fn spill_slots(&self) -> usize {
        self.spill_slots
    }

    /// Bytes reserved below `%rbp`, rounded up to 16
    pub fn size(&self) -> i32 {
        let raw = self.spill_slots as i32 * Self::SLOT_SIZE;
        (raw + 15) & !15
    }

    /// Address of spill slot `index`, counting from zero
    pub fn slot(index: usize) -> Operand {
        Operand::Mem {
            base: CallingConvention::FRAME_PTR,
            offset: -Self::SLOT_SIZE * (index as i32 + 1),
        }
    }

    pub fn prologue(&self) -> Vec<AsmInst> {
        let mut insts = vec![
            AsmInst::Pushq(CallingConvention::FRAME_PTR.into()),
            AsmInst::Movq(
                CallingConvention::STACK_PTR.into(),
                CallingConvention::FRAME_PTR.into(),
            ),
        ];
        if self.size() > 0 {
            insts.push(AsmInst::Subq(self.size(), CallingConvention::STACK_PTR));
        }
        insts
    }

    /// Return with the value already in `%eax`
    pub fn epilogue(&self) -> Vec<AsmInst> {
        vec![AsmInst::Leave, AsmInst::Ret]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_rounds_to_sixteen() {
        assert_eq!(Frame::new(0).unwrap().size(), 0);
        assert_eq!(Frame::new(1).unwrap().size(), 16);
        assert_eq!(Frame::new(2).unwrap().size(), 16);
        assert_eq!(Frame::new(3).unwrap().size(), 32);
    }

    #[test]
    fn test_slot_offsets() {
        assert_eq!(Frame::slot(0), Operand::Mem { base: Reg::Rbp, offset: -8 });
        assert_eq!(Frame::slot(2), Operand::Mem { base: Reg::Rbp, offset: -24 });
    }

    #[test]
    fn test_prologue_skips_empty_frame() {
        let text: Vec<String> = Frame::new(0)
            .unwrap()
            .prologue()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(text, vec!["pushq %rbp", "movq %rsp, %rbp"]);

        let with_spills = Frame::new(3).unwrap().prologue();
        assert_eq!(with_spills.last(), Some(&AsmInst::Subq(32, Reg::Rsp)));
    }

    #[test]
    fn test_pool_excludes_reserved_registers() {
        for reserved in [Reg::Rax, Reg::Rsp, Reg::Rbp] {
            assert!(!CallingConvention::ALLOCATABLE.contains(&reserved));
        }
        assert_eq!(CallingConvention::ALLOCATABLE.len(), 13);
    }
}
