//! x86-64 Assembly Instruction Definitions
//!
//! This module defines the subset of the x86-64 instruction set the
//! compiler emits, printed in AT&T syntax (source first, destination last).

use serde::Serialize;
use std::fmt;

/// General purpose registers
///
/// Values are 32-bit, so registers print with their 32-bit names unless an
/// instruction works on full 64-bit words (stack and frame handling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Reg {
    Rax, Rbx, Rcx, Rdx, Rsi, Rdi, Rsp, Rbp,
    R8, R9, R10, R11, R12, R13, R14, R15,
}

impl Reg {
    pub const ALL: [Reg; 16] = [
        Reg::Rax, Reg::Rbx, Reg::Rcx, Reg::Rdx, Reg::Rsi, Reg::Rdi, Reg::Rsp, Reg::Rbp,
        Reg::R8, Reg::R9, Reg::R10, Reg::R11, Reg::R12, Reg::R13, Reg::R14, Reg::R15,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name64(self) -> &'static str {
        match self {
            Reg::Rax => "rax",
            Reg::Rbx => "rbx",
            Reg::Rcx => "rcx",
            Reg::Rdx => "rdx",
            Reg::Rsi => "rsi",
            Reg::Rdi => "rdi",
            Reg::Rsp => "rsp",
            Reg::Rbp => "rbp",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
            Reg::R10 => "r10",
            Reg::R11 => "r11",
            Reg::R12 => "r12",
            Reg::R13 => "r13",
            Reg::R14 => "r14",
            Reg::R15 => "r15",
        }
    }

    pub fn name32(self) -> &'static str {
        match self {
            Reg::Rax => "eax",
            Reg::Rbx => "ebx",
            Reg::Rcx => "ecx",
            Reg::Rdx => "edx",
            Reg::Rsi => "esi",
            Reg::Rdi => "edi",
            Reg::Rsp => "esp",
            Reg::Rbp => "ebp",
            Reg::R8 => "r8d",
            Reg::R9 => "r9d",
            Reg::R10 => "r10d",
            Reg::R11 => "r11d",
            Reg::R12 => "r12d",
            Reg::R13 => "r13d",
            Reg::R14 => "r14d",
            Reg::R15 => "r15d",
        }
    }

    pub fn name8(self) -> &'static str {
        match self {
            Reg::Rax => "al",
            Reg::Rbx => "bl",
            Reg::Rcx => "cl",
            Reg::Rdx => "dl",
            Reg::Rsi => "sil",
            Reg::Rdi => "dil",
            Reg::Rsp => "spl",
            Reg::Rbp => "bpl",
            Reg::R8 => "r8b",
            Reg::R9 => "r9b",
            Reg::R10 => "r10b",
            Reg::R11 => "r11b",
            Reg::R12 => "r12b",
            Reg::R13 => "r13b",
            Reg::R14 => "r14b",
            Reg::R15 => "r15b",
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name32())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operand {
    Reg(Reg),
    Imm(i32),
    /// `offset(%base)`
    Mem { base: Reg, offset: i32 },
}

impl Operand {
    pub fn is_mem(&self) -> bool {
        matches!(self, Operand::Mem { .. })
    }

    pub fn as_reg(&self) -> Option<Reg> {
        match self {
            Operand::Reg(reg) => Some(*reg),
            _ => None,
        }
    }

    /// Operand with 64-bit register names
    pub fn wide(&self) -> Wide<'_> {
        Wide(self)
    }

    fn fmt_with(&self, f: &mut fmt::Formatter<'_>, reg_name: fn(Reg) -> &'static str) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "%{}", reg_name(*reg)),
            Operand::Imm(value) => write!(f, "${}", value),
            Operand::Mem { base, offset } => write!(f, "{}(%{})", offset, base.name64()),
        }
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with(f, Reg::name32)
    }
}

pub struct Wide<'a>(&'a Operand);

impl fmt::Display for Wide<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_with(f, Reg::name64)
    }
}

/// Signed condition codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cond {
    E,
    Ne,
    L,
    Le,
    G,
    Ge,
}

impl Cond {
    pub fn suffix(self) -> &'static str {
        match self {
            Cond::E => "e",
            Cond::Ne => "ne",
            Cond::L => "l",
            Cond::Le => "le",
            Cond::G => "g",
            Cond::Ge => "ge",
        }
    }

    pub fn holds(self, left: i32, right: i32) -> bool {
        match self {
            Cond::E => left == right,
            Cond::Ne => left != right,
            Cond::L => left < right,
            Cond::Le => left <= right,
            Cond::G => left > right,
            Cond::Ge => left >= right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShiftCount {
    Imm(u8),
    /// Count in `%cl`
    Cl,
}

impl fmt::Display for ShiftCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftCount::Imm(count) => write!(f, "${}", count),
            ShiftCount::Cl => write!(f, "%cl"),
        }
    }
}

/// x86-64 Assembly Instructions
///
/// Two-operand forms are `(source, destination)`, as in AT&T syntax.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AsmInst {
    // Data movement
    Movl(Operand, Operand),
    Movq(Operand, Operand),
    Movzbl(Reg, Reg),               // zero-extend the low byte of src
    Pushq(Operand),
    Popq(Operand),

    // 32-bit arithmetic and logic
    Addl(Operand, Operand),
    Subl(Operand, Operand),
    Imull(Operand, Reg),
    Andl(Operand, Operand),
    Orl(Operand, Operand),
    Xorl(Operand, Operand),
    Shll(ShiftCount, Operand),
    Sarl(ShiftCount, Operand),
    Cltd,                           // sign-extend eax into edx
    Idivl(Operand),                 // edx:eax / src -> eax, remainder edx
    Cmpl(Operand, Operand),         // flags from dst - src
    Set(Cond, Reg),

    // 64-bit stack adjustment
    Addq(i32, Reg),
    Subq(i32, Reg),

    // Control flow
    Jmp(String),
    J(Cond, String),
    Call(String),
    Leave,
    Ret,
    Syscall,

    // Assembly pseudo-instructions
    Label(String),
    Directive(String),
    Comment(String),
}

impl AsmInst {
    /// Labels and directives start at column zero
    pub fn is_flush_left(&self) -> bool {
        matches!(self, AsmInst::Label(_) | AsmInst::Directive(_))
    }
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmInst::Movl(src, dst) => write!(f, "movl {}, {}", src, dst),
            AsmInst::Movq(src, dst) => write!(f, "movq {}, {}", src.wide(), dst.wide()),
            AsmInst::Movzbl(src, dst) => write!(f, "movzbl %{}, {}", src.name8(), dst),
            AsmInst::Pushq(src) => write!(f, "pushq {}", src.wide()),
            AsmInst::Popq(dst) => write!(f, "popq {}", dst.wide()),

            AsmInst::Addl(src, dst) => write!(f, "addl {}, {}", src, dst),
            AsmInst::Subl(src, dst) => write!(f, "subl {}, {}", src, dst),
            AsmInst::Imull(src, dst) => write!(f, "imull {}, {}", src, dst),
            AsmInst::Andl(src, dst) => write!(f, "andl {}, {}", src, dst),
            AsmInst::Orl(src, dst) => write!(f, "orl {}, {}", src, dst),
            AsmInst::Xorl(src, dst) => write!(f, "xorl {}, {}", src, dst),
            AsmInst::Shll(count, dst) => write!(f, "shll {}, {}", count, dst),
            AsmInst::Sarl(count, dst) => write!(f, "sarl {}, {}", count, dst),
            AsmInst::Cltd => write!(f, "cltd"),
            AsmInst::Idivl(src) => write!(f, "idivl {}", src),
            AsmInst::Cmpl(src, dst) => write!(f, "cmpl {}, {}", src, dst),
            AsmInst::Set(cond, dst) => write!(f, "set{} %{}", cond.suffix(), dst.name8()),

            AsmInst::Addq(value, dst) => write!(f, "addq ${}, %{}", value, dst.name64()),
            AsmInst::Subq(value, dst) => write!(f, "subq ${}, %{}", value, dst.name64()),

            AsmInst::Jmp(label) => write!(f, "jmp {}", label),
            AsmInst::J(cond, label) => write!(f, "j{} {}", cond.suffix(), label),
            AsmInst::Call(label) => write!(f, "call {}", label),
            AsmInst::Leave => write!(f, "leave"),
            AsmInst::Ret => write!(f, "ret"),
            AsmInst::Syscall => write!(f, "syscall"),

            AsmInst::Label(label) => write!(f, "{}:", label),
            AsmInst::Directive(text) => write!(f, "{}", text),
            AsmInst::Comment(text) => write!(f, "# {}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_display() {
        assert_eq!(format!("{}", Reg::Rax), "%eax");
        assert_eq!(format!("{}", Reg::R8), "%r8d");
        assert_eq!(Reg::Rsi.name8(), "sil");
        assert_eq!(Reg::R15.name64(), "r15");
    }

    #[test]
    fn test_operand_display() {
        let slot = Operand::Mem { base: Reg::Rbp, offset: -16 };
        assert_eq!(slot.to_string(), "-16(%rbp)");
        assert_eq!(Operand::Imm(-1).to_string(), "$-1");
        assert_eq!(Operand::Reg(Reg::Rdx).wide().to_string(), "%rdx");
    }

    #[test]
    fn test_instruction_display() {
        let slot = Operand::Mem { base: Reg::Rbp, offset: -8 };
        assert_eq!(
            AsmInst::Movl(Operand::Imm(42), Reg::Rbx.into()).to_string(),
            "movl $42, %ebx"
        );
        assert_eq!(AsmInst::Movq(Reg::Rsp.into(), Reg::Rbp.into()).to_string(), "movq %rsp, %rbp");
        assert_eq!(AsmInst::Pushq(slot).to_string(), "pushq -8(%rbp)");
        assert_eq!(AsmInst::Imull(Reg::Rcx.into(), Reg::Rax).to_string(), "imull %ecx, %eax");
        assert_eq!(AsmInst::Shll(ShiftCount::Cl, Reg::Rax.into()).to_string(), "shll %cl, %eax");
        assert_eq!(AsmInst::Sarl(ShiftCount::Imm(3), slot).to_string(), "sarl $3, -8(%rbp)");
        assert_eq!(AsmInst::Set(Cond::Le, Reg::Rax).to_string(), "setle %al");
        assert_eq!(AsmInst::Movzbl(Reg::Rax, Reg::Rax).to_string(), "movzbl %al, %eax");
        assert_eq!(AsmInst::Subq(32, Reg::Rsp).to_string(), "subq $32, %rsp");
        assert_eq!(AsmInst::J(Cond::E, ".Lmain_4".to_string()).to_string(), "je .Lmain_4");
        assert_eq!(AsmInst::Label("_main".to_string()).to_string(), "_main:");
    }

    #[test]
    fn test_condition_evaluation() {
        assert!(Cond::L.holds(-2, 1));
        assert!(!Cond::G.holds(1, 1));
        assert!(Cond::Ge.holds(1, 1));
    }
}
