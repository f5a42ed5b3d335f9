//! x86-64 C-subset Compiler - Assembly Model
//!
//! This crate holds the target side shared by the backend and the
//! simulator:
//!
//! - Instruction and register definitions, printed in AT&T syntax
//! - Register roles and stack frame layout
//! - The process entry sequence and text emission

pub mod abi;
pub mod asm;
pub mod emit;

pub use abi::{AbiError, CallingConvention, Frame};
pub use asm::{AsmInst, Cond, Operand, Reg, ShiftCount};
pub use emit::{emit_instructions, EmitError};

use xcc_common::CompilerError;

/// Label of a compiled function; the bare name `main` belongs to the
/// process entry point
pub fn function_label(name: &str) -> String {
    format!("_{}", name)
}

/// `main` calls the compiled `main` and exits with its result
pub fn entry_sequence() -> Vec<AsmInst> {
    vec![
        AsmInst::Directive(".global main".to_string()),
        AsmInst::Directive(".text".to_string()),
        AsmInst::Label("main".to_string()),
        AsmInst::Call(function_label("main")),
        AsmInst::Movq(Reg::Rax.into(), Reg::Rdi.into()),
        AsmInst::Movq(Operand::Imm(0x3C), Reg::Rax.into()),
        AsmInst::Syscall,
    ]
}

/// Entry sequence followed by the given function bodies, as text
pub fn generate_assembly(functions: Vec<Vec<AsmInst>>) -> Result<String, EmitError> {
    let mut program = entry_sequence();
    for body in functions {
        program.extend(body);
    }
    emit_instructions(&program)
}

impl From<EmitError> for CompilerError {
    fn from(err: EmitError) -> Self {
        CompilerError::internal(err.to_string())
    }
}
