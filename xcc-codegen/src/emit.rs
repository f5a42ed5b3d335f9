//! Assembly text output

use crate::asm::AsmInst;
use std::fmt::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Failed to format assembly: {0}")]
    Format(#[from] std::fmt::Error),
}

/// One instruction per line; instructions are indented, labels and
/// directives are not
pub fn emit_instructions(instructions: &[AsmInst]) -> Result<String, EmitError> {
    let mut output = String::new();
    for inst in instructions {
        if inst.is_flush_left() {
            writeln!(output, "{}", inst)?;
        } else {
            writeln!(output, "    {}", inst)?;
        }
    }
    Ok(output)
}
