//! Lowering of allocated SSA graphs to x86-64 instructions

mod function;
mod instruction;
pub mod phi;

pub use function::FunctionLowering;
