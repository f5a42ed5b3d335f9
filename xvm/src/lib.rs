//! xvm - a simulator for the x86-64 instruction subset emitted by xcc
//!
//! Programs are run straight from `AsmInst` lists, so tests can execute
//! compiled code without an assembler or a Linux host.

pub mod constants;
pub mod error;
pub mod vm;

pub use error::VmError;
pub use vm::{Machine, MachineState};
