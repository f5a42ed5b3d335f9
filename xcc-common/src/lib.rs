//! x86-64 C-subset Compiler - Common Types and Utilities
//!
//! Shared source-location tracking and the error taxonomy used by every
//! phase of the compiler, from the lexer down to the simulator.

pub mod error;
pub mod source_loc;

pub use error::{CompilerError, ExitStatus};
pub use source_loc::{SourceLocation, SourceSpan};
