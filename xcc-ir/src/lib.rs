//! x86-64 C-subset Compiler - SSA Intermediate Representation
//!
//! Functions are translated straight from the AST into a graph in SSA
//! form. Blocks, control flow and values are all nodes in one arena per
//! function; phis are placed on demand while blocks are being sealed, so
//! no dominance frontier computation is needed.

pub mod error;
pub mod graph;
pub mod optimize;
pub mod ssa;

pub use error::IrError;
pub use graph::{IrGraph, NodeId, NodeKind};
pub use optimize::{LocalValueNumbering, NoOptimizer, OptLevel, Optimizer};
pub use ssa::{translate_program, SsaTranslation};
