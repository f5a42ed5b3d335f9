//! x86-64 C-subset Compiler - Backend
//!
//! Turns SSA graphs into x86-64 assembly:
//!
//! 1. schedule blocks and nodes
//! 2. compute liveness
//! 3. color the interference graph, spilling past the register pool
//! 4. select instructions, resolving phis on control-flow edges

pub mod error;
pub mod liveness;
pub mod lower;
pub mod naming;
pub mod regalloc;
pub mod schedule;

pub use error::BackendError;
pub use liveness::Liveness;
pub use lower::FunctionLowering;
pub use regalloc::{allocate_registers, Location, RegisterAllocation};
pub use schedule::Schedule;

use log::info;
use xcc_codegen::AsmInst;
use xcc_common::CompilerError;
use xcc_ir::IrGraph;

/// Everything the backend derives for one function
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: String,
    pub allocation: RegisterAllocation,
    pub instructions: Vec<AsmInst>,
}

pub fn compile_function(graph: &IrGraph) -> Result<CompiledFunction, BackendError> {
    let schedule = Schedule::build(graph);
    let liveness = Liveness::analyze(graph, &schedule);
    let allocation = allocate_registers(graph, &schedule, &liveness);
    let instructions = FunctionLowering::new(graph, &schedule, &allocation)?.lower()?;
    Ok(CompiledFunction {
        name: graph.name().to_string(),
        allocation,
        instructions,
    })
}

pub fn compile_program(graphs: &[IrGraph]) -> Result<Vec<CompiledFunction>, CompilerError> {
    info!("generating code for {} functions", graphs.len());
    let functions = graphs
        .iter()
        .map(compile_function)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(functions)
}

/// Entry sequence followed by every function body
pub fn program_instructions(functions: &[CompiledFunction]) -> Vec<AsmInst> {
    let mut program = xcc_codegen::entry_sequence();
    for function in functions {
        program.extend(function.instructions.iter().cloned());
    }
    program
}

pub fn emit_program(functions: &[CompiledFunction]) -> Result<String, CompilerError> {
    let bodies = functions
        .iter()
        .map(|function| function.instructions.clone())
        .collect();
    Ok(xcc_codegen::generate_assembly(bodies)?)
}
