//! x86-64 C-subset Compiler - Pipeline
//!
//! `compile_source` runs every phase in order and keeps each phase's
//! result, so the command line can print or save any of them.

use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use xcc_backend::{CompiledFunction, RegisterAllocation};
use xcc_codegen::AsmInst;
use xcc_common::CompilerError;
use xcc_frontend::{ast::Program, Frontend};
use xcc_ir::{IrGraph, OptLevel};
use xvm::{Machine, VmError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompileOptions {
    pub optimize: OptLevel,
}

/// Output of every phase for one source file
pub struct Compilation {
    pub program: Program,
    pub graphs: Vec<IrGraph>,
    pub functions: Vec<CompiledFunction>,
}

impl Compilation {
    pub fn assembly(&self) -> Result<String, CompilerError> {
        xcc_backend::emit_program(&self.functions)
    }

    pub fn instructions(&self) -> Vec<AsmInst> {
        xcc_backend::program_instructions(&self.functions)
    }

    pub fn ir_dump(&self) -> String {
        self.graphs.iter().map(|graph| format!("{}\n", graph)).collect()
    }

    /// Register assignment per function, keyed by function name
    pub fn allocations(&self) -> BTreeMap<&str, &RegisterAllocation> {
        self.functions
            .iter()
            .map(|function| (function.name.as_str(), &function.allocation))
            .collect()
    }

    /// Runs the program on the simulator from its process entry point
    pub fn run(&self) -> Result<i32, VmError> {
        Machine::new(&self.instructions())?.run_from("main")
    }
}

pub fn compile_source(source: &str, filename: &str, options: &CompileOptions) -> Result<Compilation, CompilerError> {
    info!("compiling {} at {}", filename, options.optimize);
    let program = Frontend::analyze_source(source, filename)?;
    let graphs = xcc_ir::translate_program(&program, || options.optimize.optimizer())?;
    let functions = xcc_backend::compile_program(&graphs)?;
    Ok(Compilation {
        program,
        graphs,
        functions,
    })
}

/// Compiles and simulates in one step
pub fn run_source(source: &str, options: &CompileOptions) -> Result<Result<i32, VmError>, CompilerError> {
    Ok(compile_source(source, "<input>", options)?.run())
}
