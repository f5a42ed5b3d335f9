//! Semantic analysis
//!
//! Runs the checks the SSA construction relies on, in order: literal
//! ranges, variable declaration/initialization status (including loop
//! control placement), types, and all-paths-return.

pub mod errors;
pub mod literals;
pub mod returns;
pub mod types;
pub mod variables;

use crate::ast::*;
use std::collections::HashSet;
use xcc_common::CompilerError;

pub use errors::SemanticError;
use types::TypeAnalysis;
use variables::VariableStatusAnalysis;

#[derive(Debug, Default)]
pub struct SemanticAnalyzer;

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, program: &Program) -> Result<(), CompilerError> {
        self.check_program(program).map_err(CompilerError::from)
    }

    fn check_program(&self, program: &Program) -> Result<(), SemanticError> {
        let mut seen = HashSet::new();
        for function in &program.functions {
            if !seen.insert(function.name.as_str()) {
                return Err(SemanticError::DuplicateFunction {
                    name: function.name.clone(),
                    span: function.span.clone(),
                });
            }
        }
        if !seen.contains("main") {
            return Err(SemanticError::MissingMain {
                span: program.span.clone(),
            });
        }

        for function in &program.functions {
            log::debug!("semantic analysis of '{}'", function.name);
            literals::check_function(function)?;
            VariableStatusAnalysis::check_function(function)?;
            TypeAnalysis::check_function(function)?;
            returns::check_function(function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
