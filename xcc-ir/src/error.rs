use crate::graph::NodeId;
use thiserror::Error;
use xcc_common::{CompilerError, SourceSpan};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrError {
    #[error("'{keyword}' outside of a loop at {span}")]
    LoopControlOutsideLoop { keyword: &'static str, span: SourceSpan },

    #[error("no definition of '{variable}' reaches {block}")]
    MissingDefinition { variable: String, block: NodeId },

    #[error("{message} ({node}: {kind} in {block})")]
    Consistency {
        node: NodeId,
        kind: String,
        block: NodeId,
        message: String,
    },
}

impl IrError {
    /// Loop control misuse is a user error; anything else is a compiler fault
    pub fn into_compiler_error(self, function: &str) -> CompilerError {
        match self {
            IrError::LoopControlOutsideLoop { keyword, span } => CompilerError::SemanticError {
                message: format!("'{}' outside of a loop", keyword),
                span,
            },
            other => CompilerError::IrError {
                function: function.to_string(),
                message: other.to_string(),
            },
        }
    }
}
