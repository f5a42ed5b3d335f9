//! Semantic analysis error definitions

use crate::ast::Type;
use thiserror::Error;
use xcc_common::{CompilerError, SourceSpan};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("Integer literal {literal} is out of range")]
    LiteralOutOfRange { literal: String, span: SourceSpan },

    #[error("Variable '{name}' must be declared before use")]
    UndeclaredVariable { name: String, span: SourceSpan },

    #[error("Variable '{name}' is already declared")]
    Redeclaration { name: String, span: SourceSpan },

    #[error("Variable '{name}' must be initialized before use")]
    Uninitialized { name: String, span: SourceSpan },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: Type,
        found: Type,
        span: SourceSpan,
    },

    #[error("Operator '{op}' cannot be applied to {operand}")]
    InvalidOperand {
        op: String,
        operand: Type,
        span: SourceSpan,
    },

    #[error("'{keyword}' outside of a loop")]
    LoopControlOutsideLoop {
        keyword: &'static str,
        span: SourceSpan,
    },

    #[error("Step statement of a for loop may not be a declaration")]
    DeclarationInForStep { span: SourceSpan },

    #[error("Function '{name}' does not return on every path")]
    MissingReturn { name: String, span: SourceSpan },

    #[error("Function '{name}' is defined more than once")]
    DuplicateFunction { name: String, span: SourceSpan },

    #[error("Program does not define a 'main' function")]
    MissingMain { span: SourceSpan },
}

impl SemanticError {
    pub fn span(&self) -> &SourceSpan {
        match self {
            SemanticError::LiteralOutOfRange { span, .. }
            | SemanticError::UndeclaredVariable { span, .. }
            | SemanticError::Redeclaration { span, .. }
            | SemanticError::Uninitialized { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::InvalidOperand { span, .. }
            | SemanticError::LoopControlOutsideLoop { span, .. }
            | SemanticError::DeclarationInForStep { span }
            | SemanticError::MissingReturn { span, .. }
            | SemanticError::DuplicateFunction { span, .. }
            | SemanticError::MissingMain { span } => span,
        }
    }
}

impl From<SemanticError> for CompilerError {
    fn from(err: SemanticError) -> Self {
        CompilerError::semantic_error(err.to_string(), err.span().clone())
    }
}
