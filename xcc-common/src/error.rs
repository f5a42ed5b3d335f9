//! Error handling for the compiler
//!
//! Each phase defines its own error enum and converts into
//! [`CompilerError`], which the driver maps onto a process exit status.

use crate::source_loc::{SourceLocation, SourceSpan};
use std::fmt;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Lexical error at {location}: {message}")]
    LexError {
        location: SourceLocation,
        message: String,
    },

    #[error("Parse error at {location}: {message}")]
    ParseError {
        location: SourceLocation,
        message: String,
    },

    #[error("Semantic error at {span}: {message}")]
    SemanticError { span: SourceSpan, message: String },

    /// The IR graph broke an invariant a later pass relies on
    #[error("IR consistency error in '{function}': {message}")]
    IrError { function: String, message: String },

    #[error("Code generation error in '{function}': {message}")]
    CodegenError { function: String, message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

/// Process exit status for each failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    InvalidArguments,
    SemanticFailure,
    ParseFailure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::InvalidArguments => 3,
            ExitStatus::SemanticFailure => 7,
            ExitStatus::ParseFailure => 42,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl CompilerError {
    pub fn lexer_error(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::LexError {
            location,
            message: message.into(),
        }
    }

    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::ParseError {
            location,
            message: message.into(),
        }
    }

    pub fn semantic_error(message: impl Into<String>, span: SourceSpan) -> Self {
        CompilerError::SemanticError {
            span,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompilerError::InternalError {
            message: message.into(),
        }
    }

    /// Exit status the driver reports for this error
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CompilerError::LexError { .. } | CompilerError::ParseError { .. } => {
                ExitStatus::ParseFailure
            }
            CompilerError::SemanticError { .. } => ExitStatus::SemanticFailure,
            CompilerError::IrError { .. }
            | CompilerError::CodegenError { .. }
            | CompilerError::IoError { .. }
            | CompilerError::InternalError { .. } => ExitStatus::Failure,
        }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}
