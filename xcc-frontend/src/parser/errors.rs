//! Parse error types

use crate::lexer::Token;
use thiserror::Error;
use xcc_common::{CompilerError, SourceLocation};

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: Token },

    #[error("Unexpected end of file, expected {expected}")]
    UnexpectedEndOfFile {
        expected: String,
        location: SourceLocation,
    },

    #[error("{message}")]
    InvalidStatement {
        message: String,
        location: SourceLocation,
    },
}

impl From<ParseError> for CompilerError {
    fn from(err: ParseError) -> Self {
        let message = err.to_string();
        match err {
            ParseError::UnexpectedToken { found, .. } => {
                CompilerError::parse_error(message, found.span.start)
            }
            ParseError::UnexpectedEndOfFile { location, .. }
            | ParseError::InvalidStatement { location, .. } => {
                CompilerError::parse_error(message, location)
            }
        }
    }
}
