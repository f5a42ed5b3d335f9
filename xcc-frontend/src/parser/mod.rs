//! Recursive descent parser
//!
//! Grammar (one or more functions per file):
//!
//! ```text
//! program    := function+
//! function   := type ident '(' ')' block
//! statement  := block | simple ';' | if | while | for
//!             | 'break' ';' | 'continue' ';' | 'return' expr ';'
//! simple     := type ident ('=' expr)? | ident asnop expr
//! ```
//!
//! Expression precedence is documented in [`expressions`].

pub mod errors;
pub mod expressions;
pub mod statements;

use crate::ast::*;
use crate::lexer::{Token, TokenType};
use std::collections::VecDeque;
use xcc_common::{CompilerError, SourceLocation, SourceSpan};

pub use errors::ParseError;

pub struct Parser {
    pub(crate) tokens: VecDeque<Token>,
    /// Where the end-of-file token sits, for errors reported after it is consumed
    eof_location: SourceLocation,
    /// End of the most recently consumed token
    last_end: SourceLocation,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof_location = tokens
            .last()
            .map(|t| t.span.start.clone())
            .unwrap_or_else(SourceLocation::dummy);
        Self {
            tokens: tokens.into(),
            last_end: eof_location.clone(),
            eof_location,
        }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    pub(crate) fn peek_type(&self) -> &TokenType {
        self.peek()
            .map(|t| &t.token_type)
            .unwrap_or(&TokenType::EndOfFile)
    }

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.pop_front()?;
        self.last_end = token.span.end.clone();
        Some(token)
    }

    /// Discriminant-only comparison, so `Identifier(_)` matches any name
    pub(crate) fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(self.peek_type()) == std::mem::discriminant(token_type)
    }

    pub(crate) fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token_type: TokenType, context: &str) -> Result<Token, ParseError> {
        match self.advance() {
            Some(token) if token.token_type == TokenType::EndOfFile => {
                Err(ParseError::UnexpectedEndOfFile {
                    expected: format!("'{}' in {}", token_type, context),
                    location: token.span.start,
                })
            }
            Some(token)
                if std::mem::discriminant(&token.token_type)
                    == std::mem::discriminant(&token_type) =>
            {
                Ok(token)
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: format!("'{}' in {}", token_type, context),
                found: token,
            }),
            None => Err(ParseError::UnexpectedEndOfFile {
                expected: format!("'{}' in {}", token_type, context),
                location: self.eof_location.clone(),
            }),
        }
    }

    pub(crate) fn expect_identifier(&mut self, context: &str) -> Result<(String, SourceSpan), ParseError> {
        let expected = format!("identifier in {}", context);
        match self.advance() {
            Some(Token { token_type: TokenType::Identifier(name), span }) => Ok((name, span)),
            Some(Token { token_type: TokenType::EndOfFile, span }) => {
                Err(ParseError::UnexpectedEndOfFile { expected, location: span.start })
            }
            Some(found) => Err(ParseError::UnexpectedToken { expected, found }),
            None => Err(ParseError::UnexpectedEndOfFile {
                expected,
                location: self.eof_location.clone(),
            }),
        }
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        match self.peek() {
            Some(token) => token.span.start.clone(),
            None => self.eof_location.clone(),
        }
    }

    /// Span from `start` to the end of the last consumed token
    pub(crate) fn span_from(&self, start: SourceLocation) -> SourceSpan {
        SourceSpan::new(start, self.last_end.clone())
    }

    pub fn parse_program(&mut self) -> Result<Program, CompilerError> {
        let start = self.current_location();
        let mut functions = Vec::new();

        while !self.check(&TokenType::EndOfFile) {
            functions.push(self.parse_function()?);
        }
        if functions.is_empty() {
            return Err(ParseError::UnexpectedEndOfFile {
                expected: "a function definition".to_string(),
                location: self.current_location(),
            }
            .into());
        }

        Ok(Program {
            functions,
            span: self.span_from(start),
        })
    }

    fn parse_function(&mut self) -> Result<FunctionDefinition, CompilerError> {
        let start = self.current_location();
        let return_type = self.parse_type("function definition")?;
        let (name, _) = self.expect_identifier("function definition")?;
        self.expect(TokenType::LeftParen, "function definition")?;
        self.expect(TokenType::RightParen, "function definition")?;
        let body = self.parse_compound_statement()?;

        Ok(FunctionDefinition {
            name,
            return_type,
            body,
            span: self.span_from(start),
        })
    }

    pub(crate) fn parse_type(&mut self, context: &str) -> Result<Type, ParseError> {
        match self.advance() {
            Some(Token { token_type: TokenType::Int, .. }) => Ok(Type::Int),
            Some(Token { token_type: TokenType::Bool, .. }) => Ok(Type::Bool),
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: format!("type in {}", context),
                found: token,
            }),
            None => Err(ParseError::UnexpectedEndOfFile {
                expected: format!("type in {}", context),
                location: self.eof_location.clone(),
            }),
        }
    }
}
