//! x86-64 C-subset Compiler - Frontend
//!
//! This crate provides the frontend components of the compiler:
//! - Lexer: tokenizes source text
//! - Parser: builds the AST from tokens
//! - AST: abstract syntax tree definitions
//! - Semantic analysis: literal ranges, definite initialization, types,
//!   loop control placement and all-paths-return

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use ast::{
    AssignOp, BinaryOp, Expression, ExpressionKind, FunctionDefinition, Program, Statement,
    StatementKind, Type, UnaryOp,
};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{ParseError, Parser};
pub use semantic::{SemanticAnalyzer, SemanticError};

use xcc_common::CompilerError;

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Parse source text into an AST
    pub fn parse_source(source: &str, filename: &str) -> Result<Program, CompilerError> {
        let tokens = Lexer::new(source, filename).tokenize()?;
        Parser::new(tokens).parse_program()
    }

    /// Parse and semantically check source text
    pub fn analyze_source(source: &str, filename: &str) -> Result<Program, CompilerError> {
        let program = Self::parse_source(source, filename)?;
        SemanticAnalyzer::new().analyze(&program)?;
        Ok(program)
    }

    pub fn tokenize_source(source: &str, filename: &str) -> Result<Vec<Token>, CompilerError> {
        Lexer::new(source, filename).tokenize()
    }

    /// AST as pretty-printed JSON
    pub fn program_to_json(program: &Program) -> Result<String, CompilerError> {
        serde_json::to_string_pretty(program).map_err(|e| CompilerError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frontend_parse_simple_function() {
        let source = r#"
int main() {
    return 42;
}
"#;
        let program = Frontend::parse_source(source, "simple.l2").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "main");
        assert_eq!(program.functions[0].return_type, Type::Int);
    }

    #[test]
    fn test_frontend_tokenize() {
        let tokens = Frontend::tokenize_source("int x = 42;", "t.l2").unwrap();
        // int, x, =, 42, ;, EOF
        assert_eq!(tokens.len(), 6);
        assert!(matches!(tokens[0].token_type, TokenType::Int));
        assert!(matches!(tokens[1].token_type, TokenType::Identifier(_)));
        assert!(matches!(tokens[2].token_type, TokenType::Equal));
        assert!(matches!(tokens[3].token_type, TokenType::IntLiteral { value: 42, hex: false }));
        assert!(matches!(tokens[4].token_type, TokenType::Semicolon));
        assert!(matches!(tokens[5].token_type, TokenType::EndOfFile));
    }

    #[test]
    fn test_analyze_reports_phase_specific_errors() {
        let parse = Frontend::analyze_source("int main() { return 1 }", "e.l2").unwrap_err();
        assert_eq!(parse.exit_status().code(), 42);

        let semantic = Frontend::analyze_source("int main() { int x; return x; }", "e.l2").unwrap_err();
        assert_eq!(semantic.exit_status().code(), 7);
    }

    #[test]
    fn test_program_json_dump() {
        let program = Frontend::parse_source("int main() { return 1; }", "j.l2").unwrap();
        let json = Frontend::program_to_json(&program).unwrap();
        assert!(json.contains("\"name\": \"main\""));
        assert!(json.contains("\"Return\""));
    }
}
