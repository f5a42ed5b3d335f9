//! Lexer
//!
//! Turns source text into a token stream. Whitespace and comments are
//! dropped here; every token keeps the span it was read from.

pub mod comments;
pub mod literals;
pub mod token;

pub use token::{Token, TokenType};

use std::collections::HashMap;
use xcc_common::{CompilerError, SourceLocation, SourceSpan};

pub struct Lexer {
    pub(crate) input: Vec<char>,
    pub(crate) position: usize,
    pub(crate) line: u32,
    pub(crate) column: u32,
    filename: String,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(input: &str, filename: &str) -> Self {
        let keywords = [
            ("int", TokenType::Int),
            ("bool", TokenType::Bool),
            ("true", TokenType::True),
            ("false", TokenType::False),
            ("if", TokenType::If),
            ("else", TokenType::Else),
            ("while", TokenType::While),
            ("for", TokenType::For),
            ("break", TokenType::Break),
            ("continue", TokenType::Continue),
            ("return", TokenType::Return),
        ]
        .into_iter()
        .collect();

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            filename: filename.to_string(),
            keywords,
        }
    }

    pub(crate) fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub(crate) fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    pub(crate) fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        SourceLocation::new(&self.filename, self.line, self.column)
    }

    /// Consume `expected` if it is the next character
    fn eat(&mut self, expected: char) -> bool {
        if self.current_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn tokenize_identifier(&mut self) -> TokenType {
        let mut identifier = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match self.keywords.get(identifier.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenType::Identifier(identifier),
        }
    }

    /// Operator or delimiter starting at the current character
    fn tokenize_operator(&mut self, ch: char) -> Result<TokenType, CompilerError> {
        let location = self.current_location();
        self.advance();

        let token_type = match ch {
            '+' if self.eat('=') => TokenType::PlusEqual,
            '+' => TokenType::Plus,
            '-' if self.eat('=') => TokenType::MinusEqual,
            '-' => TokenType::Minus,
            '*' if self.eat('=') => TokenType::StarEqual,
            '*' => TokenType::Star,
            '/' if self.eat('=') => TokenType::SlashEqual,
            '/' => TokenType::Slash,
            '%' if self.eat('=') => TokenType::PercentEqual,
            '%' => TokenType::Percent,
            '&' if self.eat('&') => TokenType::AmpersandAmpersand,
            '&' if self.eat('=') => TokenType::AmpersandEqual,
            '&' => TokenType::Ampersand,
            '|' if self.eat('|') => TokenType::PipePipe,
            '|' if self.eat('=') => TokenType::PipeEqual,
            '|' => TokenType::Pipe,
            '^' if self.eat('=') => TokenType::CaretEqual,
            '^' => TokenType::Caret,
            '~' => TokenType::Tilde,
            '!' if self.eat('=') => TokenType::BangEqual,
            '!' => TokenType::Bang,
            '=' if self.eat('=') => TokenType::EqualEqual,
            '=' => TokenType::Equal,
            '<' if self.eat('<') => {
                if self.eat('=') {
                    TokenType::LeftShiftEqual
                } else {
                    TokenType::LeftShift
                }
            }
            '<' if self.eat('=') => TokenType::LessEqual,
            '<' => TokenType::Less,
            '>' if self.eat('>') => {
                if self.eat('=') {
                    TokenType::RightShiftEqual
                } else {
                    TokenType::RightShift
                }
            }
            '>' if self.eat('=') => TokenType::GreaterEqual,
            '>' => TokenType::Greater,
            '?' => TokenType::Question,
            ':' => TokenType::Colon,
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            ';' => TokenType::Semicolon,
            other => {
                return Err(CompilerError::lexer_error(
                    format!("Unexpected character '{}'", other.escape_default()),
                    location,
                ))
            }
        };
        Ok(token_type)
    }

    pub fn next_token(&mut self) -> Result<Token, CompilerError> {
        self.skip_trivia()?;

        let start_location = self.current_location();
        let token_type = match self.current_char() {
            None => TokenType::EndOfFile,
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.tokenize_identifier(),
            Some(ch) if ch.is_ascii_digit() => self.tokenize_integer()?,
            Some(ch) => self.tokenize_operator(ch)?,
        };

        Ok(Token::new(
            token_type,
            SourceSpan::new(start_location, self.current_location()),
        ))
    }

    /// Tokenize the whole input; the last token is always `EndOfFile`
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::EndOfFile);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        log::trace!("lexed {} tokens from {}", tokens.len(), self.filename);
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token_types(input: &str) -> Vec<TokenType> {
        Lexer::new(input, "test.l2")
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            token_types("int bool true false while whiles _x9"),
            vec![
                TokenType::Int,
                TokenType::Bool,
                TokenType::True,
                TokenType::False,
                TokenType::While,
                TokenType::Identifier("whiles".to_string()),
                TokenType::Identifier("_x9".to_string()),
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_longest_match_operators() {
        assert_eq!(
            token_types("<<= << <= < >>= >> >= > && &= & || |= | != ! == ="),
            vec![
                TokenType::LeftShiftEqual,
                TokenType::LeftShift,
                TokenType::LessEqual,
                TokenType::Less,
                TokenType::RightShiftEqual,
                TokenType::RightShift,
                TokenType::GreaterEqual,
                TokenType::Greater,
                TokenType::AmpersandAmpersand,
                TokenType::AmpersandEqual,
                TokenType::Ampersand,
                TokenType::PipePipe,
                TokenType::PipeEqual,
                TokenType::Pipe,
                TokenType::BangEqual,
                TokenType::Bang,
                TokenType::EqualEqual,
                TokenType::Equal,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_simple_function() {
        let types = token_types("int main() { return 17 % 5; }");
        assert_eq!(types.len(), 12);
        assert_eq!(types[1], TokenType::Identifier("main".to_string()));
        assert_eq!(types[6], TokenType::IntLiteral { value: 17, hex: false });
        assert_eq!(types[7], TokenType::Percent);
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Lexer::new("int\n  x;", "span.l2").tokenize().unwrap();
        assert_eq!(tokens[1].span.start, SourceLocation::new("span.l2", 2, 3));
        assert_eq!(tokens[1].span.end, SourceLocation::new("span.l2", 2, 4));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("int x = 3 @ 4;", "t.l2").tokenize().unwrap_err();
        match err {
            CompilerError::LexError { location, message } => {
                assert_eq!(location.column, 11);
                assert!(message.contains('@'));
            }
            other => panic!("expected lex error, got {other:?}"),
        }
    }
}
