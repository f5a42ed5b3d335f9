//! Integer literal scanning
//!
//! Range checking against the 32-bit target happens in semantic analysis;
//! the lexer only rejects malformed digits and values beyond `u64`.

use crate::lexer::{Lexer, TokenType};
use xcc_common::CompilerError;

impl Lexer {
    pub fn tokenize_integer(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.current_location();

        if self.current_char() == Some('0') && matches!(self.peek_char(1), Some('x' | 'X')) {
            self.advance(); // '0'
            self.advance(); // 'x'

            let mut digits = String::new();
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_hexdigit() {
                    digits.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(CompilerError::lexer_error("Hex literal without digits", start));
            }
            self.reject_identifier_suffix()?;

            let value = u64::from_str_radix(&digits, 16).map_err(|_| {
                CompilerError::lexer_error(format!("Hex literal 0x{digits} is too large"), start)
            })?;
            return Ok(TokenType::IntLiteral { value, hex: true });
        }

        let mut digits = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(CompilerError::lexer_error(
                format!("Decimal literal {digits} has a leading zero"),
                start,
            ));
        }
        self.reject_identifier_suffix()?;

        let value = digits.parse::<u64>().map_err(|_| {
            CompilerError::lexer_error(format!("Integer literal {digits} is too large"), start)
        })?;
        Ok(TokenType::IntLiteral { value, hex: false })
    }

    /// `123abc` is one malformed token, not a number followed by a name
    fn reject_identifier_suffix(&self) -> Result<(), CompilerError> {
        match self.current_char() {
            Some(ch) if ch.is_ascii_alphanumeric() || ch == '_' => Err(CompilerError::lexer_error(
                format!("Invalid character '{ch}' in integer literal"),
                self.current_location(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{Lexer, TokenType};
    use pretty_assertions::assert_eq;

    fn first(input: &str) -> TokenType {
        Lexer::new(input, "lit.l2").next_token().unwrap().token_type
    }

    #[test]
    fn test_decimal_and_hex() {
        assert_eq!(first("2147483648"), TokenType::IntLiteral { value: 2147483648, hex: false });
        assert_eq!(first("0"), TokenType::IntLiteral { value: 0, hex: false });
        assert_eq!(first("0xFFffFFff"), TokenType::IntLiteral { value: 0xFFFF_FFFF, hex: true });
    }

    #[test]
    fn test_malformed_literals() {
        assert!(Lexer::new("0x", "lit.l2").next_token().is_err());
        assert!(Lexer::new("007", "lit.l2").next_token().is_err());
        assert!(Lexer::new("12ab", "lit.l2").next_token().is_err());
        assert!(Lexer::new("99999999999999999999999", "lit.l2").next_token().is_err());
    }
}
