//! Whitespace and comment skipping
//!
//! Block comments nest: `/* a /* b */ c */` is a single comment.

use crate::lexer::Lexer;
use xcc_common::CompilerError;

impl Lexer {
    pub(crate) fn skip_trivia(&mut self) -> Result<(), CompilerError> {
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => self.skip_line_comment(),
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), CompilerError> {
        let start = self.current_location();
        self.advance(); // '/'
        self.advance(); // '*'

        let mut depth = 1usize;
        while depth > 0 {
            match (self.current_char(), self.peek_char(1)) {
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                (Some(_), _) => {
                    self.advance();
                }
                (None, _) => {
                    return Err(CompilerError::lexer_error("Unterminated block comment", start));
                }
            }
        }
        Ok(())
    }
}
