//! Statement parsing

use crate::ast::*;
use crate::lexer::TokenType;
use crate::parser::{ParseError, Parser};
use xcc_common::CompilerError;

impl Parser {
    pub fn parse_compound_statement(&mut self) -> Result<Statement, CompilerError> {
        let start = self.current_location();
        self.expect(TokenType::LeftBrace, "block")?;

        let mut statements = Vec::new();
        while !self.check(&TokenType::RightBrace) && !self.check(&TokenType::EndOfFile) {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenType::RightBrace, "block")?;

        Ok(Statement::new(StatementKind::Compound(statements), self.span_from(start)))
    }

    pub fn parse_statement(&mut self) -> Result<Statement, CompilerError> {
        let start = self.current_location();

        let kind = match self.peek_type() {
            TokenType::LeftBrace => return self.parse_compound_statement(),
            TokenType::If => {
                self.advance();
                self.parse_if_statement()?
            }
            TokenType::While => {
                self.advance();
                self.expect(TokenType::LeftParen, "while statement")?;
                let condition = self.parse_expression()?;
                self.expect(TokenType::RightParen, "while statement")?;
                let body = Box::new(self.parse_statement()?);
                StatementKind::While { condition, body }
            }
            TokenType::For => {
                self.advance();
                self.parse_for_statement()?
            }
            TokenType::Break => {
                self.advance();
                self.expect(TokenType::Semicolon, "break statement")?;
                StatementKind::Break
            }
            TokenType::Continue => {
                self.advance();
                self.expect(TokenType::Semicolon, "continue statement")?;
                StatementKind::Continue
            }
            TokenType::Return => {
                self.advance();
                let value = self.parse_expression()?;
                self.expect(TokenType::Semicolon, "return statement")?;
                StatementKind::Return(value)
            }
            _ => {
                let simple = self.parse_simple_statement()?;
                self.expect(TokenType::Semicolon, "statement")?;
                return Ok(Statement::new(simple.kind, self.span_from(start)));
            }
        };

        Ok(Statement::new(kind, self.span_from(start)))
    }

    fn parse_if_statement(&mut self) -> Result<StatementKind, CompilerError> {
        self.expect(TokenType::LeftParen, "if statement")?;
        let condition = self.parse_expression()?;
        self.expect(TokenType::RightParen, "if statement")?;

        let then_stmt = Box::new(self.parse_statement()?);
        let else_stmt = if self.match_token(&TokenType::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(StatementKind::If {
            condition,
            then_stmt,
            else_stmt,
        })
    }

    fn parse_for_statement(&mut self) -> Result<StatementKind, CompilerError> {
        self.expect(TokenType::LeftParen, "for statement")?;

        let init = if self.check(&TokenType::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        self.expect(TokenType::Semicolon, "for statement")?;

        let condition = self.parse_expression()?;
        self.expect(TokenType::Semicolon, "for statement")?;

        let update = if self.check(&TokenType::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        self.expect(TokenType::RightParen, "for statement")?;

        let body = Box::new(self.parse_statement()?);
        Ok(StatementKind::For {
            init,
            condition,
            update,
            body,
        })
    }

    /// Declaration or assignment, without the trailing `;`
    pub(crate) fn parse_simple_statement(&mut self) -> Result<Statement, CompilerError> {
        let start = self.current_location();

        if matches!(self.peek_type(), TokenType::Int | TokenType::Bool) {
            let var_type = self.parse_type("declaration")?;
            let (name, _) = self.expect_identifier("declaration")?;
            let initializer = if self.match_token(&TokenType::Equal) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            return Ok(Statement::new(
                StatementKind::Declaration {
                    name,
                    var_type,
                    initializer,
                },
                self.span_from(start),
            ));
        }

        let (target, _) = self.expect_identifier("assignment")?;
        let op = self.parse_assignment_operator()?;
        let value = self.parse_expression()?;
        Ok(Statement::new(
            StatementKind::Assignment { target, op, value },
            self.span_from(start),
        ))
    }

    fn parse_assignment_operator(&mut self) -> Result<AssignOp, CompilerError> {
        let location = self.current_location();
        let op = match self.peek_type() {
            TokenType::Equal => AssignOp::Assign,
            TokenType::PlusEqual => AssignOp::Compound(BinaryOp::Add),
            TokenType::MinusEqual => AssignOp::Compound(BinaryOp::Sub),
            TokenType::StarEqual => AssignOp::Compound(BinaryOp::Mul),
            TokenType::SlashEqual => AssignOp::Compound(BinaryOp::Div),
            TokenType::PercentEqual => AssignOp::Compound(BinaryOp::Mod),
            TokenType::AmpersandEqual => AssignOp::Compound(BinaryOp::BitAnd),
            TokenType::PipeEqual => AssignOp::Compound(BinaryOp::BitOr),
            TokenType::CaretEqual => AssignOp::Compound(BinaryOp::BitXor),
            TokenType::LeftShiftEqual => AssignOp::Compound(BinaryOp::LeftShift),
            TokenType::RightShiftEqual => AssignOp::Compound(BinaryOp::RightShift),
            other => {
                return Err(ParseError::InvalidStatement {
                    message: format!("Expected assignment operator, found '{}'", other),
                    location,
                }
                .into())
            }
        };
        self.advance();
        Ok(op)
    }
}
