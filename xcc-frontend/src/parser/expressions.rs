//! Expression parsing with operator precedence
//!
//! Lowest to highest: `?:` (right associative), `||`, `&&`, `|`, `^`, `&`,
//! `== !=`, `< <= > >=`, `<< >>`, `+ -`, `* / %`, unary `- ! ~`.
//! All binary levels are left associative.

use crate::ast::*;
use crate::lexer::{Token, TokenType};
use crate::parser::{ParseError, Parser};
use xcc_common::{CompilerError, SourceSpan};

/// Binary operator levels, loosest first
const BINARY_LEVELS: &[&[(TokenType, BinaryOp)]] = &[
    &[(TokenType::PipePipe, BinaryOp::LogicalOr)],
    &[(TokenType::AmpersandAmpersand, BinaryOp::LogicalAnd)],
    &[(TokenType::Pipe, BinaryOp::BitOr)],
    &[(TokenType::Caret, BinaryOp::BitXor)],
    &[(TokenType::Ampersand, BinaryOp::BitAnd)],
    &[
        (TokenType::EqualEqual, BinaryOp::Equal),
        (TokenType::BangEqual, BinaryOp::NotEqual),
    ],
    &[
        (TokenType::Less, BinaryOp::Less),
        (TokenType::LessEqual, BinaryOp::LessEqual),
        (TokenType::Greater, BinaryOp::Greater),
        (TokenType::GreaterEqual, BinaryOp::GreaterEqual),
    ],
    &[
        (TokenType::LeftShift, BinaryOp::LeftShift),
        (TokenType::RightShift, BinaryOp::RightShift),
    ],
    &[
        (TokenType::Plus, BinaryOp::Add),
        (TokenType::Minus, BinaryOp::Sub),
    ],
    &[
        (TokenType::Star, BinaryOp::Mul),
        (TokenType::Slash, BinaryOp::Div),
        (TokenType::Percent, BinaryOp::Mod),
    ],
];

impl Parser {
    pub fn parse_expression(&mut self) -> Result<Expression, CompilerError> {
        self.parse_conditional_expression()
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, CompilerError> {
        let condition = self.parse_binary_expression(0)?;

        if self.match_token(&TokenType::Question) {
            let then_expr = self.parse_expression()?;
            self.expect(TokenType::Colon, "conditional expression")?;
            let else_expr = self.parse_conditional_expression()?;

            let span = condition.span.to(&else_expr.span);
            Ok(Expression::new(
                ExpressionKind::Conditional {
                    condition: Box::new(condition),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                span,
            ))
        } else {
            Ok(condition)
        }
    }

    fn parse_binary_expression(&mut self, level: usize) -> Result<Expression, CompilerError> {
        let Some(operators) = BINARY_LEVELS.get(level) else {
            return self.parse_unary_expression();
        };

        let mut left = self.parse_binary_expression(level + 1)?;
        loop {
            let Some(op) = operators
                .iter()
                .find(|(token, _)| token == self.peek_type())
                .map(|(_, op)| *op)
            else {
                break;
            };
            self.advance();

            let right = self.parse_binary_expression(level + 1)?;
            let span = left.span.to(&right.span);
            left = Expression::new(
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, CompilerError> {
        let op = match self.peek_type() {
            TokenType::Minus => UnaryOp::Minus,
            TokenType::Bang => UnaryOp::LogicalNot,
            TokenType::Tilde => UnaryOp::BitNot,
            _ => return self.parse_primary_expression(),
        };
        let start = self.current_location();
        self.advance();

        let operand = self.parse_unary_expression()?;
        let span = SourceSpan::new(start, operand.span.end.clone());
        Ok(Expression::new(
            ExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, CompilerError> {
        let start = self.current_location();
        let token = self.advance().ok_or_else(|| ParseError::UnexpectedEndOfFile {
            expected: "expression".to_string(),
            location: start.clone(),
        })?;

        let kind = match token.token_type {
            TokenType::IntLiteral { value, hex } => ExpressionKind::IntLiteral { value, hex },
            TokenType::True => ExpressionKind::BoolLiteral(true),
            TokenType::False => ExpressionKind::BoolLiteral(false),
            TokenType::Identifier(name) => ExpressionKind::Identifier(name),
            TokenType::LeftParen => {
                let inner = self.parse_expression()?;
                self.expect(TokenType::RightParen, "parenthesized expression")?;
                return Ok(Expression::new(inner.kind, self.span_from(start)));
            }
            TokenType::EndOfFile => {
                return Err(ParseError::UnexpectedEndOfFile {
                    expected: "expression".to_string(),
                    location: start,
                }
                .into())
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "expression".to_string(),
                    found: Token::new(other, token.span),
                }
                .into())
            }
        };
        Ok(Expression::new(kind, token.span))
    }
}
