//! Expression AST nodes

use super::ops::{BinaryOp, UnaryOp};
use serde::{Deserialize, Serialize};
use xcc_common::SourceSpan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Unsigned magnitude as written; `hex` selects the range rule
    IntLiteral { value: u64, hex: bool },

    BoolLiteral(bool),

    Identifier(String),

    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `condition ? then_expr : else_expr`
    Conditional {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }

    /// Value of an int literal after wrapping into the 32-bit target
    pub fn int_literal_value(value: u64) -> i32 {
        value as u32 as i32
    }
}
