//! Integer literal range check
//!
//! Decimal literals must fit a signed 32-bit int; `2147483648` is only
//! accepted directly under unary minus. Hex literals may use all 32 bits.

use super::SemanticError;
use crate::ast::*;

const DECIMAL_LIMIT: u64 = i32::MAX as u64;
const HEX_LIMIT: u64 = u32::MAX as u64;

pub fn check_function(function: &FunctionDefinition) -> Result<(), SemanticError> {
    check_statement(&function.body)
}

fn check_statement(stmt: &Statement) -> Result<(), SemanticError> {
    match &stmt.kind {
        StatementKind::Compound(statements) => statements.iter().try_for_each(check_statement),
        StatementKind::Declaration { initializer, .. } => {
            initializer.iter().try_for_each(|e| check_expression(e, false))
        }
        StatementKind::Assignment { value, .. } | StatementKind::Return(value) => {
            check_expression(value, false)
        }
        StatementKind::If {
            condition,
            then_stmt,
            else_stmt,
        } => {
            check_expression(condition, false)?;
            check_statement(then_stmt)?;
            else_stmt.iter().try_for_each(|s| check_statement(s))
        }
        StatementKind::While { condition, body } => {
            check_expression(condition, false)?;
            check_statement(body)
        }
        StatementKind::For {
            init,
            condition,
            update,
            body,
        } => {
            init.iter().try_for_each(|s| check_statement(s))?;
            check_expression(condition, false)?;
            update.iter().try_for_each(|s| check_statement(s))?;
            check_statement(body)
        }
        StatementKind::Break | StatementKind::Continue => Ok(()),
    }
}

fn check_expression(expr: &Expression, negated: bool) -> Result<(), SemanticError> {
    match &expr.kind {
        ExpressionKind::IntLiteral { value, hex } => {
            let limit = match (hex, negated) {
                (true, _) => HEX_LIMIT,
                (false, true) => DECIMAL_LIMIT + 1,
                (false, false) => DECIMAL_LIMIT,
            };
            if *value > limit {
                let literal = if *hex {
                    format!("{value:#x}")
                } else {
                    value.to_string()
                };
                return Err(SemanticError::LiteralOutOfRange {
                    literal,
                    span: expr.span.clone(),
                });
            }
            Ok(())
        }
        ExpressionKind::BoolLiteral(_) | ExpressionKind::Identifier(_) => Ok(()),
        ExpressionKind::Unary { op, operand } => {
            check_expression(operand, *op == UnaryOp::Minus)
        }
        ExpressionKind::Binary { left, right, .. } => {
            check_expression(left, false)?;
            check_expression(right, false)
        }
        ExpressionKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            check_expression(condition, false)?;
            check_expression(then_expr, false)?;
            check_expression(else_expr, false)
        }
    }
}
