//! All-paths-return check
//!
//! An `if` returns only when both arms return; loops never count because
//! their body may execute zero times.

use super::SemanticError;
use crate::ast::*;

pub fn check_function(function: &FunctionDefinition) -> Result<(), SemanticError> {
    if returns(&function.body) {
        Ok(())
    } else {
        Err(SemanticError::MissingReturn {
            name: function.name.clone(),
            span: function.span.clone(),
        })
    }
}

pub fn returns(stmt: &Statement) -> bool {
    match &stmt.kind {
        StatementKind::Return(_) => true,
        StatementKind::Compound(statements) => statements.iter().any(returns),
        StatementKind::If {
            then_stmt,
            else_stmt: Some(else_stmt),
            ..
        } => returns(then_stmt) && returns(else_stmt),
        StatementKind::If { else_stmt: None, .. }
        | StatementKind::While { .. }
        | StatementKind::For { .. }
        | StatementKind::Declaration { .. }
        | StatementKind::Assignment { .. }
        | StatementKind::Break
        | StatementKind::Continue => false,
    }
}
