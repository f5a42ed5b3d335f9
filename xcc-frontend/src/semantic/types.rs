//! Type checking for the two-type language
//!
//! Arithmetic, bitwise and shift operators take ints; `&&`, `||` and `!`
//! take bools; equality compares two values of the same type; conditions
//! are bool.

use super::SemanticError;
use crate::ast::*;
use std::collections::HashMap;
use xcc_common::SourceSpan;

pub struct TypeAnalysis {
    scopes: Vec<HashMap<String, Type>>,
    return_type: Type,
}

impl TypeAnalysis {
    pub fn check_function(function: &FunctionDefinition) -> Result<(), SemanticError> {
        let mut analysis = Self {
            scopes: Vec::new(),
            return_type: function.return_type,
        };
        analysis.check_statement(&function.body)
    }

    fn lookup(&self, name: &str, span: &SourceSpan) -> Result<Type, SemanticError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .ok_or_else(|| SemanticError::UndeclaredVariable {
                name: name.to_string(),
                span: span.clone(),
            })
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn check_statement(&mut self, stmt: &Statement) -> Result<(), SemanticError> {
        match &stmt.kind {
            StatementKind::Compound(statements) => {
                self.scoped(|this| statements.iter().try_for_each(|s| this.check_statement(s)))
            }
            StatementKind::Declaration {
                name,
                var_type,
                initializer,
            } => {
                if let Some(init) = initializer {
                    expect_type(*var_type, self.expression_type(init)?, &init.span)?;
                }
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone(), *var_type);
                }
                Ok(())
            }
            StatementKind::Assignment { target, op, value } => {
                let target_type = self.lookup(target, &stmt.span)?;
                let value_type = self.expression_type(value)?;
                match op {
                    AssignOp::Assign => expect_type(target_type, value_type, &value.span),
                    AssignOp::Compound(binary) => {
                        expect_operand(&binary.to_string(), Type::Int, target_type, &stmt.span)?;
                        expect_operand(&binary.to_string(), Type::Int, value_type, &value.span)
                    }
                }
            }
            StatementKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => {
                self.check_condition(condition)?;
                self.scoped(|this| this.check_statement(then_stmt))?;
                match else_stmt {
                    Some(else_stmt) => self.scoped(|this| this.check_statement(else_stmt)),
                    None => Ok(()),
                }
            }
            StatementKind::While { condition, body } => {
                self.check_condition(condition)?;
                self.scoped(|this| this.check_statement(body))
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => self.scoped(|this| {
                if let Some(init) = init {
                    this.check_statement(init)?;
                }
                this.check_condition(condition)?;
                if let Some(update) = update {
                    this.check_statement(update)?;
                }
                this.scoped(|this| this.check_statement(body))
            }),
            StatementKind::Break | StatementKind::Continue => Ok(()),
            StatementKind::Return(value) => {
                let found = self.expression_type(value)?;
                expect_type(self.return_type, found, &value.span)
            }
        }
    }

    fn check_condition(&self, condition: &Expression) -> Result<(), SemanticError> {
        expect_type(Type::Bool, self.expression_type(condition)?, &condition.span)
    }

    pub(crate) fn expression_type(&self, expr: &Expression) -> Result<Type, SemanticError> {
        match &expr.kind {
            ExpressionKind::IntLiteral { .. } => Ok(Type::Int),
            ExpressionKind::BoolLiteral(_) => Ok(Type::Bool),
            ExpressionKind::Identifier(name) => self.lookup(name, &expr.span),
            ExpressionKind::Unary { op, operand } => {
                let operand_type = self.expression_type(operand)?;
                let expected = match op {
                    UnaryOp::Minus | UnaryOp::BitNot => Type::Int,
                    UnaryOp::LogicalNot => Type::Bool,
                };
                expect_operand(&op.to_string(), expected, operand_type, &operand.span)?;
                Ok(expected)
            }
            ExpressionKind::Binary { op, left, right } => {
                let left_type = self.expression_type(left)?;
                let right_type = self.expression_type(right)?;
                if op.is_equality() {
                    expect_type(left_type, right_type, &right.span)?;
                    return Ok(Type::Bool);
                }

                let (operand, result) = if op.is_integer_arithmetic() {
                    (Type::Int, Type::Int)
                } else if op.is_ordering() {
                    (Type::Int, Type::Bool)
                } else {
                    (Type::Bool, Type::Bool)
                };
                expect_operand(&op.to_string(), operand, left_type, &left.span)?;
                expect_operand(&op.to_string(), operand, right_type, &right.span)?;
                Ok(result)
            }
            ExpressionKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.check_condition(condition)?;
                let then_type = self.expression_type(then_expr)?;
                let else_type = self.expression_type(else_expr)?;
                expect_type(then_type, else_type, &else_expr.span)?;
                Ok(then_type)
            }
        }
    }
}

fn expect_type(expected: Type, found: Type, span: &SourceSpan) -> Result<(), SemanticError> {
    if expected == found {
        Ok(())
    } else {
        Err(SemanticError::TypeMismatch {
            expected,
            found,
            span: span.clone(),
        })
    }
}

fn expect_operand(op: &str, expected: Type, found: Type, span: &SourceSpan) -> Result<(), SemanticError> {
    if expected == found {
        Ok(())
    } else {
        Err(SemanticError::InvalidOperand {
            op: op.to_string(),
            operand: found,
            span: span.clone(),
        })
    }
}
