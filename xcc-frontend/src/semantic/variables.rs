//! Declaration and definite-initialization check
//!
//! Tracks, per lexical scope, whether a variable is only declared or also
//! initialized on every path reaching the current point. Branches merge by
//! intersection; loop bodies never initialize anything outside the loop.
//! After `return`, `break` or `continue` the rest of the block is
//! unreachable, so every visible variable counts as initialized there.

use super::SemanticError;
use crate::ast::*;
use std::collections::HashMap;
use xcc_common::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariableStatus {
    Declared,
    Initialized,
}

#[derive(Debug, Clone, Default)]
struct Scopes {
    frames: Vec<HashMap<String, VariableStatus>>,
}

impl Scopes {
    fn enter(&mut self) {
        self.frames.push(HashMap::new());
    }

    fn exit(&mut self) {
        self.frames.pop();
    }

    fn status(&self, name: &str) -> Option<VariableStatus> {
        self.frames.iter().rev().find_map(|frame| frame.get(name).copied())
    }

    fn declare(&mut self, name: &str, status: VariableStatus) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), status);
        }
    }

    fn initialize(&mut self, name: &str) {
        if let Some(status) = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
        {
            *status = VariableStatus::Initialized;
        }
    }

    fn initialize_all(&mut self) {
        for status in self.frames.iter_mut().flat_map(|frame| frame.values_mut()) {
            *status = VariableStatus::Initialized;
        }
    }

    /// Keep a variable initialized only if `other` agrees
    fn intersect(&mut self, other: &Scopes) {
        for (frame, other_frame) in self.frames.iter_mut().zip(&other.frames) {
            for (name, status) in frame.iter_mut() {
                if other_frame.get(name) != Some(&VariableStatus::Initialized) {
                    *status = VariableStatus::Declared;
                }
            }
        }
    }
}

#[derive(Default)]
pub struct VariableStatusAnalysis {
    scopes: Scopes,
    loop_depth: usize,
}

impl VariableStatusAnalysis {
    pub fn check_function(function: &FunctionDefinition) -> Result<(), SemanticError> {
        let mut analysis = Self::default();
        analysis.check_statement(&function.body)
    }

    fn check_statement(&mut self, stmt: &Statement) -> Result<(), SemanticError> {
        match &stmt.kind {
            StatementKind::Compound(statements) => {
                self.scopes.enter();
                let result = statements.iter().try_for_each(|s| self.check_statement(s));
                self.scopes.exit();
                result
            }
            StatementKind::Declaration {
                name, initializer, ..
            } => {
                if let Some(init) = initializer {
                    self.check_expression(init)?;
                }
                if self.scopes.status(name).is_some() {
                    return Err(SemanticError::Redeclaration {
                        name: name.clone(),
                        span: stmt.span.clone(),
                    });
                }
                let status = if initializer.is_some() {
                    VariableStatus::Initialized
                } else {
                    VariableStatus::Declared
                };
                self.scopes.declare(name, status);
                Ok(())
            }
            StatementKind::Assignment { target, op, value } => {
                self.check_expression(value)?;
                match (self.scopes.status(target), op) {
                    (None, _) => Err(SemanticError::UndeclaredVariable {
                        name: target.clone(),
                        span: stmt.span.clone(),
                    }),
                    (Some(VariableStatus::Declared), AssignOp::Compound(_)) => {
                        Err(SemanticError::Uninitialized {
                            name: target.clone(),
                            span: stmt.span.clone(),
                        })
                    }
                    (Some(_), _) => {
                        self.scopes.initialize(target);
                        Ok(())
                    }
                }
            }
            StatementKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => {
                self.check_expression(condition)?;
                let before = self.scopes.clone();
                self.check_branch(then_stmt)?;
                let after_then = std::mem::replace(&mut self.scopes, before);
                if let Some(else_stmt) = else_stmt {
                    self.check_branch(else_stmt)?;
                }
                self.scopes.intersect(&after_then);
                Ok(())
            }
            StatementKind::While { condition, body } => {
                self.check_expression(condition)?;
                let before = self.scopes.clone();
                self.loop_depth += 1;
                let result = self.check_branch(body);
                self.loop_depth -= 1;
                self.scopes = before;
                result
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.scopes.enter();
                let result = self.check_for(init.as_deref(), condition, update.as_deref(), body);
                self.scopes.exit();
                result
            }
            StatementKind::Break => self.check_loop_control("break", &stmt.span),
            StatementKind::Continue => self.check_loop_control("continue", &stmt.span),
            StatementKind::Return(value) => {
                self.check_expression(value)?;
                self.scopes.initialize_all();
                Ok(())
            }
        }
    }

    fn check_for(
        &mut self,
        init: Option<&Statement>,
        condition: &Expression,
        update: Option<&Statement>,
        body: &Statement,
    ) -> Result<(), SemanticError> {
        if let Some(init) = init {
            self.check_statement(init)?;
        }
        self.check_expression(condition)?;

        if let Some(update) = update {
            if matches!(update.kind, StatementKind::Declaration { .. }) {
                return Err(SemanticError::DeclarationInForStep {
                    span: update.span.clone(),
                });
            }
        }

        let before = self.scopes.clone();
        self.loop_depth += 1;
        let result = self.check_branch(body).and_then(|()| {
            update.map_or(Ok(()), |update| self.check_statement(update))
        });
        self.loop_depth -= 1;
        self.scopes = before;
        result
    }

    /// A branch or loop body gets its own scope even without braces
    fn check_branch(&mut self, stmt: &Statement) -> Result<(), SemanticError> {
        self.scopes.enter();
        let result = self.check_statement(stmt);
        self.scopes.exit();
        result
    }

    fn check_loop_control(&mut self, keyword: &'static str, span: &SourceSpan) -> Result<(), SemanticError> {
        if self.loop_depth == 0 {
            return Err(SemanticError::LoopControlOutsideLoop {
                keyword,
                span: span.clone(),
            });
        }
        self.scopes.initialize_all();
        Ok(())
    }

    fn check_expression(&self, expr: &Expression) -> Result<(), SemanticError> {
        match &expr.kind {
            ExpressionKind::Identifier(name) => match self.scopes.status(name) {
                None => Err(SemanticError::UndeclaredVariable {
                    name: name.clone(),
                    span: expr.span.clone(),
                }),
                Some(VariableStatus::Declared) => Err(SemanticError::Uninitialized {
                    name: name.clone(),
                    span: expr.span.clone(),
                }),
                Some(VariableStatus::Initialized) => Ok(()),
            },
            ExpressionKind::IntLiteral { .. } | ExpressionKind::BoolLiteral(_) => Ok(()),
            ExpressionKind::Unary { operand, .. } => self.check_expression(operand),
            ExpressionKind::Binary { left, right, .. } => {
                self.check_expression(left)?;
                self.check_expression(right)
            }
            ExpressionKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.check_expression(condition)?;
                self.check_expression(then_expr)?;
                self.check_expression(else_expr)
            }
        }
    }
}
