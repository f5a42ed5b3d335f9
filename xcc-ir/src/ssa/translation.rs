//! Lowering of checked function bodies into SSA graphs
//!
//! Statements report whether control can fall out of them. Code after a
//! `return`, `break` or `continue` is never translated, so every block
//! the graph ends up with is either reachable or has no predecessors.

use super::constructor::{GraphConstructor, Variable};
use crate::graph::{BinaryOp, CompareOp, IrGraph, NodeId};
use crate::optimize::Optimizer;
use crate::IrError;
use log::debug;
use xcc_common::SourceSpan;
use xcc_frontend::ast::{
    self, AssignOp, Expression, ExpressionKind, FunctionDefinition, Statement, StatementKind,
    UnaryOp,
};

#[derive(Debug, Clone, Copy)]
struct LoopTargets {
    continue_target: NodeId,
    break_target: NodeId,
}

/// One arm of a lowered conditional
enum Arm<'e> {
    Expr(&'e Expression),
    Const(bool),
}

pub struct SsaTranslation<'f> {
    function: &'f FunctionDefinition,
    constructor: GraphConstructor,
    loops: Vec<LoopTargets>,
}

impl<'f> SsaTranslation<'f> {
    pub fn new(function: &'f FunctionDefinition, optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            function,
            constructor: GraphConstructor::new(&function.name, optimizer),
            loops: Vec::new(),
        }
    }

    pub fn translate(mut self) -> Result<IrGraph, IrError> {
        let function = self.function;
        debug!("building SSA graph for '{}'", function.name);
        if self.translate_statement(&function.body)? {
            let block = self.constructor.current_block();
            return Err(self
                .constructor
                .graph()
                .inconsistency(block, "control reaches the end of the function"));
        }
        self.constructor.finish()
    }

    fn read(&mut self, name: &str) -> Result<NodeId, IrError> {
        let block = self.constructor.current_block();
        self.constructor
            .read_variable(&Variable::Named(name.to_string()), block)
    }

    fn write(&mut self, name: &str, value: NodeId) {
        let block = self.constructor.current_block();
        self.constructor
            .write_variable(Variable::Named(name.to_string()), block, value);
    }

    /// Returns whether control falls through to the next statement
    fn translate_statement(&mut self, stmt: &Statement) -> Result<bool, IrError> {
        match &stmt.kind {
            StatementKind::Compound(statements) => {
                for statement in statements {
                    if !self.translate_statement(statement)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            StatementKind::Declaration {
                name, initializer, ..
            } => {
                if let Some(init) = initializer {
                    let value = self.translate_expression(init)?;
                    self.write(name, value);
                }
                Ok(true)
            }
            StatementKind::Assignment { target, op, value } => {
                let result = match op {
                    AssignOp::Assign => self.translate_expression(value)?,
                    AssignOp::Compound(op) => {
                        let current = self.read(target)?;
                        let rhs = self.translate_expression(value)?;
                        self.arithmetic(*op, current, rhs, &stmt.span)?
                    }
                };
                self.write(target, result);
                Ok(true)
            }
            StatementKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => self.translate_if(condition, then_stmt, else_stmt.as_deref(), &stmt.span),
            StatementKind::While { condition, body } => {
                self.translate_loop(condition, None, body, &stmt.span)
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.translate_statement(init)?;
                }
                self.translate_loop(condition, update.as_deref(), body, &stmt.span)
            }
            StatementKind::Break => {
                let targets = self.innermost_loop("break", &stmt.span)?;
                self.constructor.new_jump(targets.break_target, &stmt.span);
                Ok(false)
            }
            StatementKind::Continue => {
                let targets = self.innermost_loop("continue", &stmt.span)?;
                self.constructor.new_jump(targets.continue_target, &stmt.span);
                Ok(false)
            }
            StatementKind::Return(value) => {
                let value = self.translate_expression(value)?;
                self.constructor.new_return(value, &stmt.span)?;
                Ok(false)
            }
        }
    }

    fn innermost_loop(&self, keyword: &'static str, span: &SourceSpan) -> Result<LoopTargets, IrError> {
        self.loops
            .last()
            .copied()
            .ok_or_else(|| IrError::LoopControlOutsideLoop {
                keyword,
                span: span.clone(),
            })
    }

    fn translate_if(
        &mut self,
        condition: &Expression,
        then_stmt: &Statement,
        else_stmt: Option<&Statement>,
        span: &SourceSpan,
    ) -> Result<bool, IrError> {
        let condition = self.translate_expression(condition)?;
        let then_block = self.constructor.new_block(&then_stmt.span);
        let else_block = self
            .constructor
            .new_block(else_stmt.map_or(span, |s| &s.span));
        let merge = self.constructor.new_block(span);

        self.constructor
            .new_branch(condition, then_block, else_block, span);
        self.constructor.seal_block(then_block)?;
        self.constructor.seal_block(else_block)?;

        self.constructor.set_current_block(then_block);
        let then_falls = self.translate_statement(then_stmt)?;
        if then_falls {
            self.constructor.new_jump(merge, span);
        }

        self.constructor.set_current_block(else_block);
        let else_falls = match else_stmt {
            Some(else_stmt) => self.translate_statement(else_stmt)?,
            None => true,
        };
        if else_falls {
            self.constructor.new_jump(merge, span);
        }

        self.constructor.seal_block(merge)?;
        self.constructor.set_current_block(merge);
        Ok(then_falls || else_falls)
    }

    /// `while` loops have no update; `continue` in a `for` loop runs the update
    fn translate_loop(
        &mut self,
        condition: &Expression,
        update: Option<&Statement>,
        body: &Statement,
        span: &SourceSpan,
    ) -> Result<bool, IrError> {
        let header = self.constructor.new_block(&condition.span);
        let body_block = self.constructor.new_block(&body.span);
        let step = self.constructor.new_block(span);
        let exit = self.constructor.new_block(span);

        self.constructor.new_jump(header, span);
        self.constructor.set_current_block(header);
        let condition = self.translate_expression(condition)?;
        self.constructor.new_branch(condition, body_block, exit, span);
        self.constructor.seal_block(body_block)?;

        self.constructor.set_current_block(body_block);
        self.loops.push(LoopTargets {
            continue_target: step,
            break_target: exit,
        });
        let body_falls = self.translate_statement(body);
        self.loops.pop();
        if body_falls? {
            self.constructor.new_jump(step, span);
        }

        self.constructor.seal_block(step)?;
        self.constructor.set_current_block(step);
        if !self.constructor.graph().predecessors(step).is_empty() {
            if let Some(update) = update {
                self.translate_statement(update)?;
            }
            self.constructor.new_jump(header, span);
        }

        self.constructor.seal_block(header)?;
        self.constructor.seal_block(exit)?;
        self.constructor.set_current_block(exit);
        Ok(true)
    }

    fn translate_expression(&mut self, expr: &Expression) -> Result<NodeId, IrError> {
        let span = &expr.span;
        match &expr.kind {
            ExpressionKind::IntLiteral { value, .. } => Ok(self
                .constructor
                .new_const_int(Expression::int_literal_value(*value), span)),
            ExpressionKind::BoolLiteral(value) => Ok(self.constructor.new_const_bool(*value, span)),
            ExpressionKind::Identifier(name) => self.read(name),
            ExpressionKind::Unary { op, operand } => {
                let value = self.translate_expression(operand)?;
                match op {
                    UnaryOp::Minus => {
                        let zero = self.constructor.new_const_int(0, span);
                        self.constructor.new_binary(BinaryOp::Sub, zero, value, span)
                    }
                    UnaryOp::BitNot => {
                        let ones = self.constructor.new_const_int(-1, span);
                        self.constructor.new_binary(BinaryOp::BitXor, value, ones, span)
                    }
                    UnaryOp::LogicalNot => {
                        let no = self.constructor.new_const_bool(false, span);
                        Ok(self.constructor.new_compare(CompareOp::Eq, value, no, span))
                    }
                }
            }
            ExpressionKind::Binary { op, left, right } => match op {
                ast::BinaryOp::LogicalAnd => {
                    self.translate_conditional(left, Arm::Expr(&**right), Arm::Const(false), span)
                }
                ast::BinaryOp::LogicalOr => {
                    self.translate_conditional(left, Arm::Const(true), Arm::Expr(&**right), span)
                }
                _ => {
                    let lhs = self.translate_expression(left)?;
                    let rhs = self.translate_expression(right)?;
                    self.arithmetic(*op, lhs, rhs, span)
                }
            },
            ExpressionKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => self.translate_conditional(condition, Arm::Expr(&**then_expr), Arm::Expr(&**else_expr), span),
        }
    }

    /// Strict binary operators on already evaluated operands
    fn arithmetic(
        &mut self,
        op: ast::BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
        span: &SourceSpan,
    ) -> Result<NodeId, IrError> {
        let binary = match op {
            ast::BinaryOp::Add => BinaryOp::Add,
            ast::BinaryOp::Sub => BinaryOp::Sub,
            ast::BinaryOp::Mul => BinaryOp::Mul,
            ast::BinaryOp::Div => BinaryOp::Div,
            ast::BinaryOp::Mod => BinaryOp::Mod,
            ast::BinaryOp::BitAnd => BinaryOp::BitAnd,
            ast::BinaryOp::BitOr => BinaryOp::BitOr,
            ast::BinaryOp::BitXor => BinaryOp::BitXor,
            ast::BinaryOp::LeftShift => BinaryOp::Shl,
            ast::BinaryOp::RightShift => BinaryOp::Shr,
            ast::BinaryOp::Equal => return Ok(self.constructor.new_compare(CompareOp::Eq, lhs, rhs, span)),
            ast::BinaryOp::NotEqual => return Ok(self.constructor.new_compare(CompareOp::Ne, lhs, rhs, span)),
            ast::BinaryOp::Less => return Ok(self.constructor.new_compare(CompareOp::Lt, lhs, rhs, span)),
            ast::BinaryOp::LessEqual => return Ok(self.constructor.new_compare(CompareOp::Le, lhs, rhs, span)),
            ast::BinaryOp::Greater => return Ok(self.constructor.new_compare(CompareOp::Gt, lhs, rhs, span)),
            ast::BinaryOp::GreaterEqual => {
                return Ok(self.constructor.new_compare(CompareOp::Ge, lhs, rhs, span))
            }
            ast::BinaryOp::LogicalAnd | ast::BinaryOp::LogicalOr => {
                let block = self.constructor.current_block();
                return Err(self
                    .constructor
                    .graph()
                    .inconsistency(block, format!("'{}' has no strict lowering", op)));
            }
        };
        self.constructor.new_binary(binary, lhs, rhs, span)
    }

    /// Branches into one block per arm and merges the two values with a phi
    fn translate_conditional(
        &mut self,
        condition: &Expression,
        then_arm: Arm<'_>,
        else_arm: Arm<'_>,
        span: &SourceSpan,
    ) -> Result<NodeId, IrError> {
        let condition = self.translate_expression(condition)?;
        let then_block = self.constructor.new_block(span);
        let else_block = self.constructor.new_block(span);
        let merge = self.constructor.new_block(span);

        self.constructor
            .new_branch(condition, then_block, else_block, span);
        self.constructor.seal_block(then_block)?;
        self.constructor.seal_block(else_block)?;

        self.constructor.set_current_block(then_block);
        let then_value = self.translate_arm(then_arm, span)?;
        self.constructor.new_jump(merge, span);

        self.constructor.set_current_block(else_block);
        let else_value = self.translate_arm(else_arm, span)?;
        self.constructor.new_jump(merge, span);

        self.constructor.seal_block(merge)?;
        self.constructor.set_current_block(merge);
        self.constructor
            .new_phi_with_operands(merge, vec![then_value, else_value])
    }

    fn translate_arm(&mut self, arm: Arm<'_>, span: &SourceSpan) -> Result<NodeId, IrError> {
        match arm {
            Arm::Expr(expr) => self.translate_expression(expr),
            Arm::Const(value) => Ok(self.constructor.new_const_bool(value, span)),
        }
    }
}

/// Builds one graph per function, each with a fresh optimizer
pub fn translate_program(
    program: &ast::Program,
    optimizer: impl Fn() -> Box<dyn Optimizer>,
) -> Result<Vec<IrGraph>, xcc_common::CompilerError> {
    program
        .functions
        .iter()
        .map(|function| {
            SsaTranslation::new(function, optimizer())
                .translate()
                .map_err(|e| e.into_compiler_error(&function.name))
        })
        .collect()
}
