//! Statement AST nodes and function definitions

use super::expressions::Expression;
use super::ops::AssignOp;
use super::Type;
use serde::{Deserialize, Serialize};
use xcc_common::SourceSpan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// `{ ... }`, which opens a new scope
    Compound(Vec<Statement>),

    Declaration {
        name: String,
        var_type: Type,
        initializer: Option<Expression>,
    },

    Assignment {
        target: String,
        op: AssignOp,
        value: Expression,
    },

    If {
        condition: Expression,
        then_stmt: Box<Statement>,
        else_stmt: Option<Box<Statement>>,
    },

    While {
        condition: Expression,
        body: Box<Statement>,
    },

    /// `init` and `update` are simple statements (declaration or assignment)
    For {
        init: Option<Box<Statement>>,
        condition: Expression,
        update: Option<Box<Statement>>,
        body: Box<Statement>,
    },

    Break,

    Continue,

    Return(Expression),
}

impl Statement {
    pub fn new(kind: StatementKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: Type,
    /// Always a `StatementKind::Compound`
    pub body: Statement,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<FunctionDefinition>,
    pub span: SourceSpan,
}
