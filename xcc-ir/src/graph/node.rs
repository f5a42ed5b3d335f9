//! Node kinds of the SSA graph
//!
//! Every operation, including blocks themselves, is a node in one arena.
//! Operand positions are significant; the `*_INDEX` constants name them.

use serde::Serialize;
use std::fmt;
use xcc_common::SourceSpan;

/// Stable index of a node in its graph's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

pub const LEFT_INDEX: usize = 0;
pub const RIGHT_INDEX: usize = 1;
/// Div and Mod take the side-effect token as their third operand
pub const BINARY_SIDE_EFFECT_INDEX: usize = 2;
pub const RETURN_RESULT_INDEX: usize = 0;
pub const RETURN_SIDE_EFFECT_INDEX: usize = 1;
pub const BRANCH_CONDITION_INDEX: usize = 0;
pub const PROJ_SOURCE_INDEX: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Mul | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
        )
    }

    /// Div and Mod can trap and are ordered through the side-effect chain
    pub fn has_side_effect(self) -> bool {
        matches!(self, BinaryOp::Div | BinaryOp::Mod)
    }

    /// 32-bit two's complement semantics matching the emitted instructions;
    /// `None` where the machine would trap.
    pub fn evaluate(self, left: i32, right: i32) -> Option<i32> {
        match self {
            BinaryOp::Add => Some(left.wrapping_add(right)),
            BinaryOp::Sub => Some(left.wrapping_sub(right)),
            BinaryOp::Mul => Some(left.wrapping_mul(right)),
            BinaryOp::Div => left.checked_div(right),
            BinaryOp::Mod => left.checked_rem(right),
            BinaryOp::BitAnd => Some(left & right),
            BinaryOp::BitOr => Some(left | right),
            BinaryOp::BitXor => Some(left ^ right),
            BinaryOp::Shl => Some(left.wrapping_shl(right as u32)),
            BinaryOp::Shr => Some(left.wrapping_shr(right as u32)),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn evaluate(self, left: i32, right: i32) -> bool {
        match self {
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
        }
    }

    pub fn is_commutative(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProjKind {
    Result,
    SideEffect,
}

/// A phi created in an unsealed block has no operands until the block is sealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PhiState {
    Incomplete,
    Complete,
}

/// What a phi merges: program values, or side-effect ordering tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueClass {
    Data,
    SideEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Start,
    Block,
    ConstInt(i32),
    ConstBool(bool),
    Binary(BinaryOp),
    Compare(CompareOp),
    Phi { state: PhiState, class: ValueClass },
    Proj(ProjKind),
    Branch { on_true: NodeId, on_false: NodeId },
    Jump { target: NodeId },
    Return,
}

impl NodeKind {
    /// Jump, Branch and Return end a block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            NodeKind::Branch { .. } | NodeKind::Jump { .. } | NodeKind::Return
        )
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, NodeKind::Phi { .. })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Start => write!(f, "Start"),
            NodeKind::Block => write!(f, "Block"),
            NodeKind::ConstInt(value) => write!(f, "ConstInt {}", value),
            NodeKind::ConstBool(value) => write!(f, "ConstBool {}", value),
            NodeKind::Binary(op) => write!(f, "{:?}", op),
            NodeKind::Compare(op) => write!(f, "Compare{:?}", op),
            NodeKind::Phi {
                state: PhiState::Incomplete,
                ..
            } => write!(f, "Phi(incomplete)"),
            NodeKind::Phi {
                class: ValueClass::SideEffect,
                ..
            } => write!(f, "Phi[M]"),
            NodeKind::Phi { .. } => write!(f, "Phi"),
            NodeKind::Proj(ProjKind::Result) => write!(f, "Proj result"),
            NodeKind::Proj(ProjKind::SideEffect) => write!(f, "Proj sideEffect"),
            NodeKind::Branch { on_true, on_false } => {
                write!(f, "Branch true->{} false->{}", on_true, on_false)
            }
            NodeKind::Jump { target } => write!(f, "Jump ->{}", target),
            NodeKind::Return => write!(f, "Return"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Owning block; a Block node owns itself
    pub block: NodeId,
    /// Operands for data nodes, incoming control nodes for blocks
    pub predecessors: Vec<NodeId>,
    /// Reverse edges, one entry per operand slot that refers to this node
    pub(crate) users: Vec<NodeId>,
    pub span: Option<SourceSpan>,
    pub(crate) removed: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, block: NodeId, predecessors: Vec<NodeId>, span: Option<SourceSpan>) -> Self {
        Self {
            kind,
            block,
            predecessors,
            users: Vec::new(),
            span,
            removed: false,
        }
    }
}
