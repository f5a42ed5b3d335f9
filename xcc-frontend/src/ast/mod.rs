//! Abstract Syntax Tree definitions
//!
//! Built by the parser, checked by semantic analysis and consumed by the
//! SSA construction in `xcc-ir`.

pub mod expressions;
pub mod ops;
pub mod statements;

pub use expressions::{Expression, ExpressionKind};
pub use ops::{AssignOp, BinaryOp, UnaryOp};
pub use statements::{FunctionDefinition, Program, Statement, StatementKind};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two value types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Bool,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operator_display() {
        assert_eq!(BinaryOp::LeftShift.to_string(), "<<");
        assert_eq!(AssignOp::Compound(BinaryOp::RightShift).to_string(), ">>=");
        assert_eq!(UnaryOp::BitNot.to_string(), "~");
        assert_eq!(Type::Bool.to_string(), "bool");
    }

    #[test]
    fn test_int_literal_wraps_to_target() {
        assert_eq!(Expression::int_literal_value(2147483648), i32::MIN);
        assert_eq!(Expression::int_literal_value(0xFFFF_FFFF), -1);
        assert_eq!(Expression::int_literal_value(42), 42);
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOp::Mod.is_integer_arithmetic());
        assert!(!BinaryOp::Less.is_integer_arithmetic());
        assert!(BinaryOp::GreaterEqual.is_ordering());
        assert!(BinaryOp::NotEqual.is_equality());
        assert!(BinaryOp::LogicalOr.is_logical());
    }
}
