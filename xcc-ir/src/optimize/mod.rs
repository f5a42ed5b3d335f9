//! Hooks that may rewrite each node as it is created

mod value_numbering;

pub use value_numbering::LocalValueNumbering;

use crate::graph::{IrGraph, NodeId};
use serde::Serialize;
use std::fmt;

/// Called on every freshly created data node. Returning a different id
/// makes the constructor drop the new node and use the returned one.
pub trait Optimizer {
    fn transform(&mut self, graph: &mut IrGraph, node: NodeId) -> NodeId;
}

/// Keeps every node as built
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOptimizer;

impl Optimizer for NoOptimizer {
    fn transform(&mut self, _graph: &mut IrGraph, node: NodeId) -> NodeId {
        node
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptLevel {
    O0,
    #[default]
    O1,
}

impl OptLevel {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(OptLevel::O0),
            1 => Some(OptLevel::O1),
            _ => None,
        }
    }

    /// A fresh optimizer for one function
    pub fn optimizer(self) -> Box<dyn Optimizer> {
        match self {
            OptLevel::O0 => Box::new(NoOptimizer),
            OptLevel::O1 => Box::new(LocalValueNumbering::default()),
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptLevel::O0 => write!(f, "-O0"),
            OptLevel::O1 => write!(f, "-O1"),
        }
    }
}
