//! On-the-fly SSA construction
//!
//! Variables are looked up per block. A lookup in a block without a local
//! definition recurses into its predecessors, placing a phi where control
//! flow merges. Blocks whose predecessors are not all known yet are
//! unsealed: lookups there create operand-less phis that are completed
//! when the block is sealed. Phis that turn out to merge a single value
//! are removed again and their uses rewired.

use crate::graph::*;
use crate::optimize::Optimizer;
use crate::IrError;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use std::fmt;
use xcc_common::SourceSpan;

/// Anything tracked through SSA renaming
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variable {
    Named(String),
    /// The chain ordering trapping operations and returns
    SideEffect,
}

impl Variable {
    fn class(&self) -> ValueClass {
        match self {
            Variable::Named(_) => ValueClass::Data,
            Variable::SideEffect => ValueClass::SideEffect,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Named(name) => write!(f, "{}", name),
            Variable::SideEffect => write!(f, "<side effect>"),
        }
    }
}

pub struct GraphConstructor {
    graph: IrGraph,
    optimizer: Box<dyn Optimizer>,
    current_def: HashMap<Variable, HashMap<NodeId, NodeId>>,
    incomplete_phis: HashMap<NodeId, Vec<(Variable, NodeId)>>,
    sealed: HashSet<NodeId>,
    current_block: NodeId,
    /// Removed trivial phis and what replaced them
    replacements: HashMap<NodeId, NodeId>,
}

impl GraphConstructor {
    pub fn new(name: &str, optimizer: Box<dyn Optimizer>) -> Self {
        let graph = IrGraph::new(name);
        let start_block = graph.start_block();
        let mut constructor = Self {
            graph,
            optimizer,
            current_def: HashMap::new(),
            incomplete_phis: HashMap::new(),
            sealed: HashSet::new(),
            current_block: start_block,
            replacements: HashMap::new(),
        };
        constructor.sealed.insert(start_block);

        let start = constructor.graph.start();
        let initial = constructor.new_proj(start, ProjKind::SideEffect, None);
        constructor.write_side_effect(initial);
        constructor
    }

    pub fn graph(&self) -> &IrGraph {
        &self.graph
    }

    pub fn current_block(&self) -> NodeId {
        self.current_block
    }

    pub fn set_current_block(&mut self, block: NodeId) {
        self.current_block = block;
    }

    pub fn new_block(&mut self, span: &SourceSpan) -> NodeId {
        self.graph.new_block(Some(span.clone()))
    }

    /// Adds a data node to the current block and lets the optimizer replace it
    fn add_data_node(&mut self, kind: NodeKind, operands: Vec<NodeId>, span: &SourceSpan) -> NodeId {
        let node = self
            .graph
            .add_node(self.current_block, kind, operands, Some(span.clone()));
        let result = self.optimizer.transform(&mut self.graph, node);
        if result != node {
            self.graph.remove_node(node);
        }
        result
    }

    pub fn new_const_int(&mut self, value: i32, span: &SourceSpan) -> NodeId {
        self.add_data_node(NodeKind::ConstInt(value), Vec::new(), span)
    }

    pub fn new_const_bool(&mut self, value: bool, span: &SourceSpan) -> NodeId {
        self.add_data_node(NodeKind::ConstBool(value), Vec::new(), span)
    }

    /// Div and Mod are threaded through the side-effect chain and yield
    /// their value through a result projection
    pub fn new_binary(
        &mut self,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        span: &SourceSpan,
    ) -> Result<NodeId, IrError> {
        if !op.has_side_effect() {
            return Ok(self.add_data_node(NodeKind::Binary(op), vec![left, right], span));
        }

        let side_effect = self.read_side_effect()?;
        let node = self.add_data_node(NodeKind::Binary(op), vec![left, right, side_effect], span);
        if *self.graph.kind(node) != NodeKind::Binary(op) {
            return Ok(node);
        }
        let effect = self.new_proj(node, ProjKind::SideEffect, Some(span));
        self.write_side_effect(effect);
        Ok(self.new_proj(node, ProjKind::Result, Some(span)))
    }

    pub fn new_compare(&mut self, op: CompareOp, left: NodeId, right: NodeId, span: &SourceSpan) -> NodeId {
        self.add_data_node(NodeKind::Compare(op), vec![left, right], span)
    }

    fn new_proj(&mut self, source: NodeId, kind: ProjKind, span: Option<&SourceSpan>) -> NodeId {
        self.graph
            .add_node(self.current_block, NodeKind::Proj(kind), vec![source], span.cloned())
    }

    pub fn new_jump(&mut self, target: NodeId, span: &SourceSpan) -> NodeId {
        let jump = self.graph.add_node(
            self.current_block,
            NodeKind::Jump { target },
            Vec::new(),
            Some(span.clone()),
        );
        self.graph.add_predecessor(target, jump);
        jump
    }

    pub fn new_branch(&mut self, condition: NodeId, on_true: NodeId, on_false: NodeId, span: &SourceSpan) -> NodeId {
        let branch = self.graph.add_node(
            self.current_block,
            NodeKind::Branch { on_true, on_false },
            vec![condition],
            Some(span.clone()),
        );
        self.graph.add_predecessor(on_true, branch);
        self.graph.add_predecessor(on_false, branch);
        branch
    }

    pub fn new_return(&mut self, value: NodeId, span: &SourceSpan) -> Result<NodeId, IrError> {
        let side_effect = self.read_side_effect()?;
        let ret = self.graph.add_node(
            self.current_block,
            NodeKind::Return,
            vec![value, side_effect],
            Some(span.clone()),
        );
        let end = self.graph.end_block();
        self.graph.add_predecessor(end, ret);
        Ok(ret)
    }

    /// A phi over explicit per-edge values of an already sealed block
    pub fn new_phi_with_operands(&mut self, block: NodeId, operands: Vec<NodeId>) -> Result<NodeId, IrError> {
        let phi = self.graph.add_node(
            block,
            NodeKind::Phi {
                state: PhiState::Complete,
                class: ValueClass::Data,
            },
            operands,
            None,
        );
        self.try_remove_trivial_phi(phi)
    }

    fn new_phi(&mut self, block: NodeId, class: ValueClass) -> NodeId {
        self.graph.add_node(
            block,
            NodeKind::Phi {
                state: PhiState::Incomplete,
                class,
            },
            Vec::new(),
            None,
        )
    }

    fn write_side_effect(&mut self, value: NodeId) {
        let block = self.current_block;
        self.write_variable(Variable::SideEffect, block, value);
    }

    fn read_side_effect(&mut self) -> Result<NodeId, IrError> {
        let block = self.current_block;
        self.read_variable(&Variable::SideEffect, block)
    }

    pub fn write_variable(&mut self, variable: Variable, block: NodeId, value: NodeId) {
        self.current_def
            .entry(variable)
            .or_default()
            .insert(block, value);
    }

    /// Follows the replacement chain of removed phis
    fn resolve(&self, mut node: NodeId) -> NodeId {
        while let Some(&replacement) = self.replacements.get(&node) {
            node = replacement;
        }
        node
    }

    pub fn read_variable(&mut self, variable: &Variable, block: NodeId) -> Result<NodeId, IrError> {
        let local = self
            .current_def
            .get(variable)
            .and_then(|defs| defs.get(&block))
            .copied();
        match local {
            Some(value) => Ok(self.resolve(value)),
            None => self.read_variable_recursive(variable, block),
        }
    }

    fn read_variable_recursive(&mut self, variable: &Variable, block: NodeId) -> Result<NodeId, IrError> {
        let value = if !self.sealed.contains(&block) {
            let phi = self.new_phi(block, variable.class());
            trace!("incomplete phi {} for {} in {}", phi, variable, block);
            self.incomplete_phis
                .entry(block)
                .or_default()
                .push((variable.clone(), phi));
            phi
        } else {
            let preds = self.graph.block_predecessors(block);
            match preds.as_slice() {
                [] => {
                    return Err(IrError::MissingDefinition {
                        variable: variable.to_string(),
                        block,
                    })
                }
                [single] => self.read_variable(variable, *single)?,
                _ => {
                    let phi = self.new_phi(block, variable.class());
                    self.write_variable(variable.clone(), block, phi);
                    self.add_phi_operands(variable, phi)?
                }
            }
        };
        self.write_variable(variable.clone(), block, value);
        Ok(self.resolve(value))
    }

    fn add_phi_operands(&mut self, variable: &Variable, phi: NodeId) -> Result<NodeId, IrError> {
        let block = self.graph.block_of(phi);
        for pred in self.graph.block_predecessors(block) {
            let value = self.read_variable(variable, pred)?;
            self.graph.add_predecessor(phi, value);
        }
        self.graph.set_kind(
            phi,
            NodeKind::Phi {
                state: PhiState::Complete,
                class: variable.class(),
            },
        );
        self.try_remove_trivial_phi(phi)
    }

    fn try_remove_trivial_phi(&mut self, phi: NodeId) -> Result<NodeId, IrError> {
        let mut same = None;
        for &operand in self.graph.predecessors(phi) {
            if Some(operand) == same || operand == phi {
                continue;
            }
            if same.is_some() {
                return Ok(phi);
            }
            same = Some(operand);
        }
        let Some(same) = same else {
            return Err(self.graph.inconsistency(phi, "phi merges no value"));
        };

        debug!("removing trivial phi {} in favor of {}", phi, same);
        let users: Vec<NodeId> = self
            .graph
            .replace_all_uses(phi, same)
            .into_iter()
            .filter(|&user| user != phi)
            .collect();
        self.graph.remove_node(phi);
        self.replacements.insert(phi, same);

        for user in users {
            let complete_phi = matches!(
                self.graph.kind(user),
                NodeKind::Phi {
                    state: PhiState::Complete,
                    ..
                }
            );
            if complete_phi && self.graph.contains(user) {
                self.try_remove_trivial_phi(user)?;
            }
        }
        Ok(self.resolve(same))
    }

    pub fn seal_block(&mut self, block: NodeId) -> Result<(), IrError> {
        trace!("sealing {}", block);
        for (variable, phi) in self.incomplete_phis.remove(&block).unwrap_or_default() {
            self.add_phi_operands(&variable, phi)?;
        }
        self.sealed.insert(block);
        Ok(())
    }

    pub fn is_sealed(&self, block: NodeId) -> bool {
        self.sealed.contains(&block)
    }

    /// Seals the end block and checks the finished graph
    pub fn finish(mut self) -> Result<IrGraph, IrError> {
        let end = self.graph.end_block();
        self.seal_block(end)?;
        if let Some((&block, _)) = self.incomplete_phis.iter().find(|(_, phis)| !phis.is_empty()) {
            return Err(self.graph.inconsistency(block, "block was never sealed"));
        }
        self.graph.verify()?;
        Ok(self.graph)
    }
}
