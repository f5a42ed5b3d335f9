//! Arena-backed SSA graph for one function

use super::node::*;
use crate::IrError;
use std::collections::{HashMap, HashSet};
use xcc_common::SourceSpan;

#[derive(Debug, Clone)]
pub struct IrGraph {
    name: String,
    nodes: Vec<Node>,
    /// Block ids in creation order
    blocks: Vec<NodeId>,
    /// Non-block nodes of each block, in insertion order
    members: HashMap<NodeId, Vec<NodeId>>,
    start_block: NodeId,
    end_block: NodeId,
    start: NodeId,
}

impl IrGraph {
    /// Creates the start block holding the Start node, and the end block
    /// every Return flows into
    pub fn new(name: impl Into<String>) -> Self {
        let mut graph = Self {
            name: name.into(),
            nodes: Vec::new(),
            blocks: Vec::new(),
            members: HashMap::new(),
            start_block: NodeId(0),
            end_block: NodeId(0),
            start: NodeId(0),
        };
        graph.start_block = graph.new_block(None);
        graph.end_block = graph.new_block(None);
        graph.start = graph.add_node(graph.start_block, NodeKind::Start, Vec::new(), None);
        graph
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn start_block(&self) -> NodeId {
        self.start_block
    }

    pub fn end_block(&self) -> NodeId {
        self.end_block
    }

    /// Number of ids handed out, removed nodes included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn new_block(&mut self, span: Option<SourceSpan>) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Node::new(NodeKind::Block, id, Vec::new(), span));
        self.blocks.push(id);
        self.members.insert(id, Vec::new());
        id
    }

    /// Appends a node to `block` and registers it as a user of its operands
    pub fn add_node(
        &mut self,
        block: NodeId,
        kind: NodeKind,
        predecessors: Vec<NodeId>,
        span: Option<SourceSpan>,
    ) -> NodeId {
        let id = self.next_id();
        for &pred in &predecessors {
            self.nodes[pred.index()].users.push(id);
        }
        self.nodes.push(Node::new(kind, block, predecessors, span));
        self.members.entry(block).or_default().push(id);
        id
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn block_of(&self, id: NodeId) -> NodeId {
        self.nodes[id.index()].block
    }

    /// False once a node has been folded away or replaced
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(|node| !node.removed)
    }

    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].predecessors
    }

    pub fn predecessor(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.index()].predecessors.get(index).copied()
    }

    /// Users of a node; a control node's successor is the block it enters
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].users
    }

    pub fn add_predecessor(&mut self, node: NodeId, pred: NodeId) {
        self.nodes[node.index()].predecessors.push(pred);
        self.nodes[pred.index()].users.push(node);
    }

    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.index()].kind = kind;
    }

    /// Redirects every operand slot referring to `old` to `new`.
    /// Returns the distinct users that were rewritten.
    pub fn replace_all_uses(&mut self, old: NodeId, new: NodeId) -> Vec<NodeId> {
        let users = std::mem::take(&mut self.nodes[old.index()].users);
        let mut rewritten = Vec::new();
        for &user in &users {
            for pred in self.nodes[user.index()].predecessors.iter_mut() {
                if *pred == old {
                    *pred = new;
                }
            }
            self.nodes[new.index()].users.push(user);
            if !rewritten.contains(&user) {
                rewritten.push(user);
            }
        }
        rewritten
    }

    /// Detaches a node from its block and from the user lists of its operands
    pub fn remove_node(&mut self, id: NodeId) {
        let block = self.nodes[id.index()].block;
        if let Some(members) = self.members.get_mut(&block) {
            members.retain(|&member| member != id);
        }
        let predecessors = std::mem::take(&mut self.nodes[id.index()].predecessors);
        for pred in predecessors {
            let users = &mut self.nodes[pred.index()].users;
            if let Some(position) = users.iter().position(|&user| user == id) {
                users.swap_remove(position);
            }
        }
        self.nodes[id.index()].removed = true;
    }

    pub fn blocks(&self) -> &[NodeId] {
        &self.blocks
    }

    pub fn block_nodes(&self, block: NodeId) -> &[NodeId] {
        self.members.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn phis(&self, block: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.block_nodes(block)
            .iter()
            .copied()
            .filter(move |&id| self.kind(id).is_phi())
    }

    /// The control node ending `block`, if it has one yet
    pub fn terminator(&self, block: NodeId) -> Option<NodeId> {
        self.block_nodes(block)
            .iter()
            .rev()
            .copied()
            .find(|&id| self.kind(id).is_terminator())
    }

    /// Blocks whose control flow enters `block`, one entry per incoming edge
    /// and in phi operand order
    pub fn block_predecessors(&self, block: NodeId) -> Vec<NodeId> {
        self.predecessors(block)
            .iter()
            .map(|&control| self.block_of(control))
            .collect()
    }

    pub fn block_successors(&self, block: NodeId) -> Vec<NodeId> {
        match self.terminator(block).map(|id| self.kind(id)) {
            Some(NodeKind::Branch { on_true, on_false }) => vec![*on_true, *on_false],
            Some(NodeKind::Jump { target }) => vec![*target],
            Some(NodeKind::Return) => vec![self.end_block],
            _ => Vec::new(),
        }
    }

    /// Index of the edge from `pred_control` among the incoming edges of `block`
    pub fn edge_index(&self, block: NodeId, pred_control: NodeId) -> Option<usize> {
        self.predecessors(block)
            .iter()
            .position(|&control| control == pred_control)
    }

    /// Follows Proj(Result) to the Div/Mod node that computes the value
    pub fn skip_proj(&self, id: NodeId) -> NodeId {
        match self.kind(id) {
            NodeKind::Proj(ProjKind::Result) => self.predecessor(id, PROJ_SOURCE_INDEX).unwrap_or(id),
            _ => id,
        }
    }

    /// Whether the node holds a program value that needs a location
    pub fn produces_value(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::ConstInt(_)
            | NodeKind::ConstBool(_)
            | NodeKind::Binary(_)
            | NodeKind::Compare(_) => true,
            NodeKind::Phi { class, .. } => *class == ValueClass::Data,
            _ => false,
        }
    }

    /// Reachable blocks in reverse postorder from the start block
    pub fn reverse_postorder(&self) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut postorder = Vec::new();
        let mut stack = vec![(self.start_block, 0usize)];
        visited.insert(self.start_block);

        while let Some((block, next)) = stack.pop() {
            let successors = self.block_successors(block);
            if let Some(&succ) = successors.get(next) {
                stack.push((block, next + 1));
                if visited.insert(succ) {
                    stack.push((succ, 0));
                }
            } else {
                postorder.push(block);
            }
        }

        postorder.reverse();
        postorder
    }

    /// Structural checks run once construction is finished
    pub fn verify(&self) -> Result<(), IrError> {
        for block in self.reverse_postorder() {
            if block == self.end_block {
                continue;
            }
            let edges = self.predecessors(block).len();
            for &id in self.block_nodes(block) {
                match self.kind(id) {
                    NodeKind::Phi {
                        state: PhiState::Incomplete,
                        ..
                    } => return Err(self.inconsistency(id, "phi left incomplete")),
                    NodeKind::Phi { .. } if self.predecessors(id).len() != edges => {
                        return Err(self.inconsistency(
                            id,
                            format!(
                                "phi has {} operands but block has {} predecessors",
                                self.predecessors(id).len(),
                                edges
                            ),
                        ))
                    }
                    _ => {}
                }
            }
            // phis read in a sealed block are appended after its control node
            let members = self.block_nodes(block);
            let Some(position) = members.iter().position(|&id| self.kind(id).is_terminator()) else {
                return Err(self.inconsistency(block, "block does not end in a control node"));
            };
            if let Some(&stray) = members[position + 1..]
                .iter()
                .find(|&&id| !self.kind(id).is_phi())
            {
                let message = if self.kind(stray).is_terminator() {
                    "block has more than one control node"
                } else {
                    "node follows the block's control node"
                };
                return Err(self.inconsistency(stray, message));
            }
        }
        Ok(())
    }

    pub(crate) fn inconsistency(&self, node: NodeId, message: impl Into<String>) -> IrError {
        IrError::Consistency {
            node,
            kind: self.kind(node).to_string(),
            block: self.block_of(node),
            message: message.into(),
        }
    }
}
