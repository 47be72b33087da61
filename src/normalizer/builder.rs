//! Arena Tree Builder
//!
//! Nodes under construction live in a flat arena and refer to each other by
//! index. Parent and sibling questions are answered from the arena, so the
//! logic-operator pass can move nodes around without any back-pointers.
//! `finish` freezes the arena into the typed `Node` tree.

use crate::normalizer::errors::StructuralError;
use crate::normalizer::types::{
    ArgumentKind, ArgumentNode, Arity, BinaryLogicOpNode, CommandSubstitutionNode, Direction,
    FlagNode, HeadCommandNode, Node, NodeKind, NormalizedTree, PipelineNode,
    ProcessSubstitutionNode, UnaryLogicOpNode,
};

pub type NodeId = usize;

/// The synthetic root every builder starts with
pub const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    value: String,
    argument: ArgumentKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct TreeBuilder {
    slots: Vec<Slot>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                kind: NodeKind::Root,
                value: "root".to_string(),
                argument: ArgumentKind::Unknown,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append a new node as the last child of `parent`
    pub fn attach(&mut self, parent: NodeId, kind: NodeKind, value: impl Into<String>) -> NodeId {
        let id = self.slots.len();
        self.slots.push(Slot {
            kind,
            value: value.into(),
            argument: ArgumentKind::Unknown,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slots[parent].children.push(id);
        id
    }

    pub fn attach_argument(
        &mut self,
        parent: NodeId,
        kind: ArgumentKind,
        value: impl Into<String>,
    ) -> NodeId {
        let id = self.attach(parent, NodeKind::Argument, value);
        self.slots[id].argument = kind;
        id
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.slots[id].kind
    }

    pub fn value(&self, id: NodeId) -> &str {
        &self.slots[id].value
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id].children
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id].children.last().copied()
    }

    fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.slots[id].parent?;
        let idx = self.slots[parent].children.iter().position(|&c| c == id)?;
        Some((parent, idx))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, idx) = self.position(id)?;
        self.slots[parent].children.get(idx + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, idx) = self.position(id)?;
        idx.checked_sub(1)
            .map(|prev| self.slots[parent].children[prev])
    }

    /// Detach `child` from its parent and append it under `new_parent`
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        if let Some((old_parent, idx)) = self.position(child) {
            self.slots[old_parent].children.remove(idx);
        }
        self.slots[child].parent = Some(new_parent);
        self.slots[new_parent].children.push(child);
    }

    /// Freeze into the typed tree, checking arity, legal child kinds and
    /// that no node sits deeper than `max_depth` below the root
    pub fn finish(self, max_depth: usize) -> Result<NormalizedTree, StructuralError> {
        let children = self.freeze_children(ROOT, 0, max_depth)?;
        Ok(NormalizedTree { children })
    }

    fn freeze_children(
        &self,
        id: NodeId,
        depth: usize,
        max_depth: usize,
    ) -> Result<Vec<Node>, StructuralError> {
        let slot = &self.slots[id];
        for &child in &slot.children {
            let child_kind = self.slots[child].kind;
            if !slot.kind.accepts(child_kind) {
                return Err(StructuralError::IllegalChild {
                    parent: slot.kind,
                    child: child_kind,
                });
            }
        }
        if let Arity::Fixed(expected) = slot.kind.arity() {
            if slot.children.len() != expected {
                return Err(StructuralError::ArityViolation {
                    kind: slot.kind,
                    expected,
                    found: slot.children.len(),
                });
            }
        }
        slot.children
            .iter()
            .map(|&c| self.freeze(c, depth + 1, max_depth))
            .collect()
    }

    fn freeze(&self, id: NodeId, depth: usize, max_depth: usize) -> Result<Node, StructuralError> {
        // Operator chains built by absorption are not bounded by the walk
        if depth > max_depth {
            return Err(StructuralError::DepthExceeded { limit: max_depth });
        }
        let slot = &self.slots[id];
        let children = self.freeze_children(id, depth, max_depth)?;
        let arity_error = |found: usize, expected: usize| StructuralError::ArityViolation {
            kind: slot.kind,
            expected,
            found,
        };

        let node = match slot.kind {
            NodeKind::Pipeline => Node::Pipeline(PipelineNode { stages: children }),
            NodeKind::HeadCommand => Node::HeadCommand(HeadCommandNode {
                name: slot.value.clone(),
                children,
            }),
            NodeKind::Flag => Node::Flag(FlagNode {
                name: slot.value.clone(),
                children,
            }),
            NodeKind::Argument => Node::Argument(ArgumentNode {
                kind: slot.argument,
                value: slot.value.clone(),
            }),
            NodeKind::UnaryLogicOp => {
                let [operand] = <[Node; 1]>::try_from(children)
                    .map_err(|v| arity_error(v.len(), 1))?;
                Node::UnaryLogicOp(UnaryLogicOpNode {
                    op: slot.value.clone(),
                    operand: Box::new(operand),
                })
            }
            NodeKind::BinaryLogicOp => {
                let [left, right] = <[Node; 2]>::try_from(children)
                    .map_err(|v| arity_error(v.len(), 2))?;
                Node::BinaryLogicOp(BinaryLogicOpNode {
                    op: slot.value.clone(),
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            NodeKind::CommandSubstitution => {
                let [body] = <[Node; 1]>::try_from(children)
                    .map_err(|v| arity_error(v.len(), 1))?;
                Node::CommandSubstitution(CommandSubstitutionNode {
                    body: Box::new(body),
                })
            }
            NodeKind::ProcessSubstitution => {
                let [body] = <[Node; 1]>::try_from(children)
                    .map_err(|v| arity_error(v.len(), 1))?;
                let direction = if slot.value == ">" {
                    Direction::Output
                } else {
                    Direction::Input
                };
                Node::ProcessSubstitution(ProcessSubstitutionNode {
                    direction,
                    body: Box::new(body),
                })
            }
            NodeKind::Root => {
                return Err(StructuralError::IllegalChild {
                    parent: slot.parent.map_or(NodeKind::Root, |p| self.slots[p].kind),
                    child: NodeKind::Root,
                })
            }
        };
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_siblings() {
        let mut b = TreeBuilder::new();
        let find = b.attach(ROOT, NodeKind::HeadCommand, "find");
        let a = b.attach(find, NodeKind::Flag, "-name");
        let op = b.attach(find, NodeKind::UnaryLogicOp, "-not");
        let c = b.attach(find, NodeKind::Flag, "-type");

        assert_eq!(b.parent(a), Some(find));
        assert_eq!(b.last_child(find), Some(c));
        assert_eq!(b.next_sibling(op), Some(c));
        assert_eq!(b.prev_sibling(op), Some(a));
        assert_eq!(b.prev_sibling(a), None);
        assert_eq!(b.next_sibling(c), None);
    }

    #[test]
    fn test_reparent() {
        let mut b = TreeBuilder::new();
        let find = b.attach(ROOT, NodeKind::HeadCommand, "find");
        let op = b.attach(find, NodeKind::UnaryLogicOp, "-not");
        let flag = b.attach(find, NodeKind::Flag, "-empty");
        b.reparent(flag, op);

        assert_eq!(b.children(find), &[op]);
        assert_eq!(b.children(op), &[flag]);
        assert_eq!(b.parent(flag), Some(op));

        let tree = b.finish(16).unwrap();
        assert_eq!(tree.values(), vec!["find", "-not", "-empty"]);
    }

    #[test]
    fn test_finish_rejects_bad_arity() {
        let mut b = TreeBuilder::new();
        let find = b.attach(ROOT, NodeKind::HeadCommand, "find");
        b.attach(find, NodeKind::UnaryLogicOp, "-not");
        assert!(matches!(
            b.finish(16),
            Err(StructuralError::ArityViolation { expected: 1, found: 0, .. })
        ));
    }

    #[test]
    fn test_finish_rejects_illegal_child() {
        let mut b = TreeBuilder::new();
        let ls = b.attach(ROOT, NodeKind::HeadCommand, "ls");
        let arg = b.attach_argument(ls, ArgumentKind::File, "a.txt");
        b.attach(arg, NodeKind::Flag, "-l");
        assert!(matches!(
            b.finish(16),
            Err(StructuralError::IllegalChild {
                parent: NodeKind::Argument,
                child: NodeKind::Flag,
            })
        ));
    }

    #[test]
    fn test_finish_rejects_deep_chain() {
        let mut b = TreeBuilder::new();
        let find = b.attach(ROOT, NodeKind::HeadCommand, "find");
        let mut parent = find;
        for _ in 0..10 {
            parent = b.attach(parent, NodeKind::UnaryLogicOp, "!");
        }
        b.attach(parent, NodeKind::Flag, "-empty");
        assert!(matches!(
            b.clone().finish(8),
            Err(StructuralError::DepthExceeded { limit: 8 })
        ));
        assert!(b.finish(16).is_ok());
    }

    #[test]
    fn test_process_substitution_direction() {
        let mut b = TreeBuilder::new();
        let diff = b.attach(ROOT, NodeKind::HeadCommand, "diff");
        let sub = b.attach(diff, NodeKind::ProcessSubstitution, ">");
        b.attach(sub, NodeKind::HeadCommand, "sort");
        let tree = b.finish(16).unwrap();
        if let Node::HeadCommand(head) = &tree.children[0] {
            assert_eq!(head.children[0].value(), ">");
        } else {
            panic!("expected head command");
        }
    }
}
