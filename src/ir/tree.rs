//! The intermediate-code tree handed from the front end to a backend.
//!
//! Nodes live in an arena owned by [`IntermediateCode`]; child edges own (via
//! the arena's ordering) and the parent edge is a plain index back-reference,
//! set exactly when a node is added as a child.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::ir::symtab::EntryId;
use crate::parser::Value;

/// Index of a node in the arena. Non-owning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    // Program structure
    Program,
    Procedure,
    Function,

    // Statements
    Compound,
    Assign,
    Loop,
    If,
    Select,
    Call,
    Noop,

    // Relational operators
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Not,

    // Additive operators
    Add,
    Subtract,
    Or,
    Negate,

    // Multiplicative operators
    Multiply,
    IntegerDivide,
    FloatDivide,
    Mod,
    And,

    // Operands
    Variable,
    Subscript,
    Field,
    IntegerConstant,
    RealConstant,
    StringConstant,
    BooleanConstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Line,
    Id,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeAttribute {
    Line(usize),
    Id(EntryId),
    Value(Value),
}

#[derive(Debug, Clone)]
pub struct Node {
    node_type: NodeType,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: HashMap<NodeKey, NodeAttribute>,
}

impl Node {
    fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn get_attribute(&self, key: NodeKey) -> Option<&NodeAttribute> {
        self.attributes.get(&key)
    }
}

/// Root-node holder plus the arena behind it. The parser attaches the root
/// once; backends treat the whole structure as read-only.
#[derive(Debug, Default)]
pub struct IntermediateCode {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl IntermediateCode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(node_type));
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Append `child` under `parent`, wiring the back-reference; returns the
    /// child id so construction chains naturally.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        child
    }

    pub fn set_attribute(&mut self, id: NodeId, key: NodeKey, attribute: NodeAttribute) {
        self.nodes[id.0].attributes.insert(key, attribute);
    }

    pub fn get_attribute(&self, id: NodeId, key: NodeKey) -> Option<&NodeAttribute> {
        self.nodes[id.0].attributes.get(&key)
    }

    /// Shallow duplicate: same type, same parent reference, same attributes,
    /// no children.
    pub fn copy(&mut self, id: NodeId) -> NodeId {
        let node = &self.nodes[id.0];
        let duplicate = Node {
            node_type: node.node_type,
            parent: node.parent,
            children: Vec::new(),
            attributes: node.attributes.clone(),
        };
        let copy_id = NodeId(self.nodes.len());
        self.nodes.push(duplicate);
        copy_id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Indented listing of the tree, for the `--intermediate` dump.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.dump_node(root, 0, &mut out);
        }
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "{:indent$}{:?}", "", node.node_type, indent = depth * 2);
        for key in [NodeKey::Line, NodeKey::Id, NodeKey::Value] {
            if let Some(attribute) = node.get_attribute(key) {
                let _ = write!(out, " {attribute:?}");
            }
        }
        out.push('\n');
        for &child in node.children() {
            self.dump_node(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_child_sets_the_parent_back_reference() {
        let mut icode = IntermediateCode::new();
        let compound = icode.create(NodeType::Compound);
        let assign = icode.create(NodeType::Assign);
        assert_eq!(icode.node(assign).parent(), None);

        let returned = icode.add_child(compound, assign);
        assert_eq!(returned, assign);
        assert_eq!(icode.node(assign).parent(), Some(compound));
        assert_eq!(icode.node(compound).children(), &[assign]);
    }

    #[test]
    fn attributes_round_trip() {
        let mut icode = IntermediateCode::new();
        let constant = icode.create(NodeType::IntegerConstant);
        icode.set_attribute(constant, NodeKey::Line, NodeAttribute::Line(7));
        icode.set_attribute(constant, NodeKey::Value, NodeAttribute::Value(Value::Integer(42)));

        assert_eq!(
            icode.get_attribute(constant, NodeKey::Line),
            Some(&NodeAttribute::Line(7))
        );
        assert_eq!(
            icode.get_attribute(constant, NodeKey::Value),
            Some(&NodeAttribute::Value(Value::Integer(42)))
        );
        assert_eq!(icode.get_attribute(constant, NodeKey::Id), None);
    }

    #[test]
    fn copy_is_shallow() {
        let mut icode = IntermediateCode::new();
        let parent = icode.create(NodeType::Compound);
        let original = icode.create(NodeType::Assign);
        icode.add_child(parent, original);
        icode.set_attribute(original, NodeKey::Line, NodeAttribute::Line(3));
        let grandchild = icode.create(NodeType::Noop);
        icode.add_child(original, grandchild);

        let copy = icode.copy(original);
        assert_eq!(icode.node(copy).node_type(), NodeType::Assign);
        assert_eq!(icode.node(copy).parent(), Some(parent));
        assert_eq!(
            icode.get_attribute(copy, NodeKey::Line),
            Some(&NodeAttribute::Line(3))
        );
        assert!(icode.node(copy).children().is_empty());
    }

    #[test]
    fn root_is_attached_once() {
        let mut icode = IntermediateCode::new();
        assert_eq!(icode.root(), None);
        let root = icode.create(NodeType::Compound);
        icode.set_root(root);
        assert_eq!(icode.root(), Some(root));
    }
}
