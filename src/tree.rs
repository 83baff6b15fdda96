//! Input model: keyed, ordered trees.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a node. Unique among the nodes of one tree.
///
/// Integer and string ids never compare equal, so `1` and `"1"` are
/// different nodes. The empty string is reserved for the implicit root of a
/// forest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Str(String),
}

impl NodeId {
    /// Id of the synthetic root a forest is flattened under.
    pub fn forest_root() -> Self {
        NodeId::Str(String::new())
    }

    pub fn is_forest_root(&self) -> bool {
        matches!(self, NodeId::Str(s) if s.is_empty())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(n) => write!(f, "{}", n),
            NodeId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for NodeId {
    fn from(n: i64) -> Self {
        NodeId::Int(n)
    }
}

impl From<i32> for NodeId {
    fn from(n: i32) -> Self {
        NodeId::Int(n.into())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::Str(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId::Str(s)
    }
}

/// A node of an input tree: an id, an opaque value payload and ordered children.
///
/// `value` carries every field of the node except its id and its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub value: Value,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            value: Value::Null,
            children: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, this node included.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// One side of a diff: a single rooted tree or a forest of top-level siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Tree {
    Root(Node),
    Forest(Vec<Node>),
}

impl Tree {
    /// Number of user nodes. The implicit forest root is not counted.
    pub fn node_count(&self) -> usize {
        match self {
            Tree::Root(node) => node.subtree_len(),
            Tree::Forest(nodes) => nodes.iter().map(Node::subtree_len).sum(),
        }
    }

    pub fn is_forest(&self) -> bool {
        matches!(self, Tree::Forest(_))
    }
}

impl From<Node> for Tree {
    fn from(node: Node) -> Self {
        Tree::Root(node)
    }
}

impl From<Vec<Node>> for Tree {
    fn from(nodes: Vec<Node>) -> Self {
        Tree::Forest(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::Int(42).to_string(), "42");
        assert_eq!(NodeId::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_node_id_int_and_str_differ() {
        assert_ne!(NodeId::Int(1), NodeId::from("1"));
    }

    #[test]
    fn test_forest_root_id() {
        assert!(NodeId::forest_root().is_forest_root());
        assert!(!NodeId::from("a").is_forest_root());
        assert!(!NodeId::Int(0).is_forest_root());
    }

    #[test]
    fn test_node_builder() {
        let node = Node::new(1)
            .with_value(json!({"v": 1}))
            .with_child(Node::new(11))
            .with_child(Node::new(12).with_child(Node::new(121)));
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.subtree_len(), 4);
    }

    #[test]
    fn test_tree_node_count() {
        let forest = Tree::Forest(vec![Node::new(1).with_child(Node::new(11)), Node::new(2)]);
        assert_eq!(forest.node_count(), 3);
        assert!(forest.is_forest());

        let root: Tree = Node::new("a").into();
        assert_eq!(root.node_count(), 1);
        assert!(!root.is_forest());
    }
}
