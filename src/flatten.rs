//! Flattening of nested trees into pre-order node lists.
//!
//! The diff engine never walks [`Node`](crate::tree::Node) values directly.
//! Both sides are flattened first: every node becomes a [`FlatNode`] carrying
//! its value and a [`NodeContext`] (parent id, sibling index, structural
//! path), stored in pre-order so that position 0 is always the root.
//!
//! # Examples
//!
//! ```
//! use tdiff_rs::{flatten_tree, Node, Tree};
//!
//! let tree = Tree::Root(Node::new(1).with_child(Node::new(2).with_child(Node::new(3))));
//! let flat = flatten_tree(&tree).unwrap();
//!
//! let ids: Vec<String> = flat.iter().map(|(id, _)| id.to_string()).collect();
//! assert_eq!(ids, vec!["1", "2", "3"]);
//! assert_eq!(flat.get(2).context.path, vec!["children", "0", "children", "0"]);
//! ```

use crate::error::DiffError;
use crate::options::DuplicateIdPolicy;
use crate::tree::{Node, NodeId, Tree};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Where a node sits in its tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeContext {
    /// Id of the parent node; `None` for the root.
    pub parent_id: Option<NodeId>,
    /// Position among the parent's children; `None` for the root.
    pub index: Option<usize>,
    /// Descent tokens from the root, e.g. `["children", "1", "children", "0"]`.
    pub path: Vec<String>,
}

/// A node detached from its children, with its structural context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatNode {
    pub id: NodeId,
    pub value: Value,
    pub context: NodeContext,
}

/// A flattened tree: nodes in pre-order plus the child lists needed to walk
/// it level by level.
#[derive(Debug, Clone)]
pub struct FlatTree {
    nodes: Vec<FlatNode>,
    children: Vec<Vec<usize>>,
    forest: bool,
}

/// Flattens a tree (or a forest under a synthetic root with an empty id) into
/// pre-order.
///
/// # Errors
///
/// Returns [`DiffError::InvalidTree`] when a node carries the empty string as
/// its id. That id is reserved for the implicit forest root.
pub fn flatten_tree(tree: &Tree) -> Result<FlatTree, DiffError> {
    let mut flat = FlatTree {
        nodes: Vec::with_capacity(tree.node_count() + 1),
        children: Vec::new(),
        forest: tree.is_forest(),
    };

    // (node, parent position, index among siblings, path)
    let mut stack: Vec<(&Node, Option<usize>, Option<usize>, Vec<String>)> = Vec::new();

    match tree {
        Tree::Root(root) => stack.push((root, None, None, Vec::new())),
        Tree::Forest(nodes) => {
            flat.push(
                FlatNode {
                    id: NodeId::forest_root(),
                    value: Value::Null,
                    context: NodeContext {
                        parent_id: None,
                        index: None,
                        path: Vec::new(),
                    },
                },
                None,
            );
            for (index, node) in nodes.iter().enumerate().rev() {
                stack.push((node, Some(0), Some(index), child_path(&[], index)));
            }
        }
    }

    while let Some((node, parent, index, path)) = stack.pop() {
        if node.id.is_forest_root() {
            return Err(DiffError::invalid_tree(&path, "node id is empty"));
        }

        for (child_index, child) in node.children.iter().enumerate().rev() {
            stack.push((
                child,
                Some(flat.nodes.len()),
                Some(child_index),
                child_path(&path, child_index),
            ));
        }

        let parent_id = parent.map(|p| flat.nodes[p].id.clone());
        flat.push(
            FlatNode {
                id: node.id.clone(),
                value: node.value.clone(),
                context: NodeContext {
                    parent_id,
                    index,
                    path,
                },
            },
            parent,
        );
    }

    tracing::debug!(
        nodes = flat.nodes.len(),
        forest = flat.forest,
        "flattened tree"
    );
    Ok(flat)
}

fn child_path(parent: &[String], index: usize) -> Vec<String> {
    let mut path = Vec::with_capacity(parent.len() + 2);
    path.extend_from_slice(parent);
    path.push("children".to_string());
    path.push(index.to_string());
    path
}

impl FlatTree {
    fn push(&mut self, node: FlatNode, parent: Option<usize>) {
        let position = self.nodes.len();
        if let Some(parent) = parent {
            self.children[parent].push(position);
        }
        self.nodes.push(node);
        self.children.push(Vec::new());
    }

    /// Number of flattened nodes, the synthetic forest root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a flattened tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the root is the synthetic root of a forest.
    pub fn is_forest(&self) -> bool {
        self.forest
    }

    pub fn root(&self) -> &FlatNode {
        &self.nodes[0]
    }

    pub fn get(&self, position: usize) -> &FlatNode {
        &self.nodes[position]
    }

    /// Pre-order positions of the children of the node at `position`.
    pub fn children_of(&self, position: usize) -> &[usize] {
        &self.children[position]
    }

    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    /// `(id, node)` pairs in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &FlatNode)> {
        self.nodes.iter().map(|node| (&node.id, node))
    }

    /// Builds an id → position lookup over every node.
    ///
    /// With [`DuplicateIdPolicy::LastWins`] a repeated id silently points at
    /// the last occurrence in pre-order.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::DuplicateId`] for the second occurrence of an id
    /// under [`DuplicateIdPolicy::Reject`].
    pub fn id_index(&self, policy: DuplicateIdPolicy) -> Result<HashMap<NodeId, usize>, DiffError> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for (position, node) in self.nodes.iter().enumerate() {
            let previous = index.insert(node.id.clone(), position);
            if previous.is_some() && policy == DuplicateIdPolicy::Reject {
                return Err(DiffError::duplicate_id(
                    node.id.clone(),
                    &node.context.path,
                ));
            }
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Tree {
        Tree::Root(
            Node::new(1)
                .with_value(json!({"v": 1}))
                .with_child(Node::new(2).with_child(Node::new(4)))
                .with_child(Node::new(3)),
        )
    }

    #[test]
    fn test_flatten_preorder() {
        let flat = flatten_tree(&sample()).unwrap();
        let ids: Vec<NodeId> = flat.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(
            ids,
            vec![NodeId::Int(1), NodeId::Int(2), NodeId::Int(4), NodeId::Int(3)]
        );
    }

    #[test]
    fn test_flatten_context() {
        let flat = flatten_tree(&sample()).unwrap();

        let root = flat.root();
        assert_eq!(root.context.parent_id, None);
        assert_eq!(root.context.index, None);
        assert!(root.context.path.is_empty());
        assert_eq!(root.value, json!({"v": 1}));

        let three = flat.get(3);
        assert_eq!(three.context.parent_id, Some(NodeId::Int(1)));
        assert_eq!(three.context.index, Some(1));
        assert_eq!(three.context.path, vec!["children", "1"]);

        let four = flat.get(2);
        assert_eq!(four.context.parent_id, Some(NodeId::Int(2)));
        assert_eq!(four.context.path, vec!["children", "0", "children", "0"]);
    }

    #[test]
    fn test_flatten_children() {
        let flat = flatten_tree(&sample()).unwrap();
        assert_eq!(flat.children_of(0), &[1, 3]);
        assert_eq!(flat.children_of(1), &[2]);
        assert!(flat.children_of(3).is_empty());
    }

    #[test]
    fn test_flatten_forest() {
        let forest = Tree::Forest(vec![Node::new("a"), Node::new("b").with_child(Node::new("c"))]);
        let flat = flatten_tree(&forest).unwrap();

        assert!(flat.is_forest());
        assert_eq!(flat.len(), 4);
        assert!(flat.root().id.is_forest_root());
        assert_eq!(flat.root().value, Value::Null);

        let b = flat.get(2);
        assert_eq!(b.context.parent_id, Some(NodeId::forest_root()));
        assert_eq!(b.context.index, Some(1));
        assert_eq!(b.context.path, vec!["children", "1"]);
        assert_eq!(flat.children_of(0), &[1, 2]);
    }

    #[test]
    fn test_flatten_empty_forest() {
        let flat = flatten_tree(&Tree::Forest(Vec::new())).unwrap();
        assert_eq!(flat.len(), 1);
        assert!(flat.children_of(0).is_empty());
    }

    #[test]
    fn test_flatten_rejects_empty_id() {
        let tree = Tree::Root(Node::new(1).with_child(Node::new(2)).with_child(Node::new("")));
        let err = flatten_tree(&tree).unwrap_err();
        assert_eq!(
            err,
            DiffError::InvalidTree {
                path: "children[1]".to_string(),
                reason: "node id is empty".to_string(),
            }
        );
    }

    #[test]
    fn test_id_index_last_wins() {
        let tree = Tree::Root(
            Node::new(1)
                .with_child(Node::new(2).with_child(Node::new(9)))
                .with_child(Node::new(9)),
        );
        let flat = flatten_tree(&tree).unwrap();
        let index = flat.id_index(DuplicateIdPolicy::LastWins).unwrap();
        assert_eq!(index[&NodeId::Int(9)], 3);
    }

    #[test]
    fn test_id_index_reject() {
        let tree = Tree::Root(
            Node::new(1)
                .with_child(Node::new(2).with_child(Node::new(9)))
                .with_child(Node::new(9)),
        );
        let flat = flatten_tree(&tree).unwrap();
        let err = flat.id_index(DuplicateIdPolicy::Reject).unwrap_err();
        assert_eq!(err, DiffError::duplicate_id(NodeId::Int(9), &["children".to_string(), "1".to_string()]));
    }
}
