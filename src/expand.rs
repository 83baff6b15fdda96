//! Reassembles flat diff records into a nested diff tree.
//!
//! Every record knows the record it nests under, and the engine emits
//! parents before children, so the tree is built bottom-up in a single
//! reverse pass over the records. Siblings are ordered by their new index
//! when they exist in the new tree, otherwise by their old index.

use crate::diff::{ChangeKind, DiffRecord};
use crate::tree::NodeId;
use serde::Serialize;
use serde_json::Value;

/// Old and new sides of a node, whichever exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<Vec<String>>,
}

/// A node of the nested diff tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffTreeNode {
    pub id: NodeId,
    pub change: ChangeKind,
    pub detail: ChangeDetail,
    pub children: Vec<DiffTreeNode>,
}

impl DiffTreeNode {
    fn from_record(record: &DiffRecord, children: Vec<DiffTreeNode>) -> Self {
        let detail = ChangeDetail {
            old_value: record.old.as_ref().map(|node| node.value.clone()),
            old_path: record.old.as_ref().map(|node| node.context.path.clone()),
            new_value: record.new.as_ref().map(|node| node.value.clone()),
            new_path: record.new.as_ref().map(|node| node.context.path.clone()),
        };
        Self {
            id: record.id.clone(),
            change: record.change,
            detail,
            children,
        }
    }

    /// Pre-order iterator over this node and all its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &DiffTreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Whether this node or any descendant changed.
    pub fn has_changes(&self) -> bool {
        self.iter().any(|node| node.change.is_change())
    }

    /// First node with the given id, in pre-order.
    pub fn find(&self, id: &NodeId) -> Option<&DiffTreeNode> {
        self.iter().find(|node| &node.id == id)
    }
}

/// Builds the nested diff tree(s) from records in emission order.
///
/// Returns one tree per top-level record: normally one, two when the old
/// root was deleted and a ghost branch exists. Each record is attached
/// exactly once.
pub fn expand_records(records: &[DiffRecord]) -> Vec<DiffTreeNode> {
    let mut pending: Vec<Vec<(usize, DiffTreeNode)>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();

    for position in (0..records.len()).rev() {
        let record = &records[position];

        let mut children = std::mem::take(&mut pending[position]);
        children.reverse();
        children.sort_by_key(|(index, _)| *index);
        let children = children.into_iter().map(|(_, node)| node).collect();

        let node = DiffTreeNode::from_record(record, children);
        match record.parent() {
            Some(parent) => {
                debug_assert!(parent < position, "parent emitted after child");
                pending[parent].push((record.sort_index(), node));
            }
            None => roots.push(node),
        }
    }

    roots.reverse();
    roots
}
