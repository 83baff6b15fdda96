//! Configuration for the diff algorithm.
//!
//! Identity ("is this the same node across versions") and value equality
//! ("did its own content change") are separate predicates, both injectable.
//! A node key extractor goes with the identity predicate: sibling matching
//! finds candidates by key, then confirms them with the predicate.
//!
//! Caller-supplied closures run under `catch_unwind`. A panic is logged and
//! resolved toward reporting a change; the process panic hook still runs
//! first, so its message reaches stderr.

use crate::flatten::FlatNode;
use crate::report::ResultMode;
use crate::tree::NodeId;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A predicate over an old node and a new node.
pub type NodePredicate = dyn Fn(&FlatNode, &FlatNode) -> bool + Send + Sync;

/// Extracts the key a node is looked up by when matching siblings.
pub type NodeKey = dyn Fn(&FlatNode) -> NodeId + Send + Sync;

/// What to do when one tree contains the same id twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateIdPolicy {
    /// Keep going; id lookups resolve to the last occurrence in pre-order.
    #[default]
    LastWins,
    /// Fail with [`DiffError::DuplicateId`](crate::error::DiffError::DuplicateId).
    Reject,
}

/// Options for a single diff call.
#[derive(Clone)]
pub struct DiffOptions {
    identity: Arc<NodePredicate>,
    node_key: Arc<NodeKey>,
    value_equality: Arc<NodePredicate>,
    /// Shape of the result returned by [`diff`](crate::diff).
    pub result_mode: ResultMode,
    pub duplicate_ids: DuplicateIdPolicy,
}

/// Default identity: equal ids.
pub fn default_identity(old: &FlatNode, new: &FlatNode) -> bool {
    old.id == new.id
}

/// Default node key: the id.
pub fn default_node_key(node: &FlatNode) -> NodeId {
    node.id.clone()
}

/// Default value equality: deep equality of the node values (children are
/// never part of a value).
pub fn default_value_equality(old: &FlatNode, new: &FlatNode) -> bool {
    old.value == new.value
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            identity: Arc::new(default_identity),
            node_key: Arc::new(default_node_key),
            value_equality: Arc::new(default_value_equality),
            result_mode: ResultMode::default(),
            duplicate_ids: DuplicateIdPolicy::default(),
        }
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("result_mode", &self.result_mode)
            .field("duplicate_ids", &self.duplicate_ids)
            .finish_non_exhaustive()
    }
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default options whose value equality ignores the named top-level
    /// fields of object values (timestamps, revision counters and the like).
    pub fn ignoring_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: BTreeSet<String> = fields.into_iter().map(Into::into).collect();
        Self::default()
            .with_value_equality(move |old, new| equal_ignoring(&old.value, &new.value, &fields))
    }

    /// Replaces the identity predicate.
    ///
    /// Head and tail trimming compare siblings with the predicate alone; the
    /// middle section looks candidates up by [`with_node_key`](Self::with_node_key)
    /// first. A predicate that relates nodes with different ids needs a
    /// matching key extractor, or those pairs only match near the ends of a
    /// sibling list. A panicking predicate counts as "different nodes".
    pub fn with_identity<F>(mut self, identity: F) -> Self
    where
        F: Fn(&FlatNode, &FlatNode) -> bool + Send + Sync + 'static,
    {
        self.identity = Arc::new(identity);
        self
    }

    /// Replaces the key used to look up middle-section candidates. Nodes
    /// the identity predicate treats as the same should share a key. A
    /// panicking extractor falls back to the node id.
    pub fn with_node_key<F>(mut self, node_key: F) -> Self
    where
        F: Fn(&FlatNode) -> NodeId + Send + Sync + 'static,
    {
        self.node_key = Arc::new(node_key);
        self
    }

    /// Replaces the value equality. A panicking predicate counts as "values
    /// differ".
    pub fn with_value_equality<F>(mut self, value_equality: F) -> Self
    where
        F: Fn(&FlatNode, &FlatNode) -> bool + Send + Sync + 'static,
    {
        self.value_equality = Arc::new(value_equality);
        self
    }

    pub fn with_result_mode(mut self, result_mode: ResultMode) -> Self {
        self.result_mode = result_mode;
        self
    }

    pub fn with_duplicate_ids(mut self, policy: DuplicateIdPolicy) -> Self {
        self.duplicate_ids = policy;
        self
    }

    pub(crate) fn same_node(&self, old: &FlatNode, new: &FlatNode) -> bool {
        let predicate = &self.identity;
        match panic::catch_unwind(AssertUnwindSafe(|| predicate(old, new))) {
            Ok(same) => same,
            Err(_) => {
                tracing::warn!(old = %old.id, new = %new.id, "identity predicate panicked; treating nodes as different");
                false
            }
        }
    }

    pub(crate) fn node_key(&self, node: &FlatNode) -> NodeId {
        let extract = &self.node_key;
        match panic::catch_unwind(AssertUnwindSafe(|| extract(node))) {
            Ok(key) => key,
            Err(_) => {
                tracing::warn!(id = %node.id, "node key extractor panicked; using the id");
                node.id.clone()
            }
        }
    }

    pub(crate) fn same_value(&self, old: &FlatNode, new: &FlatNode) -> bool {
        let predicate = &self.value_equality;
        match panic::catch_unwind(AssertUnwindSafe(|| predicate(old, new))) {
            Ok(equal) => equal,
            Err(_) => {
                tracing::warn!(id = %new.id, "value equality predicate panicked; reporting an update");
                false
            }
        }
    }
}

fn equal_ignoring(old: &Value, new: &Value, fields: &BTreeSet<String>) -> bool {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            let kept = |map: &serde_json::Map<String, Value>| {
                map.keys().filter(|k| !fields.contains(*k)).count()
            };
            kept(a) == kept(b)
                && a
                    .iter()
                    .filter(|(k, _)| !fields.contains(*k))
                    .all(|(k, v)| b.get(k) == Some(v))
        }
        _ => old == new,
    }
}
