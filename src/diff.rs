//! Core structural diff algorithm.
//!
//! Both trees are flattened, then compared level by level: for each pair of
//! identity-matched parents, their child lists are matched by trimming the
//! common head and tail, then resolving the remaining middle section through
//! a key lookup (the node id unless [`DiffOptions::with_node_key`] says
//! otherwise). Matched siblings whose relative order changed are found with
//! a longest increasing subsequence, so only the minimal set of siblings is
//! reported as moved.
//!
//! Traversal runs on an explicit work stack, depth first and first sibling
//! first, so deep trees cannot exhaust the call stack.
//!
//! # Examples
//!
//! ```
//! use tdiff_rs::{compute_diff, ChangeKind, DiffOptions, Node, NodeId, Tree};
//! use serde_json::json;
//!
//! let old = Tree::Forest(vec![
//!     Node::new(1).with_value(json!({"v": 1})),
//!     Node::new(2).with_value(json!({"v": 2})),
//! ]);
//! let new = Tree::Forest(vec![
//!     Node::new(2).with_value(json!({"v": 2})),
//!     Node::new(1).with_value(json!({"v": 10})),
//! ]);
//!
//! let diff = compute_diff(&old, &new, &DiffOptions::default()).unwrap();
//!
//! // node 2 jumped ahead of node 1; node 1 kept its place but changed
//! assert_eq!(diff.stats.moved, 1);
//! assert_eq!(diff.stats.updated, 1);
//! assert!(diff.of_kind(ChangeKind::Moved).all(|r| r.id == NodeId::Int(2)));
//! ```

use crate::error::DiffError;
use crate::flatten::{flatten_tree, FlatNode, FlatTree};
use crate::lis::longest_increasing_subsequence;
use crate::options::DiffOptions;
use crate::tree::{NodeId, Tree};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// How a node changed between the two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Only in the new tree
    Added,
    /// Only in the old tree
    Deleted,
    /// Same position, different value
    Updated,
    /// Same position, same value
    Unchanged,
    /// Different position, same value
    Moved,
    /// Different position and different value
    #[serde(rename = "moved+updated")]
    MovedUpdated,
}

impl ChangeKind {
    /// Classifies a matched pair.
    pub fn classify(moved: bool, updated: bool) -> Self {
        match (moved, updated) {
            (true, true) => ChangeKind::MovedUpdated,
            (true, false) => ChangeKind::Moved,
            (false, true) => ChangeKind::Updated,
            (false, false) => ChangeKind::Unchanged,
        }
    }

    pub fn is_moved(self) -> bool {
        matches!(self, ChangeKind::Moved | ChangeKind::MovedUpdated)
    }

    pub fn is_updated(self) -> bool {
        matches!(self, ChangeKind::Updated | ChangeKind::MovedUpdated)
    }

    /// Everything except [`ChangeKind::Unchanged`].
    pub fn is_change(self) -> bool {
        self != ChangeKind::Unchanged
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Updated => "updated",
            ChangeKind::Unchanged => "unchanged",
            ChangeKind::Moved => "moved",
            ChangeKind::MovedUpdated => "moved+updated",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classification of one node.
///
/// `old` is absent for [`ChangeKind::Added`], `new` is absent for
/// [`ChangeKind::Deleted`]; both are present for every other kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRecord {
    pub id: NodeId,
    pub change: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<FlatNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<FlatNode>,
    #[serde(skip)]
    parent: Option<usize>,
}

impl DiffRecord {
    /// Position in [`Diff::records`] of the record this one nests under.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Sibling index used to order this record among its siblings.
    pub(crate) fn sort_index(&self) -> usize {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .and_then(|node| node.context.index)
            .unwrap_or(0)
    }
}

/// Statistics about the diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub deleted: usize,
    pub updated: usize,
    pub moved: usize,
    pub moved_updated: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, change: ChangeKind) {
        match change {
            ChangeKind::Added => self.added += 1,
            ChangeKind::Deleted => self.deleted += 1,
            ChangeKind::Updated => self.updated += 1,
            ChangeKind::Unchanged => self.unchanged += 1,
            ChangeKind::Moved => self.moved += 1,
            ChangeKind::MovedUpdated => self.moved_updated += 1,
        }
    }

    /// Returns the total number of changes (excluding unchanged).
    pub fn total_changes(&self) -> usize {
        self.added + self.deleted + self.updated + self.moved + self.moved_updated
    }

    /// Returns true if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

/// The complete diff: one record per node, in emission order.
///
/// Parents are always emitted before their children. The first record is
/// the root of the live tree; when the old root vanished entirely, a second
/// root record opens the ghost branch of deleted old nodes.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    pub records: Vec<DiffRecord>,
    pub stats: DiffStats,
}

impl Diff {
    /// Returns true if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Positions of the top-level records (one, or two with a ghost branch).
    pub fn roots(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.parent.is_none())
            .map(|(position, _)| position)
            .collect()
    }

    pub fn of_kind(&self, change: ChangeKind) -> impl Iterator<Item = &DiffRecord> {
        self.records.iter().filter(move |record| record.change == change)
    }
}

/// Computes the structural diff between two trees.
///
/// Neither input is modified. See the module documentation for the
/// algorithm.
///
/// # Errors
///
/// - [`DiffError::InvalidTree`] when a node carries the reserved empty id
/// - [`DiffError::DuplicateId`] when an id repeats within one tree and the
///   options ask for [`DuplicateIdPolicy::Reject`](crate::DuplicateIdPolicy::Reject)
pub fn compute_diff(old: &Tree, new: &Tree, options: &DiffOptions) -> Result<Diff, DiffError> {
    let old_flat = flatten_tree(old)?;
    let new_flat = flatten_tree(new)?;
    let old_ids = old_flat.id_index(options.duplicate_ids)?;
    let new_ids = new_flat.id_index(options.duplicate_ids)?;

    let mut engine = DiffEngine::new(&old_flat, &new_flat, options);
    let old_root = old_flat.root();
    let new_root = new_flat.root();

    if old_root.id == new_root.id {
        let change = ChangeKind::classify(false, !options.same_value(old_root, new_root));
        engine.stack.push(Task::Pair {
            old: 0,
            new: 0,
            change,
            parent: None,
        });
        engine.run();
    } else {
        let new_root_origin = old_ids.get(&new_root.id).copied();
        let old_root_target = new_ids.get(&old_root.id).copied();
        tracing::debug!(
            old_root = %old_root.id,
            new_root = %new_root.id,
            new_root_existed = new_root_origin.is_some(),
            old_root_survives = old_root_target.is_some(),
            "root identity changed"
        );

        if let Some(origin) = new_root_origin {
            engine.anchor(origin, 0);
        }
        if let Some(target) = old_root_target {
            engine.anchor(0, target);
        }

        engine.stack.push(Task::Added { new: 0, parent: None });
        engine.run();

        if old_root_target.is_none() {
            engine.stack.push(Task::Deleted { old: 0, parent: None });
            engine.run();
        }
    }

    let records = engine.records;
    let mut stats = DiffStats::new();
    for record in &records {
        stats.record(record.change);
    }

    Ok(Diff { records, stats })
}

/// Pending work. Positions refer to pre-order positions in the flat trees;
/// `parent` is the position of the enclosing record.
enum Task {
    /// Match the children of two matched parents.
    Level {
        old_parent: usize,
        new_parent: usize,
        parent: usize,
    },
    /// Emit a matched pair, then match its children.
    Pair {
        old: usize,
        new: usize,
        change: ChangeKind,
        parent: Option<usize>,
    },
    /// Emit a new-only subtree.
    Added { new: usize, parent: Option<usize> },
    /// Emit an old-only subtree.
    Deleted { old: usize, parent: Option<usize> },
}

struct DiffEngine<'a> {
    old: &'a FlatTree,
    new: &'a FlatTree,
    options: &'a DiffOptions,
    /// Root-displacement pairs, keyed from both sides.
    anchored_old: HashMap<usize, usize>,
    anchored_new: HashMap<usize, usize>,
    stack: Vec<Task>,
    records: Vec<DiffRecord>,
}

impl<'a> DiffEngine<'a> {
    fn new(old: &'a FlatTree, new: &'a FlatTree, options: &'a DiffOptions) -> Self {
        Self {
            old,
            new,
            options,
            anchored_old: HashMap::new(),
            anchored_new: HashMap::new(),
            stack: Vec::new(),
            records: Vec::with_capacity(old.len().max(new.len())),
        }
    }

    /// Pairs an old node with a new node outside of level matching. Used
    /// when a root changes identity but its id survives elsewhere.
    fn anchor(&mut self, old: usize, new: usize) {
        self.anchored_old.insert(old, new);
        self.anchored_new.insert(new, old);
    }

    fn run(&mut self) {
        while let Some(task) = self.stack.pop() {
            match task {
                Task::Level {
                    old_parent,
                    new_parent,
                    parent,
                } => self.diff_level(old_parent, new_parent, parent),
                Task::Pair {
                    old,
                    new,
                    change,
                    parent,
                } => {
                    let position = self.emit(change, Some(old), Some(new), parent);
                    self.stack.push(Task::Level {
                        old_parent: old,
                        new_parent: new,
                        parent: position,
                    });
                }
                Task::Added { new, parent } => match self.anchored_new.get(&new).copied() {
                    Some(old) => {
                        let change = self.classify(old, new, true);
                        self.stack.push(Task::Pair {
                            old,
                            new,
                            change,
                            parent,
                        });
                    }
                    None => {
                        let position = self.emit(ChangeKind::Added, None, Some(new), parent);
                        let new_tree = self.new;
                        for &child in new_tree.children_of(new).iter().rev() {
                            self.stack.push(Task::Added {
                                new: child,
                                parent: Some(position),
                            });
                        }
                    }
                },
                Task::Deleted { old, parent } => {
                    // reported through its anchored pair instead
                    if self.anchored_old.contains_key(&old) {
                        continue;
                    }
                    let position = self.emit(ChangeKind::Deleted, Some(old), None, parent);
                    let old_tree = self.old;
                    for &child in old_tree.children_of(old).iter().rev() {
                        self.stack.push(Task::Deleted {
                            old: child,
                            parent: Some(position),
                        });
                    }
                }
            }
        }
    }

    /// Matches two ordered sibling lists and schedules the resulting work in
    /// emission order.
    fn diff_level(&mut self, old_parent: usize, new_parent: usize, parent: usize) {
        let old_tree = self.old;
        let new_tree = self.new;
        let old_siblings = old_tree.children_of(old_parent);
        let new_siblings = new_tree.children_of(new_parent);

        let mut tasks = Vec::with_capacity(old_siblings.len().max(new_siblings.len()));

        // 1. common head
        let mut start = 0;
        while start < old_siblings.len()
            && start < new_siblings.len()
            && self.same_node(old_siblings[start], new_siblings[start])
        {
            tasks.push(self.pair(old_siblings[start], new_siblings[start], false, parent));
            start += 1;
        }

        // 2. common tail (exclusive ends)
        let mut old_end = old_siblings.len();
        let mut new_end = new_siblings.len();
        let mut tail = Vec::new();
        while old_end > start
            && new_end > start
            && self.same_node(old_siblings[old_end - 1], new_siblings[new_end - 1])
        {
            tail.push(self.pair(old_siblings[old_end - 1], new_siblings[new_end - 1], false, parent));
            old_end -= 1;
            new_end -= 1;
        }
        tail.reverse();

        let old_rest = &old_siblings[start..old_end];
        let new_rest = &new_siblings[start..new_end];

        if old_rest.is_empty() {
            // 3. only additions left
            tasks.extend(new_rest.iter().map(|&new| Task::Added {
                new,
                parent: Some(parent),
            }));
        } else if new_rest.is_empty() {
            // 4. only deletions left
            tasks.extend(old_rest.iter().map(|&old| Task::Deleted {
                old,
                parent: Some(parent),
            }));
        } else {
            // 5. mixed middle section
            self.diff_middle(old_rest, new_rest, parent, &mut tasks);
        }

        tracing::debug!(
            parent = %new_tree.get(new_parent).id,
            head = start,
            tail = tail.len(),
            old_middle = old_rest.len(),
            new_middle = new_rest.len(),
            "matched sibling level"
        );

        tasks.extend(tail);
        self.stack.extend(tasks.into_iter().rev());
    }

    fn diff_middle(
        &self,
        old_rest: &[usize],
        new_rest: &[usize],
        parent: usize,
        tasks: &mut Vec<Task>,
    ) {
        let new_tree = self.new;
        let key_to_slot: HashMap<NodeId, usize> = new_rest
            .iter()
            .enumerate()
            .map(|(slot, &new)| (self.options.node_key(new_tree.get(new)), slot))
            .collect();

        // old position within `old_rest` + 1 for each new slot; 0 = unmatched
        let mut slot_to_old = vec![0usize; new_rest.len()];
        let mut matched = 0;
        let mut max_slot_seen = 0;
        let mut moved = false;

        for (offset, &old) in old_rest.iter().enumerate() {
            if matched == new_rest.len() {
                tasks.push(Task::Deleted {
                    old,
                    parent: Some(parent),
                });
                continue;
            }

            let slot = key_to_slot
                .get(&self.options.node_key(self.old.get(old)))
                .copied()
                .filter(|&slot| slot_to_old[slot] == 0 && self.same_node(old, new_rest[slot]));

            match slot {
                None => tasks.push(Task::Deleted {
                    old,
                    parent: Some(parent),
                }),
                Some(slot) => {
                    slot_to_old[slot] = offset + 1;
                    if slot >= max_slot_seen {
                        max_slot_seen = slot;
                    } else {
                        moved = true;
                    }
                    matched += 1;
                }
            }
        }

        // 6. move resolution
        let mut stationary = vec![!moved; new_rest.len()];
        if moved {
            let lis = longest_increasing_subsequence(&slot_to_old);
            for slot in &lis {
                stationary[*slot] = true;
            }
            tracing::debug!(matched, kept = lis.len(), "resolved sibling moves");
        }

        for (slot, &new) in new_rest.iter().enumerate() {
            match slot_to_old[slot] {
                0 => tasks.push(Task::Added {
                    new,
                    parent: Some(parent),
                }),
                offset => {
                    let old = old_rest[offset - 1];
                    tasks.push(self.pair(old, new, !stationary[slot], parent));
                }
            }
        }
    }

    fn pair(&self, old: usize, new: usize, moved: bool, parent: usize) -> Task {
        Task::Pair {
            old,
            new,
            change: self.classify(old, new, moved),
            parent: Some(parent),
        }
    }

    fn classify(&self, old: usize, new: usize, moved: bool) -> ChangeKind {
        let updated = !self.options.same_value(self.old.get(old), self.new.get(new));
        ChangeKind::classify(moved, updated)
    }

    fn same_node(&self, old: usize, new: usize) -> bool {
        self.options.same_node(self.old.get(old), self.new.get(new))
    }

    fn emit(
        &mut self,
        change: ChangeKind,
        old: Option<usize>,
        new: Option<usize>,
        parent: Option<usize>,
    ) -> usize {
        let old = old.map(|position| self.old.get(position).clone());
        let new = new.map(|position| self.new.get(position).clone());
        let id = match (&new, &old) {
            (Some(node), _) | (None, Some(node)) => node.id.clone(),
            (None, None) => NodeId::forest_root(),
        };

        self.records.push(DiffRecord {
            id,
            change,
            old,
            new,
            parent,
        });
        self.records.len() - 1
    }
}
