//! Projection of a computed [`Diff`] into the result shape the caller asked for.
//!
//! # Examples
//!
//! ```
//! use tdiff_rs::{compute_diff, report::build_result, DiffOptions, Node, ResultMode, Tree};
//!
//! let old = Tree::Root(Node::new("a").with_child(Node::new("b")));
//! let new = Tree::Root(Node::new("a"));
//! let diff = compute_diff(&old, &new, &DiffOptions::default()).unwrap();
//!
//! let flat = build_result(&diff, ResultMode::Flat);
//! assert_eq!(flat.flat().unwrap().deleted.len(), 1);
//!
//! let summary = build_result(&diff, ResultMode::Summary);
//! assert!(summary.has_changes());
//! ```

use crate::diff::{ChangeKind, Diff, DiffRecord, DiffStats};
use crate::expand::{expand_records, DiffTreeNode};
use serde::Serialize;

/// Which result shape [`diff`](crate::diff) produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// Nested diff tree(s)
    #[default]
    Tree,
    /// Per-kind record lists plus one list in emission order
    Flat,
    /// Nested diff tree(s) plus a did-anything-change flag
    Summary,
}

/// Records grouped by change kind.
///
/// Every node of a wholly added or deleted subtree has its own record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatDiff {
    pub added: Vec<DiffRecord>,
    pub deleted: Vec<DiffRecord>,
    pub updated: Vec<DiffRecord>,
    pub moved: Vec<DiffRecord>,
    pub moved_updated: Vec<DiffRecord>,
    pub unchanged: Vec<DiffRecord>,
    /// All records in emission order.
    pub list: Vec<DiffRecord>,
}

impl FlatDiff {
    pub fn of_kind(&self, change: ChangeKind) -> &[DiffRecord] {
        match change {
            ChangeKind::Added => &self.added,
            ChangeKind::Deleted => &self.deleted,
            ChangeKind::Updated => &self.updated,
            ChangeKind::Unchanged => &self.unchanged,
            ChangeKind::Moved => &self.moved,
            ChangeKind::MovedUpdated => &self.moved_updated,
        }
    }

    fn push(&mut self, record: &DiffRecord) {
        let bucket = match record.change {
            ChangeKind::Added => &mut self.added,
            ChangeKind::Deleted => &mut self.deleted,
            ChangeKind::Updated => &mut self.updated,
            ChangeKind::Unchanged => &mut self.unchanged,
            ChangeKind::Moved => &mut self.moved,
            ChangeKind::MovedUpdated => &mut self.moved_updated,
        };
        bucket.push(record.clone());
        self.list.push(record.clone());
    }
}

/// The value returned to callers. Fully owned and serializable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DiffResult {
    Tree {
        tree: Vec<DiffTreeNode>,
        stats: DiffStats,
    },
    Flat {
        flat: FlatDiff,
        stats: DiffStats,
    },
    Summary {
        tree: Vec<DiffTreeNode>,
        changed: bool,
        stats: DiffStats,
    },
}

impl DiffResult {
    pub fn stats(&self) -> &DiffStats {
        match self {
            DiffResult::Tree { stats, .. }
            | DiffResult::Flat { stats, .. }
            | DiffResult::Summary { stats, .. } => stats,
        }
    }

    /// The nested tree(s), in tree and summary modes.
    pub fn tree(&self) -> Option<&[DiffTreeNode]> {
        match self {
            DiffResult::Tree { tree, .. } | DiffResult::Summary { tree, .. } => Some(tree),
            DiffResult::Flat { .. } => None,
        }
    }

    /// The grouped records, in flat mode.
    pub fn flat(&self) -> Option<&FlatDiff> {
        match self {
            DiffResult::Flat { flat, .. } => Some(flat),
            _ => None,
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.stats().is_empty()
    }
}

/// Shapes a computed diff according to `mode`.
pub fn build_result(diff: &Diff, mode: ResultMode) -> DiffResult {
    let stats = diff.stats.clone();
    match mode {
        ResultMode::Tree => DiffResult::Tree {
            tree: expand_records(&diff.records),
            stats,
        },
        ResultMode::Flat => {
            let mut flat = FlatDiff::default();
            for record in &diff.records {
                flat.push(record);
            }
            DiffResult::Flat { flat, stats }
        }
        ResultMode::Summary => DiffResult::Summary {
            tree: expand_records(&diff.records),
            changed: !stats.is_empty(),
            stats,
        },
    }
}
