//! TDIFF - Structural diff for id-keyed trees.
//!
//! This library compares two versions of a tree whose nodes carry stable
//! identifiers and classifies every node as added, deleted, updated,
//! unchanged, moved, or moved and updated. Sibling reorderings are reported
//! minimally: only the nodes outside a longest run of siblings that kept
//! their relative order are marked as moved.
//!
//! # Example
//!
//! ```
//! use tdiff_rs::{diff, ChangeKind, DiffOptions, Node, NodeId, Tree};
//! use serde_json::json;
//!
//! let old = Tree::Root(
//!     Node::new(1).with_children(vec![
//!         Node::new(2).with_value(json!({"name": "a"})),
//!         Node::new(3).with_value(json!({"name": "b"})),
//!     ]),
//! );
//! let new = Tree::Root(
//!     Node::new(1).with_children(vec![
//!         Node::new(2).with_value(json!({"name": "a"})),
//!         Node::new(3).with_value(json!({"name": "renamed"})),
//!         Node::new(4),
//!     ]),
//! );
//!
//! let result = diff(&old, &new, &DiffOptions::default()).unwrap();
//! let root = &result.tree().unwrap()[0];
//! assert_eq!(root.find(&NodeId::Int(3)).unwrap().change, ChangeKind::Updated);
//! assert_eq!(root.find(&NodeId::Int(4)).unwrap().change, ChangeKind::Added);
//! assert_eq!(result.stats().total_changes(), 2);
//! ```
//!
//! Reading trees from files:
//!
//! ```no_run
//! use tdiff_rs::{diff, format_result, parse_file, DiffOptions, OutputFormat, OutputOptions, TreeSchema};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = TreeSchema::default();
//! let old = parse_file(Path::new("old.json"), &schema)?;
//! let new = parse_file(Path::new("new.json"), &schema)?;
//!
//! let result = diff(&old, &new, &DiffOptions::default())?;
//! let output = format_result(&result, &OutputFormat::Terminal, &OutputOptions::default())?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod diff;
pub mod error;
pub mod expand;
pub mod flatten;
pub mod lis;
pub mod options;
pub mod output;
pub mod parser;
pub mod report;
pub mod tree;

// Re-export commonly used types for convenience
pub use diff::{compute_diff, ChangeKind, Diff, DiffRecord, DiffStats};
pub use error::{DiffError, OutputError, ParseError, TdiffError};
pub use expand::{expand_records, ChangeDetail, DiffTreeNode};
pub use flatten::{flatten_tree, FlatNode, FlatTree, NodeContext};
pub use options::{DiffOptions, DuplicateIdPolicy};
pub use output::{format_result, OutputFormat, OutputOptions};
pub use parser::{
    parse_content, parse_file, parse_json, parse_toml, parse_value, parse_yaml, FormatHint,
    TreeSchema,
};
pub use report::{build_result, DiffResult, FlatDiff, ResultMode};
pub use tree::{Node, NodeId, Tree};

/// Diffs two trees and shapes the outcome according to
/// [`DiffOptions::result_mode`].
///
/// # Errors
///
/// Fails only when an input is malformed: see [`compute_diff`].
pub fn diff(old: &Tree, new: &Tree, options: &DiffOptions) -> Result<DiffResult, DiffError> {
    let computed = compute_diff(old, new, options)?;
    Ok(build_result(&computed, options.result_mode))
}
