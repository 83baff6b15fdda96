//! Output formatting for diff results.
//!
//! This module renders a [`DiffResult`] as colored terminal text, plain text
//! or JSON. Tree and summary results render as an indented tree, flat results
//! as one line per record in emission order. Text output ends with a
//! `Summary:` line.
//!
//! Markers: `+` added, `-` deleted, `~` updated, `>` moved, `>~` moved and
//! updated, blank for unchanged.
//!
//! # Examples
//!
//! ```
//! use tdiff_rs::{diff, format_result, DiffOptions, Node, OutputFormat, OutputOptions, Tree};
//! use serde_json::json;
//!
//! let old = Tree::Root(Node::new(1).with_value(json!({"v": 1})));
//! let new = Tree::Root(Node::new(1).with_value(json!({"v": 2})));
//! let result = diff(&old, &new, &DiffOptions::default()).unwrap();
//!
//! let output = format_result(&result, &OutputFormat::Plain, &OutputOptions::default()).unwrap();
//! assert!(output.starts_with("~  1: {\"v\":1} → {\"v\":2}"));
//! assert!(output.ends_with("Summary: 1 updated"));
//! ```

use crate::diff::{ChangeKind, DiffRecord, DiffStats};
use crate::error::{display_path, OutputError};
use crate::expand::DiffTreeNode;
use crate::report::{DiffResult, FlatDiff};
use crate::tree::NodeId;
use colored::*;
use serde_json::Value;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored terminal output with ANSI escape codes
    Terminal,
    /// JSON representation of the result
    Json,
    /// Plain text, no colors (suitable for piping)
    Plain,
}

/// Options for controlling output formatting.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Hide unchanged subtrees (tree output) or unchanged records (flat output)
    pub compact: bool,
    /// Maximum length for displayed values (truncate if longer)
    pub max_value_length: usize,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            compact: true,
            max_value_length: 80,
        }
    }
}

/// Formats a diff result according to the specified format and options.
///
/// # Arguments
///
/// * `result` - The result to format
/// * `format` - The output format (Terminal, JSON, or Plain)
/// * `options` - Formatting options
///
/// # Returns
///
/// Returns the formatted string on success, or an OutputError on failure.
pub fn format_result(
    result: &DiffResult,
    format: &OutputFormat,
    options: &OutputOptions,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Terminal => Ok(format_text(result, options, true)),
        OutputFormat::Json => format_json(result),
        OutputFormat::Plain => Ok(format_text(result, options, false)),
    }
}

/// Serializes the whole result, stats included.
fn format_json(result: &DiffResult) -> Result<String, OutputError> {
    serde_json::to_string_pretty(result)
        .map_err(|e| OutputError::JsonSerializationError { source: e })
}

fn format_text(result: &DiffResult, options: &OutputOptions, color: bool) -> String {
    let lines = match result {
        DiffResult::Tree { tree, .. } | DiffResult::Summary { tree, .. } => {
            tree_lines(tree, options, color)
        }
        DiffResult::Flat { flat, .. } => flat_lines(flat, options, color),
    };

    if lines.is_empty() {
        let message = "No changes detected.";
        return if color {
            message.dimmed().to_string()
        } else {
            message.to_string()
        };
    }

    let mut output = lines.join("\n");
    output.push_str("\n\n");
    output.push_str(&format_summary(result.stats()));
    output
}

/// Renders diff trees depth first, two spaces of indent per level.
fn tree_lines(roots: &[DiffTreeNode], options: &OutputOptions, color: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let shown = |node: &DiffTreeNode| !options.compact || node.has_changes();

    for root in roots.iter().filter(|root| shown(root)) {
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let sides = Sides {
                old_value: node.detail.old_value.as_ref(),
                old_path: node.detail.old_path.as_deref(),
                new_value: node.detail.new_value.as_ref(),
                new_path: node.detail.new_path.as_deref(),
            };
            let text = format!("{}{}", "  ".repeat(depth), label(&node.id));
            lines.push(format_line(node.change, text, &sides, options, color));

            for child in node.children.iter().rev().filter(|child| shown(child)) {
                stack.push((child, depth + 1));
            }
        }
    }
    lines
}

/// Renders one line per record with the record's location.
fn flat_lines(flat: &FlatDiff, options: &OutputOptions, color: bool) -> Vec<String> {
    flat.list
        .iter()
        .filter(|record| !options.compact || record.change.is_change())
        .map(|record| {
            let sides = Sides::of_record(record);
            let location = sides.new_path.or(sides.old_path).unwrap_or(&[]);
            let text = format!("{} at {}", label(&record.id), display_path(location));
            format_line(record.change, text, &sides, options, color)
        })
        .collect()
}

/// Both sides of a node as borrowed from either a tree node or a record.
struct Sides<'a> {
    old_value: Option<&'a Value>,
    old_path: Option<&'a [String]>,
    new_value: Option<&'a Value>,
    new_path: Option<&'a [String]>,
}

impl<'a> Sides<'a> {
    fn of_record(record: &'a DiffRecord) -> Self {
        Self {
            old_value: record.old.as_ref().map(|node| &node.value),
            old_path: record.old.as_ref().map(|node| node.context.path.as_slice()),
            new_value: record.new.as_ref().map(|node| &node.value),
            new_path: record.new.as_ref().map(|node| node.context.path.as_slice()),
        }
    }
}

fn format_line(
    change: ChangeKind,
    text: String,
    sides: &Sides<'_>,
    options: &OutputOptions,
    color: bool,
) -> String {
    let detail = describe(change, sides, options.max_value_length);
    let text = if detail.is_empty() {
        text
    } else {
        format!("{}: {}", text, detail)
    };

    if !color {
        return format!("{} {}", marker(change), text);
    }
    match change {
        ChangeKind::Added => format!("{} {}", marker(change).bright_green(), text.green()),
        ChangeKind::Deleted => format!("{} {}", marker(change).bright_red(), text.red()),
        ChangeKind::Updated => format!("{} {}", marker(change).bright_yellow(), text.yellow()),
        ChangeKind::Moved => format!("{} {}", marker(change).bright_cyan(), text.cyan()),
        ChangeKind::MovedUpdated => {
            format!("{} {}", marker(change).bright_magenta(), text.magenta())
        }
        ChangeKind::Unchanged => format!("{} {}", marker(change), text.dimmed()),
    }
}

/// Two-column marker for a change kind.
fn marker(change: ChangeKind) -> &'static str {
    match change {
        ChangeKind::Added => "+ ",
        ChangeKind::Deleted => "- ",
        ChangeKind::Updated => "~ ",
        ChangeKind::Moved => "> ",
        ChangeKind::MovedUpdated => ">~",
        ChangeKind::Unchanged => "  ",
    }
}

fn describe(change: ChangeKind, sides: &Sides<'_>, max_length: usize) -> String {
    let old_value = || format_value(sides.old_value, max_length);
    let new_value = || format_value(sides.new_value, max_length);
    let paths = || {
        format!(
            "{} → {}",
            display_path(sides.old_path.unwrap_or(&[])),
            display_path(sides.new_path.unwrap_or(&[]))
        )
    };

    match change {
        ChangeKind::Added => new_value(),
        ChangeKind::Deleted => old_value(),
        ChangeKind::Updated => format!("{} → {}", old_value(), new_value()),
        ChangeKind::Moved => paths(),
        ChangeKind::MovedUpdated => format!("{}, {} → {}", paths(), old_value(), new_value()),
        ChangeKind::Unchanged => String::new(),
    }
}

fn label(id: &NodeId) -> String {
    if id.is_forest_root() {
        "(forest)".to_string()
    } else {
        id.to_string()
    }
}

/// Compact JSON preview of a value, truncated to `max_length` characters.
fn format_value(value: Option<&Value>, max_length: usize) -> String {
    let preview = match value {
        Some(value) => value.to_string(),
        None => return String::new(),
    };

    if preview.chars().count() > max_length {
        let kept: String = preview.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        preview
    }
}

/// Formats summary statistics.
fn format_summary(stats: &DiffStats) -> String {
    if stats.is_empty() {
        return "Summary: No changes".to_string();
    }

    let counts = [
        (stats.added, "added"),
        (stats.deleted, "deleted"),
        (stats.updated, "updated"),
        (stats.moved, "moved"),
        (stats.moved_updated, "moved+updated"),
        (stats.unchanged, "unchanged"),
    ];
    let parts: Vec<String> = counts
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, name)| format!("{} {}", count, name))
        .collect();

    format!("Summary: {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value_truncates() {
        let value = json!("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(format_value(Some(&value), 10), "\"abcdef...");
        assert_eq!(format_value(Some(&json!(42)), 10), "42");
        assert_eq!(format_value(None, 10), "");
    }

    #[test]
    fn test_format_value_multibyte() {
        let value = json!("ééééééééééé");
        let preview = format_value(Some(&value), 6);
        assert_eq!(preview, "\"éé...");
    }

    #[test]
    fn test_markers() {
        assert_eq!(marker(ChangeKind::MovedUpdated), ">~");
        assert_eq!(marker(ChangeKind::Unchanged).trim(), "");
    }

    #[test]
    fn test_label() {
        assert_eq!(label(&NodeId::forest_root()), "(forest)");
        assert_eq!(label(&NodeId::Int(3)), "3");
    }

    #[test]
    fn test_describe_moved_updated() {
        let old_path = vec!["children".to_string(), "0".to_string()];
        let new_path = vec!["children".to_string(), "2".to_string()];
        let (old_value, new_value) = (json!(1), json!(2));
        let sides = Sides {
            old_value: Some(&old_value),
            old_path: Some(old_path.as_slice()),
            new_value: Some(&new_value),
            new_path: Some(new_path.as_slice()),
        };
        assert_eq!(
            describe(ChangeKind::MovedUpdated, &sides, 80),
            "children[0] → children[2], 1 → 2"
        );
        assert_eq!(describe(ChangeKind::Moved, &sides, 80), "children[0] → children[2]");
        assert_eq!(describe(ChangeKind::Unchanged, &sides, 80), "");
    }

    #[test]
    fn test_format_summary() {
        let mut stats = DiffStats::new();
        assert_eq!(format_summary(&stats), "Summary: No changes");

        stats.record(ChangeKind::Added);
        stats.record(ChangeKind::MovedUpdated);
        stats.record(ChangeKind::Unchanged);
        stats.record(ChangeKind::Unchanged);
        assert_eq!(
            format_summary(&stats),
            "Summary: 1 added, 1 moved+updated, 2 unchanged"
        );
    }
}
