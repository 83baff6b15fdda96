use serde_json::json;
use tdiff_rs::{
    diff, format_result, DiffOptions, DiffResult, Node, OutputFormat, OutputOptions, ResultMode,
    Tree,
};

fn n(id: i64, value: i64) -> Node {
    Node::new(id).with_value(json!({ "value": value }))
}

fn add_and_rename(mode: ResultMode) -> DiffResult {
    let old = Tree::Forest(vec![n(1, 1).with_child(n(11, 11)), n(2, 2)]);
    let new = Tree::Forest(vec![n(1, 1).with_child(n(11, 11)), n(2, 22), n(3, 3)]);
    diff(&old, &new, &DiffOptions::default().with_result_mode(mode)).unwrap()
}

fn plain(result: &DiffResult, compact: bool) -> String {
    let options = OutputOptions {
        compact,
        ..OutputOptions::default()
    };
    format_result(result, &OutputFormat::Plain, &options).unwrap()
}

#[test]
fn test_format_plain_tree_compact() {
    let output = plain(&add_and_rename(ResultMode::Tree), true);
    assert_eq!(
        output,
        "   (forest)\n\
         ~    2: {\"value\":2} → {\"value\":22}\n\
         +    3: {\"value\":3}\n\
         \n\
         Summary: 1 added, 1 updated, 3 unchanged"
    );
}

#[test]
fn test_format_plain_tree_full() {
    let output = plain(&add_and_rename(ResultMode::Tree), false);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[1], "     1");
    assert_eq!(lines[2], "       11");
    assert_eq!(lines[5], "");
}

#[test]
fn test_format_summary_mode_matches_tree_mode() {
    assert_eq!(
        plain(&add_and_rename(ResultMode::Summary), true),
        plain(&add_and_rename(ResultMode::Tree), true)
    );
}

#[test]
fn test_format_plain_flat() {
    let old = Tree::Root(Node::new(1).with_child(Node::new(2).with_child(Node::new(3))));
    let new = Tree::Root(Node::new(1));
    let options = DiffOptions::default().with_result_mode(ResultMode::Flat);
    let result = diff(&old, &new, &options).unwrap();

    assert_eq!(
        plain(&result, true),
        "-  2 at children[0]: null\n\
         -  3 at children[0].children[0]: null\n\
         \n\
         Summary: 2 deleted, 1 unchanged"
    );
    assert!(plain(&result, false).starts_with("   1 at (root)\n"));
}

#[test]
fn test_format_moves() {
    let old = Tree::Forest(vec![Node::new(1), Node::new(2), Node::new(3)]);
    let new = Tree::Forest(vec![Node::new(3), Node::new(2), Node::new(1)]);
    let options = DiffOptions::default().with_result_mode(ResultMode::Flat);
    let result = diff(&old, &new, &options).unwrap();

    let output = plain(&result, true);
    assert!(output.contains(">  3 at children[0]: children[2] → children[0]"));
    assert!(output.contains(">  2 at children[1]: children[1] → children[1]"));
    assert!(output.ends_with("Summary: 2 moved, 2 unchanged"));
}

#[test]
fn test_format_moved_updated_marker() {
    let old = Tree::Forest(vec![n(1, 1), n(2, 2)]);
    let new = Tree::Forest(vec![n(2, 20), n(1, 1)]);
    let result = diff(&old, &new, &DiffOptions::default()).unwrap();

    let output = plain(&result, true);
    assert!(output.contains(">~   2: children[1] → children[0], {\"value\":2} → {\"value\":20}"));
}

#[test]
fn test_format_root_change_shows_both_branches() {
    let old = Tree::Root(Node::new("a"));
    let new = Tree::Root(Node::new("b"));
    let result = diff(&old, &new, &DiffOptions::default()).unwrap();

    assert_eq!(
        plain(&result, true),
        "+  b: null\n-  a: null\n\nSummary: 1 added, 1 deleted"
    );
}

#[test]
fn test_format_no_changes() {
    let tree = Tree::Root(Node::new(1).with_child(Node::new(2)));
    let result = diff(&tree, &tree, &DiffOptions::default()).unwrap();

    assert_eq!(plain(&result, true), "No changes detected.");
    assert!(plain(&result, false).ends_with("Summary: No changes"));
}

#[test]
fn test_format_value_truncation() {
    let old = Tree::Root(Node::new(1).with_value(json!("a".repeat(100))));
    let new = Tree::Root(Node::new(1).with_value(json!("b".repeat(100))));
    let result = diff(&old, &new, &DiffOptions::default()).unwrap();

    let options = OutputOptions {
        compact: true,
        max_value_length: 10,
    };
    let output = format_result(&result, &OutputFormat::Plain, &options).unwrap();
    assert!(output.starts_with("~  1: \"aaaaaa... → \"bbbbbb..."));
}

#[test]
fn test_format_terminal() {
    let output = format_result(
        &add_and_rename(ResultMode::Tree),
        &OutputFormat::Terminal,
        &OutputOptions::default(),
    )
    .unwrap();
    assert!(output.contains("(forest)"));
    assert!(output.contains("{\"value\":22}"));
    assert!(output.contains("Summary: 1 added, 1 updated, 3 unchanged"));
}

#[test]
fn test_format_json() {
    let output = format_result(
        &add_and_rename(ResultMode::Flat),
        &OutputFormat::Json,
        &OutputOptions::default(),
    )
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["mode"], json!("flat"));
    assert_eq!(value["stats"]["updated"], json!(1));
    assert_eq!(value["flat"]["updated"][0]["old"]["value"], json!({"value": 2}));
    assert_eq!(value["flat"]["added"][0]["new"]["context"]["index"], json!(2));
    assert_eq!(value["flat"]["list"].as_array().unwrap().len(), 5);
}

#[test]
fn test_format_json_tree() {
    let output = format_result(
        &add_and_rename(ResultMode::Summary),
        &OutputFormat::Json,
        &OutputOptions::default(),
    )
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["changed"], json!(true));
    let children = &value["tree"][0]["children"];
    assert_eq!(children[2]["id"], json!(3));
    assert_eq!(children[2]["change"], json!("added"));
    assert!(children[2]["detail"].get("old_value").is_none());
}
