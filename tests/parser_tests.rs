use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;
use tdiff_rs::{
    compute_diff, parse_content, parse_file, parse_value, DiffError, DiffOptions, FormatHint,
    Node, NodeId, ParseError, Tree, TreeSchema,
};
use tempfile::NamedTempFile;

fn fixture(name: &str) -> Tree {
    parse_file(&Path::new("tests/fixtures").join(name), &TreeSchema::default()).unwrap()
}

#[test]
fn test_parse_json_fixture() {
    let tree = fixture("menu_old.json");
    assert_eq!(tree.node_count(), 6);

    match tree {
        Tree::Root(root) => {
            assert_eq!(root.id, NodeId::from("menu"));
            assert_eq!(root.value, json!({"title": "Main"}));
            let save = &root.children[0].children[1];
            assert_eq!(save.value, json!({"label": "Save", "updated_at": "2024-01-01"}));
        }
        Tree::Forest(_) => panic!("Expected root"),
    }
}

#[test]
fn test_yaml_fixture_matches_json_fixture() {
    let json_tree = fixture("menu_old.json");
    let yaml_tree = fixture("menu_same.yaml");
    assert_eq!(json_tree, yaml_tree);

    let diff = compute_diff(&json_tree, &yaml_tree, &DiffOptions::default()).unwrap();
    assert!(diff.is_empty());
}

#[test]
fn test_parse_toml_fixture_as_forest() {
    match fixture("forest_old.toml") {
        Tree::Forest(nodes) => {
            assert_eq!(nodes.len(), 2);
            assert_eq!(nodes[1].id, NodeId::Int(2));
            assert_eq!(nodes[1].children[0].id, NodeId::Int(21));
            assert_eq!(nodes[1].children[0].value, json!({"name": "beta-one"}));
        }
        Tree::Root(_) => panic!("Expected forest"),
    }
}

#[test]
fn test_parse_custom_schema() {
    let schema = TreeSchema::new("key", "items");
    let tree = parse_file(Path::new("tests/fixtures/keyed_old.json"), &schema).unwrap();
    assert_eq!(tree.node_count(), 3);

    let err = parse_file(Path::new("tests/fixtures/keyed_old.json"), &TreeSchema::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ParseError::Tree {
            source: DiffError::InvalidTree { .. },
            ..
        }
    ));
}

#[test]
fn test_parse_invalid_tree_reports_path() {
    let err = parse_file(Path::new("tests/fixtures/invalid_tree.json"), &TreeSchema::default())
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("invalid_tree.json is not a valid tree"));
    assert!(message.contains("children[1]: missing id field 'id'"));
}

#[test]
fn test_parse_garbage_is_unknown_format() {
    let err = parse_file(Path::new("tests/fixtures/garbage.txt"), &TreeSchema::default())
        .unwrap_err();
    assert!(matches!(err, ParseError::UnknownFormat { .. }));
}

#[test]
fn test_parse_wrong_extension_reports_format_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id: 1").unwrap();
    let path = file.path().with_extension("json");
    fs::copy(file.path(), &path).unwrap();

    let err = parse_file(&path, &TreeSchema::default()).unwrap_err();
    assert!(matches!(err, ParseError::JsonError { .. }));

    fs::remove_file(&path).unwrap();
}

#[test]
fn test_parse_file_not_found() {
    let result = parse_file(Path::new("/nonexistent/file.json"), &TreeSchema::default());
    assert!(matches!(result, Err(ParseError::FileNotFound { .. })));
}

#[test]
fn test_parse_content_auto() {
    let schema = TreeSchema::default();
    let json = parse_content(r#"{"id": 1}"#, FormatHint::Auto, &schema, "inline").unwrap();
    let toml = parse_content("id = 1", FormatHint::Auto, &schema, "inline").unwrap();
    let yaml = parse_content("id: 1", FormatHint::Auto, &schema, "inline").unwrap();

    assert_eq!(json, toml);
    assert_eq!(toml, yaml);
    assert_eq!(json, Tree::Root(Node::new(1).with_value(json!({}))));
}

#[test]
fn test_parse_value_object_with_only_children_is_forest() {
    let value = json!({"children": [{"id": "a"}, {"id": "b"}]});
    let tree = parse_value(value, &TreeSchema::default()).unwrap();
    assert!(tree.is_forest());
    assert_eq!(tree.node_count(), 2);
}

#[test]
fn test_parse_value_keeps_string_and_integer_ids_apart() {
    let value = json!([{"id": 1}, {"id": "1"}]);
    match parse_value(value, &TreeSchema::default()).unwrap() {
        Tree::Forest(nodes) => assert_ne!(nodes[0].id, nodes[1].id),
        Tree::Root(_) => panic!("Expected forest"),
    }
}
