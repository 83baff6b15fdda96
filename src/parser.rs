//! Reading trees from JSON, YAML and TOML documents.
//!
//! A document describes one node per object. The node id and child list live
//! under configurable keys (see [`TreeSchema`]); every other key becomes part
//! of the node's value. A top-level array, or a top-level object holding
//! nothing but the children key, is read as a forest.
//!
//! Format detection uses the file extension (.json, .yaml, .yml, .toml). If
//! the extension is unknown or missing, JSON is tried first, then TOML, then
//! YAML.
//!
//! # Examples
//!
//! ```no_run
//! use tdiff_rs::parser::{parse_file, TreeSchema};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Parse a JSON file
//! let tree = parse_file(Path::new("menu.json"), &TreeSchema::default())?;
//!
//! // Parse a YAML file whose nodes use "key" and "items"
//! let schema = TreeSchema::new("key", "items");
//! let tree = parse_file(Path::new("menu.yaml"), &schema)?;
//! # Ok(())
//! # }
//! ```

use crate::error::{DiffError, ParseError};
use crate::tree::{Node, NodeId, Tree};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Names of the keys holding a node's id and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSchema {
    pub id_field: String,
    pub children_field: String,
}

impl Default for TreeSchema {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            children_field: "children".to_string(),
        }
    }
}

impl TreeSchema {
    pub fn new(id_field: impl Into<String>, children_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            children_field: children_field.into(),
        }
    }
}

/// Document format of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
    Json,
    Yaml,
    Toml,
    /// Try JSON, then TOML, then YAML
    #[default]
    Auto,
}

impl FormatHint {
    /// Detects the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("json") => FormatHint::Json,
            Some("yaml") | Some("yml") => FormatHint::Yaml,
            Some("toml") => FormatHint::Toml,
            _ => FormatHint::Auto,
        }
    }
}

/// Parses a file into a [`Tree`].
///
/// # Arguments
///
/// * `path` - Path to the file to parse
/// * `schema` - Keys holding node ids and children
///
/// # Errors
///
/// This function will return an error if:
/// - The file does not exist (`ParseError::FileNotFound`)
/// - The file cannot be read (`ParseError::ReadError`)
/// - The file is not valid JSON, YAML or TOML (`ParseError::JsonError`,
///   `ParseError::YamlError`, `ParseError::TomlError`, `ParseError::UnknownFormat`)
/// - The document is not a tree (`ParseError::Tree`)
pub fn parse_file(path: &Path, schema: &TreeSchema) -> Result<Tree, ParseError> {
    let label = path.to_string_lossy().to_string();
    if !path.exists() {
        return Err(ParseError::file_not_found(label));
    }

    let content = fs::read_to_string(path).map_err(|e| ParseError::read_error(label.clone(), e))?;
    let tree = parse_content(&content, FormatHint::from_path(path), schema, &label)?;
    tracing::debug!(path = %label, nodes = tree.node_count(), "parsed tree");
    Ok(tree)
}

/// Parses standard input into a [`Tree`].
pub fn parse_stdin(hint: FormatHint, schema: &TreeSchema) -> Result<Tree, ParseError> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| ParseError::read_error("<stdin>", e))?;
    parse_content(&content, hint, schema, "<stdin>")
}

/// Parses document text into a [`Tree`].
///
/// `source` names the content in error messages.
///
/// # Examples
///
/// ```
/// use tdiff_rs::parser::{parse_content, FormatHint, TreeSchema};
///
/// let yaml = "id: 1\nchildren:\n  - id: 2\n";
/// let tree = parse_content(yaml, FormatHint::Auto, &TreeSchema::default(), "inline").unwrap();
/// assert_eq!(tree.node_count(), 2);
/// ```
pub fn parse_content(
    content: &str,
    hint: FormatHint,
    schema: &TreeSchema,
    source: &str,
) -> Result<Tree, ParseError> {
    let value = match hint {
        FormatHint::Json => {
            serde_json::from_str(content).map_err(|e| ParseError::json_error(source, e))?
        }
        FormatHint::Yaml => read_yaml(content).map_err(|e| ParseError::yaml_error(source, e))?,
        FormatHint::Toml => read_toml(content).map_err(|e| ParseError::toml_error(source, e))?,
        FormatHint::Auto => serde_json::from_str(content)
            .ok()
            .or_else(|| read_toml(content).ok())
            .or_else(|| read_yaml(content).ok())
            .ok_or_else(|| ParseError::unknown_format(source))?,
    };

    parse_value(value, schema).map_err(|e| ParseError::tree(source, e))
}

/// Parses a JSON string into a [`Tree`] using the default schema.
///
/// # Examples
///
/// ```
/// use tdiff_rs::parser::parse_json;
///
/// let tree = parse_json(r#"[{"id": 1, "name": "a"}, {"id": 2}]"#).unwrap();
/// assert!(tree.is_forest());
/// ```
pub fn parse_json(content: &str) -> Result<Tree, ParseError> {
    parse_content(content, FormatHint::Json, &TreeSchema::default(), "<json>")
}

/// Parses a YAML string into a [`Tree`] using the default schema.
pub fn parse_yaml(content: &str) -> Result<Tree, ParseError> {
    parse_content(content, FormatHint::Yaml, &TreeSchema::default(), "<yaml>")
}

/// Parses a TOML string into a [`Tree`] using the default schema.
///
/// TOML documents are always tables, so a forest is written as an array of
/// tables under the children key.
pub fn parse_toml(content: &str) -> Result<Tree, ParseError> {
    parse_content(content, FormatHint::Toml, &TreeSchema::default(), "<toml>")
}

/// Converts an already decoded document into a [`Tree`].
///
/// # Errors
///
/// [`DiffError::InvalidTree`] when a node is not an object, lacks an id,
/// has an id that is neither a string nor an integer, has an empty id, or
/// has a children entry that is not an array.
pub fn parse_value(value: Value, schema: &TreeSchema) -> Result<Tree, DiffError> {
    let mut path = Vec::new();
    match value {
        Value::Array(items) => Ok(Tree::Forest(read_children(items, schema, &mut path)?)),
        Value::Object(mut fields)
            if fields.len() == 1 && !fields.contains_key(&schema.id_field) =>
        {
            match fields.remove(&schema.children_field) {
                Some(Value::Array(items)) => {
                    Ok(Tree::Forest(read_children(items, schema, &mut path)?))
                }
                Some(other) => {
                    fields.insert(schema.children_field.clone(), other);
                    read_node(Value::Object(fields), schema, &mut path).map(Tree::Root)
                }
                None => read_node(Value::Object(fields), schema, &mut path).map(Tree::Root),
            }
        }
        other => read_node(other, schema, &mut path).map(Tree::Root),
    }
}

fn read_node(value: Value, schema: &TreeSchema, path: &mut Vec<String>) -> Result<Node, DiffError> {
    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(DiffError::invalid_tree(
                path,
                format!("expected an object, found {}", type_name(&other)),
            ))
        }
    };

    let id = match fields.remove(&schema.id_field) {
        Some(raw) => read_id(raw, schema, path)?,
        None => {
            return Err(DiffError::invalid_tree(
                path,
                format!("missing id field '{}'", schema.id_field),
            ))
        }
    };

    let children = match fields.remove(&schema.children_field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => read_children(items, schema, path)?,
        Some(other) => {
            return Err(DiffError::invalid_tree(
                path,
                format!(
                    "field '{}' must be an array, found {}",
                    schema.children_field,
                    type_name(&other)
                ),
            ))
        }
    };

    Ok(Node {
        id,
        value: Value::Object(fields),
        children,
    })
}

fn read_children(
    items: Vec<Value>,
    schema: &TreeSchema,
    path: &mut Vec<String>,
) -> Result<Vec<Node>, DiffError> {
    let mut children = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        path.push(schema.children_field.clone());
        path.push(index.to_string());
        let child = read_node(item, schema, path);
        path.truncate(path.len() - 2);
        children.push(child?);
    }
    Ok(children)
}

fn read_id(raw: Value, schema: &TreeSchema, path: &[String]) -> Result<NodeId, DiffError> {
    match raw {
        Value::String(s) if s.is_empty() => Err(DiffError::invalid_tree(path, "node id is empty")),
        Value::String(s) => Ok(NodeId::Str(s)),
        Value::Number(n) => n.as_i64().map(NodeId::Int).ok_or_else(|| {
            DiffError::invalid_tree(
                path,
                format!("field '{}' must be an integer, found {}", schema.id_field, n),
            )
        }),
        other => Err(DiffError::invalid_tree(
            path,
            format!(
                "field '{}' must be a string or an integer, found {}",
                schema.id_field,
                type_name(&other)
            ),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn read_yaml(content: &str) -> Result<Value, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    Ok(yaml_to_json(value))
}

fn read_toml(content: &str) -> Result<Value, toml::de::Error> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(toml_to_json(toml::Value::Table(table)))
}

fn number(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Converts a YAML value to JSON. Tags are dropped and non-string mapping
/// keys are rendered as strings.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(number).unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(map) => {
            let object: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        serde_yaml::Value::String(s) => s,
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        serde_yaml::Value::Null => "null".to_string(),
                        other => format!("{:?}", other),
                    };
                    (key, yaml_to_json(v))
                })
                .collect();
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Converts a TOML value to JSON. Datetimes become strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
