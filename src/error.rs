//! Custom error types for TDIFF.

use crate::tree::NodeId;

/// Errors raised by the diff engine itself.
///
/// Well-formed input never fails; these variants signal a broken caller
/// contract and always carry the position of the offending node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error("Invalid tree at {path}: {reason}")]
    InvalidTree { path: String, reason: String },

    #[error("Duplicate node id {id} at {path}")]
    DuplicateId { id: NodeId, path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read file {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not detect file format for {path}")]
    UnknownFormat { path: String },

    #[error("{path} is not a valid tree: {source}")]
    Tree {
        path: String,
        #[source]
        source: DiffError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to serialize to JSON: {source}")]
    JsonSerializationError {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TdiffError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },
}

impl DiffError {
    pub fn invalid_tree(path: &[String], reason: impl Into<String>) -> Self {
        Self::InvalidTree {
            path: display_path(path),
            reason: reason.into(),
        }
    }

    pub fn duplicate_id(id: NodeId, path: &[String]) -> Self {
        Self::DuplicateId {
            id,
            path: display_path(path),
        }
    }
}

impl ParseError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn read_error(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn json_error(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonError {
            path: path.into(),
            source,
        }
    }

    pub fn yaml_error(path: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::YamlError {
            path: path.into(),
            source,
        }
    }

    pub fn toml_error(path: impl Into<String>, source: toml::de::Error) -> Self {
        Self::TomlError {
            path: path.into(),
            source,
        }
    }

    pub fn unknown_format(path: impl Into<String>) -> Self {
        Self::UnknownFormat { path: path.into() }
    }

    pub fn tree(path: impl Into<String>, source: DiffError) -> Self {
        Self::Tree {
            path: path.into(),
            source,
        }
    }
}

/// Renders a path token list the way error messages and terminal output show it.
///
/// - `[]` → `"(root)"`
/// - `["children", "0"]` → `"children[0]"`
/// - `["children", "0", "children", "2"]` → `"children[0].children[2]"`
pub fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        return "(root)".to_string();
    }

    let mut result = String::new();
    for component in path {
        if component.bytes().all(|b| b.is_ascii_digit()) && !component.is_empty() {
            result.push('[');
            result.push_str(component);
            result.push(']');
        } else {
            if !result.is_empty() {
                result.push('.');
            }
            result.push_str(component);
        }
    }
    result
}
