//! Engine-neutral validation issue tree
//!
//! [`ValidationIssue`] is the shape the diagnostic renderer works on. It is
//! independent of the schema engine; [`From<SchemaIssue>`] is the single
//! conversion point from engine output.

use crate::schema::{JsonSchema, PathItem, SchemaIssue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// One step of a path into the validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<PathItem> for PathSegment {
    fn from(item: PathItem) -> Self {
        match item {
            PathItem::Key(key) => PathSegment::Key(key),
            PathItem::Index(index) => PathSegment::Index(index),
        }
    }
}

/// A validation failure, possibly branching into alternative explanations.
///
/// A leaf has no children. Children of a branching issue are the issues of
/// each alternative that was tried, in the order the engine reported them.
/// `path` is relative to the location of the parent issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub message: String,
    pub path: Vec<PathSegment>,
    pub children: Vec<ValidationIssue>,
}

impl ValidationIssue {
    /// Create a leaf issue without a path.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), path: Vec::new(), children: Vec::new() }
    }

    /// Set the path of this issue
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Set the child issues
    pub fn with_children(mut self, children: Vec<ValidationIssue>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl From<SchemaIssue> for ValidationIssue {
    fn from(issue: SchemaIssue) -> Self {
        ValidationIssue {
            message: issue.message,
            path: issue.path.into_iter().map(PathSegment::from).collect(),
            children: issue.issues.into_iter().map(ValidationIssue::from).collect(),
        }
    }
}

/// Join path segments with dots, e.g. `tasks.0.output`.
pub fn dotted_path(path: &[PathSegment]) -> String {
    path.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(".")
}

/// Validate a value against a schema and deserialize it into `T`.
///
/// The schema check runs first; if it passes, the value is deserialized.
/// A deserialization failure after a passing check is reported as a single
/// root issue. The input value is never modified.
pub fn validate<T: DeserializeOwned>(value: &Value, schema: &JsonSchema) -> Result<T, Vec<ValidationIssue>> {
    if let Err(issues) = schema.check(value) {
        return Err(issues.into_iter().map(ValidationIssue::from).collect());
    }
    serde_json::from_value(value.clone()).map_err(|e| vec![ValidationIssue::new(e.to_string())])
}
