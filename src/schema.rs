//! JSON Schema validation producing an issue tree
//!
//! Validation is done by the `jsonschema` crate. A failed `anyOf`/`oneOf`
//! only reports that no alternative matched, so each alternative is validated
//! again on its own against the same sub-instance and its errors become the
//! children of the union error. Children keep the order the alternatives are
//! declared in. Paths of children are relative to the union's instance.
//!
//! # Example
//!
//! ```
//! use vivliostyle_config::schema::JsonSchema;
//! use serde_json::json;
//!
//! let schema = JsonSchema::new(json!({
//!     "type": "object",
//!     "properties": {"title": {"type": "string"}},
//!     "required": ["title"],
//! }))
//! .unwrap();
//! assert!(schema.check(&json!({"title": "Book"})).is_ok());
//! assert!(schema.check(&json!({"title": 1})).is_err());
//! ```

use jsonschema::{Draft, Validator};
use serde_json::Value;
use thiserror::Error;

/// The schema itself could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid schema: {0}")]
pub struct SchemaError(pub String);

/// One step of an issue path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathItem {
    Key(String),
    Index(usize),
}

/// A failure reported by the engine.
///
/// `path` is relative to where the enclosing issue was reported; the
/// alternatives of a union are relative to the union's location.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIssue {
    /// Engine message, e.g. `123 is not of type "string"`
    pub message: String,
    /// Schema keyword that failed, e.g. `type` or `anyOf`
    pub keyword: String,
    pub path: Vec<PathItem>,
    /// Issues of each union alternative, in declaration order
    pub issues: Vec<SchemaIssue>,
}

/// A compiled JSON Schema.
pub struct JsonSchema {
    schema: Value,
    validator: Validator,
}

impl std::fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchema").field("schema", &self.schema).finish_non_exhaustive()
    }
}

impl JsonSchema {
    /// Compile a schema document (Draft 2020-12).
    pub fn new(schema: Value) -> Result<Self, SchemaError> {
        let validator = compile(&schema)?;
        Ok(Self { schema, validator })
    }

    /// The schema document.
    pub fn as_value(&self) -> &Value {
        &self.schema
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value)
    }

    /// Check a value against this schema. The value is never modified.
    pub fn check(&self, value: &Value) -> Result<(), Vec<SchemaIssue>> {
        let issues = collect_issues(&self.validator, &self.schema, value);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

fn compile(schema: &Value) -> Result<Validator, SchemaError> {
    let mut opts = jsonschema::options();
    opts.with_draft(Draft::Draft202012);
    opts.build(schema).map_err(|e| SchemaError(e.to_string()))
}

fn collect_issues(validator: &Validator, schema: &Value, instance: &Value) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    for error in validator.iter_errors(instance) {
        let instance_pointer = error.instance_path.to_string();
        let schema_pointer = error.schema_path.to_string();
        let keyword = schema_pointer.rsplit('/').next().unwrap_or_default().to_string();
        let mut issue = SchemaIssue {
            message: error.to_string(),
            keyword,
            path: resolve_pointer(instance, &instance_pointer),
            issues: Vec::new(),
        };

        if matches!(issue.keyword.as_str(), "anyOf" | "oneOf") {
            let target = instance.pointer(&instance_pointer).unwrap_or(&Value::Null);
            let branches = schema.pointer(&schema_pointer).and_then(Value::as_array);
            for branch in branches.into_iter().flatten() {
                match compile(branch) {
                    Ok(branch_validator) => issue.issues.extend(collect_issues(&branch_validator, branch, target)),
                    Err(e) => tracing::debug!(error = %e, schema = %schema_pointer, "union alternative did not compile"),
                }
            }
        }
        issues.push(issue);
    }
    issues
}

/// Split a JSON pointer into path items, using the instance to tell array
/// indices from object keys.
fn resolve_pointer(instance: &Value, pointer: &str) -> Vec<PathItem> {
    let mut path = Vec::new();
    let mut current = Some(instance);
    for token in pointer.split('/').skip(1) {
        let token = token.replace("~1", "/").replace("~0", "~");
        let item = match (current, token.parse::<usize>()) {
            (Some(Value::Array(_)), Ok(index)) => PathItem::Index(index),
            _ => PathItem::Key(token),
        };
        current = match (&item, current) {
            (PathItem::Index(index), Some(value)) => value.get(*index),
            (PathItem::Key(key), Some(value)) => value.get(key.as_str()),
            (_, None) => None,
        };
        path.push(item);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(k: &str) -> PathItem {
        PathItem::Key(k.to_string())
    }

    fn paths(issues: &[SchemaIssue]) -> Vec<Vec<PathItem>> {
        issues.iter().map(|i| i.path.clone()).collect()
    }

    #[test]
    fn test_valid_value() {
        let schema = JsonSchema::new(json!({"type": "array", "items": {"type": "string"}})).unwrap();
        assert!(schema.check(&json!(["a", "b"])).is_ok());
        assert!(schema.is_valid(&json!([])));
    }

    #[test]
    fn test_invalid_schema() {
        assert!(JsonSchema::new(json!({"type": 12})).is_err());
    }

    #[test]
    fn test_instance_paths() {
        let schema = JsonSchema::new(json!({
            "type": "object",
            "properties": {
                "tasks": {"type": "array", "items": {"type": "object", "properties": {"output": {"type": "string"}}}}
            }
        }))
        .unwrap();
        let issues = schema.check(&json!({"tasks": [{"output": "a"}, {"output": 1}]})).unwrap_err();
        assert_eq!(paths(&issues), vec![vec![key("tasks"), PathItem::Index(1), key("output")]]);
        assert_eq!(issues[0].keyword, "type");
        assert!(issues[0].issues.is_empty());
    }

    #[test]
    fn test_numeric_object_keys_stay_keys() {
        let schema = JsonSchema::new(json!({"properties": {"0": {"type": "string"}}})).unwrap();
        let issues = schema.check(&json!({"0": true})).unwrap_err();
        assert_eq!(issues[0].path, vec![key("0")]);
    }

    #[test]
    fn test_escaped_pointer_tokens() {
        let schema = JsonSchema::new(json!({"properties": {"a/b": {"type": "string"}}})).unwrap();
        let issues = schema.check(&json!({"a/b": 1})).unwrap_err();
        assert_eq!(issues[0].path, vec![key("a/b")]);
    }

    #[test]
    fn test_any_of_branches_become_children_in_order() {
        let schema = JsonSchema::new(json!({
            "type": "object",
            "properties": {"theme": {"anyOf": [{"type": "string"}, {"type": "array", "items": {"type": "string"}}]}}
        }))
        .unwrap();
        let issues = schema.check(&json!({"theme": [1]})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].keyword, "anyOf");
        assert_eq!(issues[0].path, vec![key("theme")]);
        assert_eq!(paths(&issues[0].issues), vec![vec![], vec![PathItem::Index(0)]]);
        assert!(issues[0].issues.iter().all(|i| i.keyword == "type"));
    }

    #[test]
    fn test_nested_unions_expand_recursively() {
        let item = json!({"anyOf": [{"type": "string"}, {"type": "object", "properties": {"path": {"type": "string"}}}]});
        let schema = JsonSchema::new(json!({"anyOf": [item.clone(), {"type": "array", "items": item}]})).unwrap();
        let issues = schema.check(&json!([{"path": 5}])).unwrap_err();

        let array_branch = &issues[0].issues[1];
        assert_eq!(array_branch.keyword, "anyOf");
        assert_eq!(array_branch.path, vec![PathItem::Index(0)]);
        assert_eq!(array_branch.issues[1].path, vec![key("path")]);
    }

    #[test]
    fn test_check_does_not_mutate() {
        let value = json!({"tasks": [1]});
        let before = value.clone();
        let schema = JsonSchema::new(json!({"properties": {"tasks": {"items": {"type": "string"}}}})).unwrap();
        let _ = schema.check(&value);
        assert_eq!(value, before);
    }
}
