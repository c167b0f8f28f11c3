//! Configuration validation.
//!
//! Configuration is checked against the resource [`Schema`] first (types,
//! required attributes, block item counts, computed-only attributes), then
//! against the platform's own rules: identifier format and scope
//! consistency. Every problem becomes a [`Diagnostic`] carrying the attribute
//! path, so the framework can point at the offending line.
//!
//! ```
//! use platform_provider::schema::{Schema, Attribute};
//! use platform_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("size", Attribute::optional_int64());
//!
//! assert!(validate(&schema, &json!({"name": "repo1", "size": 42})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "repo1", "size": "big"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("size".to_string()));
//! ```

use serde_json::Value;

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, NestedBlock,
    Schema,
};

/// Longest identifier the platform accepts.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Validate a JSON value against a schema.
///
/// An empty list means the value is valid.
///
/// - Required attributes must be present and non-null
/// - Computed-only attributes must be absent or null
/// - Attribute types must match the schema
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Like [`validate`], returning `Err` with the diagnostics when invalid.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Full check of a resource configuration: schema, identifier and scope.
pub fn validate_resource_config(schema: &Schema, config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = validate(schema, config);
    if let Some(identifier) = config.get("identifier").and_then(Value::as_str) {
        diagnostics.extend(validate_identifier(identifier, "identifier"));
    }
    diagnostics.extend(validate_scope(config));
    diagnostics
}

/// Check an identifier matches `^[a-zA-Z_][0-9a-zA-Z_$]{0,127}$`.
pub fn validate_identifier(identifier: &str, path: &str) -> Option<Diagnostic> {
    let mut chars = identifier.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if starts_well && rest_ok && identifier.len() <= MAX_IDENTIFIER_LEN {
        return None;
    }
    Some(
        Diagnostic::error(format!("Invalid identifier '{}'", identifier))
            .with_detail(format!(
                "Identifiers must start with a letter or underscore, contain only letters, digits, '_' or '$', and be at most {} characters long",
                MAX_IDENTIFIER_LEN
            ))
            .with_attribute(path),
    )
}

/// Check `project_id` is only set together with `org_id`.
pub fn validate_scope(config: &Value) -> Option<Diagnostic> {
    let set = |name: &str| {
        config
            .get(name)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.is_empty())
    };
    if set("project_id") && !set("org_id") {
        return Some(
            Diagnostic::error("project_id requires org_id")
                .with_detail("A project always belongs to an organization; set org_id as well")
                .with_attribute("project_id"),
        );
    }
    None
}

/// Check a string attribute holds one of `allowed`, when set.
pub fn validate_one_of(config: &Value, path: &str, allowed: &[&str]) -> Option<Diagnostic> {
    let value = config.get(path).and_then(Value::as_str)?;
    if allowed.contains(&value) {
        return None;
    }
    Some(
        Diagnostic::error(format!("Invalid value '{}' for attribute '{}'", value, path))
            .with_detail(format!("Expected one of: {}", allowed.join(", ")))
            .with_attribute(path),
    )
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)))
                    .with_attribute_if_not_empty(path),
            );
            return;
        },
    };

    let mut names: Vec<_> = block.attributes.keys().collect();
    names.sort();
    for name in names {
        let attr = &block.attributes[name];
        validate_attribute(attr, obj.get(name), &join_path(path, name), diagnostics);
    }

    let mut blocks: Vec<_> = block.blocks.keys().collect();
    blocks.sort();
    for name in blocks {
        let nested = &block.blocks[name];
        validate_nested_block(nested, obj.get(name), &join_path(path, name), diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(_) if attr.flags.is_computed_only() => {
            diagnostics.push(
                Diagnostic::error(format!("Cannot set computed attribute '{}'", path))
                    .with_detail("This attribute is set by the platform and cannot be configured")
                    .with_attribute(path),
            );
        },
        Some(v) => validate_attribute_type(&attr.attr_type, v, path, diagnostics),
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::Set(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "set", value));
            }
        },
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting_mode {
        BlockNestingMode::Single => match value {
            None | Some(Value::Null) => {
                if nested.min_items > 0 {
                    diagnostics.push(
                        Diagnostic::error(format!("Missing required block '{}'", path))
                            .with_detail("At least one block is required")
                            .with_attribute(path),
                    );
                }
            },
            Some(v) => validate_block(&nested.block, v, path, diagnostics),
        },
        BlockNestingMode::List => validate_list_block(nested, value, path, diagnostics),
    }
}

fn validate_list_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let items: &[Value] = match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(arr)) => arr,
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
            return;
        },
    };

    let len = items.len() as u32;
    if len < nested.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, len
            ))
            .with_attribute(path),
        );
    }

    // 0 means unlimited
    if nested.max_items > 0 && len > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, len
            ))
            .with_attribute(path),
        );
    }

    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{}.{}", path, i);
        validate_block(&nested.block, item, &item_path, diagnostics);
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64()
                || n.as_f64().is_some_and(|f| {
                    f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
                })
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!("Expected {}, got {}", expected, value_type_name(got))),
        attribute: Some(path.to_string()),
    }
}

trait DiagnosticExt {
    fn with_attribute_if_not_empty(self, path: &str) -> Self;
}

impl DiagnosticExt for Diagnostic {
    fn with_attribute_if_not_empty(self, path: &str) -> Self {
        if path.is_empty() {
            self
        } else {
            self.with_attribute(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ENTITY_FIELDS, SCOPE_FIELDS};
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    fn entity_schema() -> Schema {
        Schema::v0().with_fields(ENTITY_FIELDS).with_fields(SCOPE_FIELDS)
    }

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "test"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        assert_eq!(validate(&schema, &json!({"name": null})).len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("size", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"size": 42})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"size": null})).is_empty());
        assert_eq!(validate(&schema, &json!({"size": "big"})).len(), 1);
    }

    #[test]
    fn test_validate_rejects_computed_attribute() {
        let schema = Schema::v0().with_attribute("git_url", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"git_url": null})).is_empty());

        let diagnostics = validate(&schema, &json!({"git_url": "https://example.com"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Cannot set computed attribute"));
    }

    #[test]
    fn test_validate_optional_computed_accepts_value() {
        let schema = Schema::v0().with_attribute(
            "default_branch",
            Attribute::new(AttributeType::String, AttributeFlags::optional_computed()),
        );
        assert!(validate(&schema, &json!({"default_branch": "main"})).is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute(
            "size",
            Attribute::new(AttributeType::Int64, AttributeFlags::required()),
        );

        assert!(validate(&schema, &json!({"size": 42})).is_empty());
        assert!(validate(&schema, &json!({"size": 42.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"size": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"size": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_set_elements() {
        let schema = entity_schema();
        let diagnostics = validate(
            &schema,
            &json!({"identifier": "a", "name": "a", "tags": ["ok:1", 7]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("tags.1".to_string()));
    }

    #[test]
    fn test_validate_nested_block_list() {
        let schema = Schema::v0().with_block(
            "credentials",
            NestedBlock::list(Block::new().with_attribute("username", Attribute::required_string()))
                .with_min_items(1)
                .with_max_items(1),
        );

        assert!(validate(&schema, &json!({"credentials": [{"username": "u"}]})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"credentials": [{"username": "u"}, {"username": "v"}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 1"));

        let diagnostics = validate(&schema, &json!({"credentials": [{"username": 1}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("credentials.0.username".to_string())
        );
    }

    #[test]
    fn test_validate_single_block() {
        let schema = Schema::v0().with_block(
            "settings",
            NestedBlock::single(Block::new().with_attribute("enabled", Attribute::optional_bool()))
                .with_min_items(1),
        );

        assert!(validate(&schema, &json!({"settings": {"enabled": true}})).is_empty());
        assert_eq!(validate(&schema, &json!({})).len(), 1);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }

    #[test]
    fn test_helpers() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"name": "test"})));
        assert!(!is_valid(&schema, &json!({})));
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("repo1", "identifier").is_none());
        assert!(validate_identifier("_private$1", "identifier").is_none());
        assert!(validate_identifier(&"a".repeat(128), "identifier").is_none());

        for bad in ["", "1repo", "my-repo", "has space", "ünï"] {
            let diagnostic = validate_identifier(bad, "identifier").unwrap();
            assert_eq!(diagnostic.attribute.as_deref(), Some("identifier"));
        }
        assert!(validate_identifier(&"a".repeat(129), "identifier").is_some());
    }

    #[test]
    fn test_validate_scope() {
        assert!(validate_scope(&json!({"org_id": "o", "project_id": "p"})).is_none());
        assert!(validate_scope(&json!({"org_id": "o"})).is_none());
        assert!(validate_scope(&json!({"project_id": "", "org_id": null})).is_none());

        let diagnostic = validate_scope(&json!({"project_id": "p"})).unwrap();
        assert_eq!(diagnostic.attribute.as_deref(), Some("project_id"));
    }

    #[test]
    fn test_validate_one_of() {
        let config = json!({"connection_type": "Team"});
        let diagnostic = validate_one_of(&config, "connection_type", &["Account", "Repo"]).unwrap();
        assert!(diagnostic.detail.unwrap().contains("Account, Repo"));

        assert!(validate_one_of(&json!({}), "connection_type", &["Account"]).is_none());
    }

    #[test]
    fn test_validate_resource_config() {
        let schema = entity_schema();

        let diagnostics = validate_resource_config(
            &schema,
            &json!({"identifier": "repo1", "name": "Repo 1", "org_id": "default"}),
        );
        assert!(diagnostics.is_empty());

        let diagnostics = validate_resource_config(
            &schema,
            &json!({"identifier": "bad-id", "name": "x", "project_id": "p", "id": "set"}),
        );
        let paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(paths, vec!["id", "identifier", "project_id"]);
    }
}
