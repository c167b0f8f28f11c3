//! Field descriptor tables and shared field conversions.
//!
//! Each resource declares its attributes once, as a static `&[Field]` table.
//! Schemas are generated from the tables; typed state structs carry the values.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::schema::{AttributeFlags, AttributeType};

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string.
    String,
    /// A 64-bit integer.
    Int,
    /// A boolean.
    Bool,
    /// An unordered set of strings.
    StringSet,
}

impl FieldKind {
    /// The schema type for this kind.
    pub fn attribute_type(self) -> AttributeType {
        match self {
            Self::String => AttributeType::String,
            Self::Int => AttributeType::Int64,
            Self::Bool => AttributeType::Bool,
            Self::StringSet => AttributeType::set(AttributeType::String),
        }
    }
}

/// Who authors a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// Must be set in configuration.
    Required,
    /// May be set in configuration.
    Optional,
    /// Set only by the backend.
    Computed,
    /// May be set; filled by the backend when not.
    OptionalComputed,
}

impl FieldMode {
    /// The schema flags for this mode.
    pub fn flags(self, sensitive: bool) -> AttributeFlags {
        let mut flags = match self {
            Self::Required => AttributeFlags::required(),
            Self::Optional => AttributeFlags::optional(),
            Self::Computed => AttributeFlags::computed(),
            Self::OptionalComputed => AttributeFlags::optional_computed(),
        };
        flags.sensitive = sensitive;
        flags
    }
}

/// One row of a field descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Attribute name in state.
    pub name: &'static str,
    /// Value type.
    pub kind: FieldKind,
    /// Who authors the value.
    pub mode: FieldMode,
    /// Human-readable description.
    pub description: &'static str,
    /// Changing the value replaces the resource.
    pub force_new: bool,
    /// Value is hidden from logs and plan output.
    pub sensitive: bool,
}

impl Field {
    const fn new(
        name: &'static str,
        kind: FieldKind,
        mode: FieldMode,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            mode,
            description,
            force_new: false,
            sensitive: false,
        }
    }

    /// A required field.
    pub const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self::new(name, kind, FieldMode::Required, description)
    }

    /// An optional field.
    pub const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self::new(name, kind, FieldMode::Optional, description)
    }

    /// A backend-computed field.
    pub const fn computed(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self::new(name, kind, FieldMode::Computed, description)
    }

    /// An optional field the backend fills in when absent.
    pub const fn optional_computed(
        name: &'static str,
        kind: FieldKind,
        description: &'static str,
    ) -> Self {
        Self::new(name, kind, FieldMode::OptionalComputed, description)
    }

    /// Mark the field as replacing the resource when changed.
    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Mark the field as sensitive.
    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// The stored id of a resource.
pub const ID_FIELD: Field = Field::computed(
    "id",
    FieldKind::String,
    "Stored identifier of the resource, set once it exists remotely.",
);

/// Organization and project scoping.
pub const SCOPE_FIELDS: &[Field] = &[
    Field::optional(
        "org_id",
        FieldKind::String,
        "Unique identifier of the organization.",
    )
    .force_new(),
    Field::optional(
        "project_id",
        FieldKind::String,
        "Unique identifier of the project. Requires org_id.",
    )
    .force_new(),
];

/// Fields shared by every named, tagged platform entity.
pub const ENTITY_FIELDS: &[Field] = &[
    ID_FIELD,
    Field::required(
        "identifier",
        FieldKind::String,
        "Unique identifier of the resource.",
    )
    .force_new(),
    Field::required("name", FieldKind::String, "Name of the resource."),
    Field::optional(
        "description",
        FieldKind::String,
        "Description of the resource.",
    ),
    Field::optional(
        "tags",
        FieldKind::StringSet,
        "Tags to associate with the resource, in key:value form.",
    ),
];

/// Deserialize `null` the same way as a missing field.
///
/// Planned state from the framework carries explicit nulls for unset
/// attributes, which `Vec` and map fields would otherwise reject.
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Turn `key:value` tag strings into the map the API expects.
///
/// The split happens at the first `:`; a tag without one gets an empty value.
pub fn expand_tags(tags: &[String]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|tag| match tag.split_once(':') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (tag.clone(), String::new()),
        })
        .collect()
}

/// Turn the API tag map back into sorted `key:value` strings.
pub fn flatten_tags(tags: &BTreeMap<String, String>) -> Vec<String> {
    tags.iter()
        .map(|(key, value)| format!("{}:{}", key, value))
        .collect()
}

/// Treat empty strings as absent.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct WithList {
        #[serde(default, deserialize_with = "null_default")]
        tags: Vec<String>,
    }

    #[test]
    fn test_null_default_accepts_null_and_missing() {
        let parsed: WithList = serde_json::from_value(json!({"tags": null})).unwrap();
        assert!(parsed.tags.is_empty());

        let parsed: WithList = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.tags.is_empty());

        let parsed: WithList = serde_json::from_value(json!({"tags": ["a:b"]})).unwrap();
        assert_eq!(parsed.tags, vec!["a:b"]);
    }

    #[test]
    fn test_expand_tags() {
        let tags = vec![
            "foo:bar".to_string(),
            "url:http://x".to_string(),
            "plain".to_string(),
        ];
        let expanded = expand_tags(&tags);

        assert_eq!(expanded["foo"], "bar");
        assert_eq!(expanded["url"], "http://x");
        assert_eq!(expanded["plain"], "");
    }

    #[test]
    fn test_flatten_tags_is_sorted() {
        let mut map = BTreeMap::new();
        map.insert("zone".to_string(), "eu".to_string());
        map.insert("env".to_string(), "prod".to_string());

        assert_eq!(flatten_tags(&map), vec!["env:prod", "zone:eu"]);
    }

    #[test]
    fn test_field_modes() {
        let field = Field::optional_computed("default_branch", FieldKind::String, "Branch.");
        let flags = field.mode.flags(false);
        assert!(flags.optional && flags.computed);

        let secret = Field::optional("password", FieldKind::String, "Password.").sensitive();
        assert!(secret.mode.flags(secret.sensitive).sensitive);
    }

    #[test]
    fn test_entity_fields_mark_identifier_force_new() {
        let identifier = ENTITY_FIELDS
            .iter()
            .find(|f| f.name == "identifier")
            .unwrap();
        assert!(identifier.force_new);
        assert_eq!(identifier.mode, FieldMode::Required);
        assert!(SCOPE_FIELDS.iter().all(|f| f.force_new));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&None), None);
    }
}
