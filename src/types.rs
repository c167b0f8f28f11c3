//! Convenience types shared by the reconciler, planner and provider.

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};

/// Organization/project placement of an entity under the configured account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Organization identifier.
    pub org_id: Option<String>,
    /// Project identifier.
    pub project_id: Option<String>,
}

impl Scope {
    /// Create a scope, treating empty strings as absent.
    pub fn new(org_id: Option<&str>, project_id: Option<&str>) -> Self {
        let clean = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            org_id: clean(org_id),
            project_id: clean(project_id),
        }
    }

    /// The account-level scope.
    pub fn account() -> Self {
        Self::default()
    }

    /// Query parameters addressing this scope.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(org) = &self.org_id {
            pairs.push(("orgIdentifier", org.as_str()));
        }
        if let Some(project) = &self.project_id {
            pairs.push(("projectIdentifier", project.as_str()));
        }
        pairs
    }
}

/// How a stored entity can be located remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    /// By its identifier.
    Identifier(String),
    /// By exact name, scanning list pages.
    Name(String),
}

/// Split an import id into scope and identifier.
///
/// Accepted forms are `identifier`, `org_id/identifier` and
/// `org_id/project_id/identifier`.
pub fn parse_import_id(id: &str) -> ProviderResult<(Scope, String)> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(invalid_import_id(id));
    }
    match parts.as_slice() {
        [identifier] => Ok((Scope::account(), identifier.to_string())),
        [org, identifier] => Ok((Scope::new(Some(*org), None), identifier.to_string())),
        [org, project, identifier] => Ok((
            Scope::new(Some(*org), Some(*project)),
            identifier.to_string(),
        )),
        _ => Err(invalid_import_id(id)),
    }
}

fn invalid_import_id(id: &str) -> ProviderError {
    ProviderError::InvalidRequest(format!(
        "invalid import id '{}': expected <identifier>, <org_id>/<identifier> or <org_id>/<project_id>/<identifier>",
        id
    ))
}

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<serde_json::Value>,
    /// The value after the change (None if removing).
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a newly set attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: serde_json::Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: serde_json::Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

/// A resource brought under management by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Resource and data source names the provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_treats_empty_as_absent() {
        let scope = Scope::new(Some(""), Some(""));
        assert_eq!(scope, Scope::account());
        assert!(scope.query_pairs().is_empty());
    }

    #[test]
    fn test_scope_query_pairs() {
        let scope = Scope::new(Some("org"), Some("proj"));
        assert_eq!(
            scope.query_pairs(),
            vec![("orgIdentifier", "org"), ("projectIdentifier", "proj")]
        );
    }

    #[test]
    fn test_parse_import_id() {
        let (scope, id) = parse_import_id("repo1").unwrap();
        assert_eq!(scope, Scope::account());
        assert_eq!(id, "repo1");

        let (scope, id) = parse_import_id("org/repo1").unwrap();
        assert_eq!(scope.org_id.as_deref(), Some("org"));
        assert!(scope.project_id.is_none());
        assert_eq!(id, "repo1");

        let (scope, id) = parse_import_id("org/proj/repo1").unwrap();
        assert_eq!(scope, Scope::new(Some("org"), Some("proj")));
        assert_eq!(id, "repo1");
    }

    #[test]
    fn test_parse_import_id_rejects_malformed() {
        assert!(parse_import_id("").is_err());
        assert!(parse_import_id("a//b").is_err());
        assert!(parse_import_id("a/b/c/d").is_err());
    }

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", serde_json::json!("test"));
        assert!(added.before.is_none());

        let removed = AttributeChange::removed("name", serde_json::json!("old"));
        assert!(removed.after.is_none());

        let modified =
            AttributeChange::modified("size", serde_json::json!(1), serde_json::json!(2));
        assert_eq!(modified.before, Some(serde_json::json!(1)));
        assert_eq!(modified.after, Some(serde_json::json!(2)));
    }
}
