//! Wire models for the platform REST API.
//!
//! Connector and service account payloads use camelCase; repository payloads
//! use snake_case.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapping::null_default;

/// Envelope around every NG API payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDto<T> {
    /// `SUCCESS`, `FAILURE` or `ERROR`.
    #[serde(default)]
    pub status: Option<String>,
    /// The payload.
    pub data: T,
    /// Request correlation id, useful when reporting issues.
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub total_items: i64,
    #[serde(default)]
    pub page_index: i32,
    #[serde(default)]
    pub page_size: i32,
    #[serde(default = "Vec::new", deserialize_with = "null_default")]
    pub content: Vec<T>,
}

impl<T> Page<T> {
    /// Whether a later page can exist.
    pub fn has_next(&self) -> bool {
        !self.content.is_empty() && i64::from(self.page_index) + 1 < self.total_pages
    }
}

/// Entities that can be matched by display name.
pub trait Named {
    /// The display name.
    fn name(&self) -> &str;
}

// Connectors

/// Connector type discriminator as reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorType {
    /// Azure cloud provider.
    Azure,
    /// GitHub.
    Github,
    /// Docker registry.
    DockerRegistry,
    /// Any type this provider does not manage.
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Azure => "Azure",
            Self::Github => "Github",
            Self::DockerRegistry => "DockerRegistry",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// A connector of any type. The type-specific part stays untyped in `spec`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorInfo {
    pub name: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_identifier: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    #[serde(default)]
    pub spec: Value,
}

impl Named for ConnectorInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Body of connector create and update calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorRequest {
    pub connector: ConnectorInfo,
}

/// Connector as returned by get, create, update and list calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorResponse {
    pub connector: ConnectorInfo,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub last_modified_at: Option<i64>,
}

impl Named for ConnectorResponse {
    fn name(&self) -> &str {
        &self.connector.name
    }
}

/// Filter body of the connector list call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorFilter {
    pub connector_names: Vec<String>,
    pub types: Vec<ConnectorType>,
    pub filter_type: &'static str,
}

impl ConnectorFilter {
    /// Filter on one connector name and type.
    pub fn by_name(name: &str, connector_type: ConnectorType) -> Self {
        Self {
            connector_names: vec![name.to_string()],
            types: vec![connector_type],
            filter_type: "Connector",
        }
    }
}

// Repositories

/// A code repository.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub id: i64,
    pub identifier: String,
    pub parent_id: i64,
    pub path: String,
    pub description: String,
    pub default_branch: String,
    pub git_url: String,
    pub is_public: bool,
    pub importing: bool,
    pub created: i64,
    pub created_by: i64,
    pub updated: i64,
    pub size: i64,
    pub size_updated: i64,
    pub num_forks: i64,
    pub num_pulls: i64,
    pub num_open_pulls: i64,
    pub num_closed_pulls: i64,
    pub num_merged_pulls: i64,
}

/// Body of the repository create call. Unset values are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateRepositoryBody {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_ignore: Option<String>,
}

/// Body of the repository update call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateRepositoryBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

/// Remote SCM a repository is imported from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Body of the repository import call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportRepositoryBody {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub provider: ImportProvider,
    pub provider_repo: String,
}

// Service accounts

/// A service account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub identifier: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub account_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_identifier: Option<String>,
}

impl Named for ServiceAccount {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Service account with usage counters, as returned by the aggregate list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountAggregate {
    pub service_account: ServiceAccount,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub last_modified_at: Option<i64>,
    #[serde(default)]
    pub token_active_count: Option<i64>,
    #[serde(default)]
    pub token_total_count: Option<i64>,
}

impl Named for ServiceAccountAggregate {
    fn name(&self) -> &str {
        &self.service_account.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connector_type_unknown_maps_to_other() {
        let info: ConnectorInfo = serde_json::from_value(json!({
            "name": "vault",
            "identifier": "vault",
            "type": "Vault",
            "tags": null
        }))
        .unwrap();
        assert_eq!(info.connector_type, ConnectorType::Other);
        assert!(info.tags.is_empty());
        assert!(info.spec.is_null());
    }

    #[test]
    fn test_connector_filter_shape() {
        let filter = ConnectorFilter::by_name("conn1", ConnectorType::Github);
        assert_eq!(
            serde_json::to_value(filter).unwrap(),
            json!({
                "connectorNames": ["conn1"],
                "types": ["Github"],
                "filterType": "Connector"
            })
        );
    }

    #[test]
    fn test_page_has_next() {
        let page: Page<Value> = serde_json::from_value(json!({
            "totalPages": 2, "totalItems": 3, "pageIndex": 0, "pageSize": 2,
            "content": [{}, {}]
        }))
        .unwrap();
        assert!(page.has_next());

        let last: Page<Value> = serde_json::from_value(json!({
            "totalPages": 2, "pageIndex": 1, "content": [{}]
        }))
        .unwrap();
        assert!(!last.has_next());

        let empty: Page<Value> = serde_json::from_value(json!({"content": null})).unwrap();
        assert!(!empty.has_next());
    }

    #[test]
    fn test_repository_defaults_missing_fields() {
        let repo: Repository = serde_json::from_value(json!({
            "identifier": "repo1",
            "is_public": true,
            "git_url": "https://git.example.com/acc/repo1.git"
        }))
        .unwrap();
        assert_eq!(repo.identifier, "repo1");
        assert!(repo.is_public);
        assert_eq!(repo.num_pulls, 0);
    }

    #[test]
    fn test_create_body_omits_unset_fields() {
        let body = CreateRepositoryBody {
            identifier: "repo1".to_string(),
            is_public: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"identifier": "repo1", "is_public": true})
        );
    }
}
