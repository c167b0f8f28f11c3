//! Connectors: credential and endpoint bindings to external systems.
//!
//! All connector types share one envelope (identifier, name, tags, scope,
//! delegate settings) and differ only in their `spec` payload. The envelope
//! is handled once by [`ConnectorResource`]; each type supplies a
//! [`ConnectorKind`] describing its fields and spec mapping.

use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::models::{ConnectorFilter, ConnectorInfo, ConnectorType};
use crate::client::ApiClient;
use crate::error::{ProviderError, ProviderResult};
use crate::lookup::{find_first_by_name, DEFAULT_PAGE_SIZE};
use crate::mapping::{
    expand_tags, flatten_tags, null_default, Field, FieldKind, ENTITY_FIELDS, SCOPE_FIELDS,
};
use crate::reconcile::{ResourceHandler, ResourceState, NAME_LOOKUP};
use crate::schema::{Diagnostic, NestedBlock, Schema};
use crate::types::{LookupKey, Scope};

use super::EntityMeta;

mod azure;
mod docker;
mod github;

pub use azure::{AzureCloudProvider, AZURE_CLOUD_PROVIDER_TYPE};
pub use docker::{Docker, DOCKER_TYPE};
pub use github::{Github, GITHUB_TYPE};

const DELEGATE_FIELDS: &[Field] = &[
    Field::optional(
        "delegate_selectors",
        FieldKind::StringSet,
        "Tags to filter delegates for connection.",
    ),
    Field::optional_computed(
        "execute_on_delegate",
        FieldKind::Bool,
        "Execute on delegate or not.",
    ),
];

/// One connector type.
pub trait ConnectorKind: Send + Sync + 'static {
    /// Resource type name.
    const TYPE_NAME: &'static str;
    /// Discriminator the API uses for this type.
    const CONNECTOR_TYPE: ConnectorType;
    /// Schema description.
    const DESCRIPTION: &'static str;

    /// Type-specific state, flattened next to the common fields.
    type Fields: Serialize + DeserializeOwned + Clone + Default + Debug + PartialEq + Send + Sync + 'static;
    /// Type-specific `spec` payload.
    type Spec: Serialize + DeserializeOwned + Default;

    /// Type-specific attributes.
    fn fields() -> &'static [Field];

    /// Type-specific nested blocks.
    fn blocks() -> Vec<(&'static str, NestedBlock)> {
        Vec::new()
    }

    /// Build the `spec` payload from declared fields.
    fn build_spec(fields: &Self::Fields) -> Self::Spec;

    /// Copy a `spec` payload onto state.
    fn read_spec(spec: Self::Spec, fields: &mut Self::Fields);

    /// Type-specific configuration checks.
    fn validate(config: &Value) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }
}

/// State of a connector resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "F: Serialize", deserialize = "F: DeserializeOwned + Default"))]
pub struct ConnectorState<F> {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(default, deserialize_with = "null_default")]
    pub delegate_selectors: Vec<String>,
    #[serde(default)]
    pub execute_on_delegate: Option<bool>,
    #[serde(flatten)]
    pub fields: F,
}

impl<F> ResourceState for ConnectorState<F>
where
    F: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static,
{
    fn stored_id(&self) -> Option<&str> {
        self.meta.stored_id()
    }

    fn lookup_key(&self) -> Option<LookupKey> {
        self.meta.lookup_key()
    }

    fn scope(&self) -> Scope {
        self.meta.scope()
    }

    fn for_import(scope: Scope, identifier: &str) -> Self {
        Self {
            meta: EntityMeta::for_import(scope, identifier),
            ..Default::default()
        }
    }
}

/// Handler for every connector type, parameterized by its [`ConnectorKind`].
pub struct ConnectorResource<K> {
    kind: PhantomData<K>,
}

impl<K> Default for ConnectorResource<K> {
    fn default() -> Self {
        Self { kind: PhantomData }
    }
}

impl<K: ConnectorKind> ConnectorResource<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(&self, state: &ConnectorState<K::Fields>) -> ProviderResult<ConnectorInfo> {
        let scope = state.meta.scope();
        let mut spec = match serde_json::to_value(K::build_spec(&state.fields))? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        spec.insert(
            "delegateSelectors".to_string(),
            Value::from(state.delegate_selectors.clone()),
        );
        if let Some(execute) = state.execute_on_delegate {
            spec.insert("executeOnDelegate".to_string(), Value::Bool(execute));
        }

        Ok(ConnectorInfo {
            name: state.meta.name.clone().unwrap_or_default(),
            identifier: state.meta.identifier().to_string(),
            description: state.meta.description.clone(),
            org_identifier: scope.org_id,
            project_identifier: scope.project_id,
            tags: expand_tags(&state.meta.tags),
            connector_type: K::CONNECTOR_TYPE,
            spec: Value::Object(spec),
        })
    }

    fn check_type(&self, connector: &ConnectorInfo) -> ProviderResult<()> {
        if connector.connector_type != K::CONNECTOR_TYPE {
            return Err(ProviderError::UnexpectedType {
                expected: K::CONNECTOR_TYPE.to_string(),
                actual: connector.connector_type.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<K: ConnectorKind> ResourceHandler for ConnectorResource<K> {
    type State = ConnectorState<K::Fields>;
    type Remote = ConnectorInfo;

    fn type_name(&self) -> &'static str {
        K::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let mut schema = Schema::v0()
            .with_fields(ENTITY_FIELDS)
            .with_fields(SCOPE_FIELDS)
            .with_fields(DELEGATE_FIELDS)
            .with_fields(K::fields())
            .with_description(K::DESCRIPTION);
        for (name, block) in K::blocks() {
            schema = schema.with_block(name, block);
        }
        schema
    }

    fn lookup_fields(&self) -> &'static [&'static str] {
        NAME_LOOKUP
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        K::validate(config)
    }

    async fn create(&self, client: &ApiClient, state: &Self::State) -> ProviderResult<ConnectorInfo> {
        let response = client.create_connector(self.build(state)?).await?;
        Ok(response.connector)
    }

    async fn update(&self, client: &ApiClient, _id: &str, state: &Self::State) -> ProviderResult<ConnectorInfo> {
        let response = client.update_connector(self.build(state)?).await?;
        Ok(response.connector)
    }

    async fn get(&self, client: &ApiClient, scope: &Scope, identifier: &str) -> ProviderResult<ConnectorInfo> {
        let response = client.get_connector(scope, identifier).await?;
        self.check_type(&response.connector)?;
        Ok(response.connector)
    }

    async fn find_by_name(
        &self,
        client: &ApiClient,
        scope: &Scope,
        name: &str,
    ) -> ProviderResult<Option<ConnectorInfo>> {
        let filter = ConnectorFilter::by_name(name, K::CONNECTOR_TYPE);
        let found = find_first_by_name(name, DEFAULT_PAGE_SIZE, |page_index, page_size| {
            client.list_connectors(scope, &filter, page_index, page_size)
        })
        .await?;

        match found {
            Some(response) => {
                self.check_type(&response.connector)?;
                Ok(Some(response.connector))
            },
            None => Ok(None),
        }
    }

    async fn delete(&self, client: &ApiClient, scope: &Scope, id: &str) -> ProviderResult<()> {
        client.delete_connector(scope, id).await
    }

    fn flatten(&self, remote: ConnectorInfo, state: &mut Self::State) -> ProviderResult<()> {
        state.meta.overwrite(
            &remote.identifier,
            &remote.name,
            remote.description.as_deref(),
            flatten_tags(&remote.tags),
            Scope::new(
                remote.org_identifier.as_deref(),
                remote.project_identifier.as_deref(),
            ),
        );

        let spec = remote.spec;
        state.delegate_selectors = spec
            .get("delegateSelectors")
            .and_then(Value::as_array)
            .map(|selectors| {
                let mut selectors: Vec<String> = selectors
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect();
                selectors.sort();
                selectors
            })
            .unwrap_or_default();
        state.execute_on_delegate = spec.get("executeOnDelegate").and_then(Value::as_bool);

        let spec: K::Spec = match spec {
            Value::Null => K::Spec::default(),
            spec => serde_json::from_value(spec)?,
        };
        K::read_spec(spec, &mut state.fields);
        Ok(())
    }
}

/// A `{"type": ..., "spec": ...}` pair, the API's encoding of a variant.
///
/// Unknown types still parse; callers check `kind` before using `spec`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Typed<T> {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<T>,
}

impl<T> Typed<T> {
    pub fn new(kind: &str, spec: T) -> Self {
        Self {
            kind: kind.to_string(),
            spec: Some(spec),
        }
    }

    /// A variant without a payload.
    pub fn unit(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            spec: None,
        }
    }

    /// The payload, if this is a `kind` variant.
    pub fn into_spec(self, kind: &str) -> Option<T> {
        if self.kind == kind {
            self.spec
        } else {
            None
        }
    }
}

/// Empty strings read back as unset.
pub(crate) fn some_if_set(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn github_state() -> ConnectorState<<Github as ConnectorKind>::Fields> {
        serde_json::from_value(json!({
            "identifier": "conn1",
            "name": "conn1",
            "tags": ["team:platform"],
            "org_id": "default",
            "delegate_selectors": ["b", "a"],
            "url": "https://github.com/octo",
            "connection_type": "Account",
            "validation_repo": "octo/hello",
            "credentials": [{"username": "octo", "token_ref": "account.gh_pat"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_build_envelope() {
        let info = ConnectorResource::<Github>::new().build(&github_state()).unwrap();

        assert_eq!(info.identifier, "conn1");
        assert_eq!(info.connector_type, ConnectorType::Github);
        assert_eq!(info.org_identifier.as_deref(), Some("default"));
        assert_eq!(info.tags["team"], "platform");
        assert_eq!(info.spec["delegateSelectors"], json!(["b", "a"]));
        assert!(info.spec.get("executeOnDelegate").is_none());
    }

    #[test]
    fn test_flatten_reads_envelope_and_spec() {
        let handler = ConnectorResource::<Github>::new();
        let info = handler.build(&github_state()).unwrap();

        let mut state = ConnectorState::default();
        handler.flatten(info, &mut state).unwrap();

        assert_eq!(state, {
            let mut expected = github_state();
            expected.meta.id = Some("conn1".to_string());
            expected.delegate_selectors = vec!["a".to_string(), "b".to_string()];
            expected
        });
    }

    #[test]
    fn test_flatten_without_spec() {
        let handler = ConnectorResource::<Github>::new();
        let info = ConnectorInfo {
            identifier: "conn1".to_string(),
            name: "conn1".to_string(),
            connector_type: ConnectorType::Github,
            ..Default::default()
        };

        let mut state = github_state();
        handler.flatten(info, &mut state).unwrap();

        assert_eq!(state.meta.id.as_deref(), Some("conn1"));
        assert_eq!(state.fields.url, None);
        assert!(state.delegate_selectors.is_empty());
    }

    #[test]
    fn test_check_type_mismatch() {
        let handler = ConnectorResource::<Github>::new();
        let info = ConnectorInfo {
            connector_type: ConnectorType::Azure,
            ..Default::default()
        };

        let err = handler.check_type(&info).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected connector to be of type Github, but got Azure"
        );
    }

    #[test]
    fn test_schema_has_common_and_kind_fields() {
        let schema = ConnectorResource::<Github>::new().schema();
        for name in ["identifier", "name", "tags", "org_id", "delegate_selectors", "url"] {
            assert!(schema.attribute(name).is_some(), "missing {}", name);
        }
        assert_eq!(schema.block.blocks["credentials"].min_items, 1);
    }

    #[test]
    fn test_typed_payloads() {
        let typed: Typed<Value> = serde_json::from_value(json!({"type": "Anonymous"})).unwrap();
        assert_eq!(typed, Typed::unit("Anonymous"));
        assert_eq!(serde_json::to_value(&typed).unwrap(), json!({"type": "Anonymous"}));

        let typed: Typed<Value> =
            serde_json::from_value(json!({"type": "Ssh", "spec": {"sshKeyRef": "k"}})).unwrap();
        assert!(typed.clone().into_spec("UsernameToken").is_none());
        assert_eq!(typed.into_spec("Ssh"), Some(json!({"sshKeyRef": "k"})));
    }

    #[test]
    fn test_state_with_null_collections() {
        let state: ConnectorState<<Github as ConnectorKind>::Fields> = serde_json::from_value(json!({
            "identifier": "conn1",
            "tags": null,
            "delegate_selectors": null,
            "credentials": null
        }))
        .unwrap();
        assert!(state.meta.tags.is_empty());
        assert!(state.delegate_selectors.is_empty());
    }
}
