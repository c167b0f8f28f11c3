//! Resource handlers for every platform entity the provider manages.

use serde::{Deserialize, Serialize};

use crate::mapping::{non_empty, null_default};
use crate::types::{LookupKey, Scope};

pub mod connector;
pub mod repository;
pub mod service_account;

pub use connector::{
    AzureCloudProvider, ConnectorResource, Docker, Github, AZURE_CLOUD_PROVIDER_TYPE,
    DOCKER_TYPE, GITHUB_TYPE,
};
pub use repository::{RepositoryHandler, RepositoryState, REPOSITORY_TYPE};
pub use service_account::{ServiceAccountHandler, ServiceAccountState, SERVICE_ACCOUNT_TYPE};

/// Attributes shared by named, tagged entities. Flattened into each state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl EntityMeta {
    /// Meta addressing an entity to import.
    pub fn for_import(scope: Scope, identifier: &str) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            org_id: scope.org_id,
            project_id: scope.project_id,
            ..Default::default()
        }
    }

    pub fn stored_id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    /// Identifier (or stored id) first, then name.
    pub fn lookup_key(&self) -> Option<LookupKey> {
        non_empty(&self.identifier)
            .or(self.stored_id())
            .map(|identifier| LookupKey::Identifier(identifier.to_string()))
            .or_else(|| non_empty(&self.name).map(|name| LookupKey::Name(name.to_string())))
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.org_id.as_deref(), self.project_id.as_deref())
    }

    /// The identifier to send on create, falling back to the stored id.
    pub fn identifier(&self) -> &str {
        non_empty(&self.identifier)
            .or(self.stored_id())
            .unwrap_or_default()
    }

    /// Copy the common fields of a remote entity. The stored id is the identifier.
    pub fn overwrite(
        &mut self,
        identifier: &str,
        name: &str,
        description: Option<&str>,
        tags: Vec<String>,
        scope: Scope,
    ) {
        self.id = Some(identifier.to_string());
        self.identifier = Some(identifier.to_string());
        self.name = Some(name.to_string());
        self.description = description.filter(|d| !d.is_empty()).map(str::to_string);
        self.tags = tags;
        self.org_id = scope.org_id;
        self.project_id = scope.project_id;
    }
}

/// Forward [`crate::reconcile::ResourceState`] to an `EntityMeta` field.
macro_rules! entity_state {
    ($state:ty, $meta:ident) => {
        impl $crate::reconcile::ResourceState for $state {
            fn stored_id(&self) -> Option<&str> {
                self.$meta.stored_id()
            }

            fn lookup_key(&self) -> Option<$crate::types::LookupKey> {
                self.$meta.lookup_key()
            }

            fn scope(&self) -> $crate::types::Scope {
                self.$meta.scope()
            }

            fn for_import(scope: $crate::types::Scope, identifier: &str) -> Self {
                let mut state = Self::default();
                state.$meta = $crate::resources::EntityMeta::for_import(scope, identifier);
                state
            }
        }
    };
}

pub(crate) use entity_state;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_key_prefers_identifier() {
        let meta: EntityMeta =
            serde_json::from_value(json!({"identifier": "conn1", "name": "Conn 1"})).unwrap();
        assert_eq!(meta.lookup_key(), Some(LookupKey::Identifier("conn1".to_string())));

        let meta: EntityMeta =
            serde_json::from_value(json!({"identifier": "", "name": "Conn 1", "tags": null}))
                .unwrap();
        assert_eq!(meta.lookup_key(), Some(LookupKey::Name("Conn 1".to_string())));

        assert_eq!(EntityMeta::default().lookup_key(), None);
    }

    #[test]
    fn test_overwrite_sets_stored_id() {
        let mut meta = EntityMeta {
            description: Some("old".to_string()),
            ..Default::default()
        };
        meta.overwrite(
            "sa1",
            "Service Account 1",
            Some(""),
            vec!["team:core".to_string()],
            Scope::new(Some("default"), None),
        );

        assert_eq!(meta.stored_id(), Some("sa1"));
        assert_eq!(meta.identifier(), "sa1");
        assert!(meta.description.is_none());
        assert_eq!(meta.org_id.as_deref(), Some("default"));
        assert!(meta.project_id.is_none());
    }
}
