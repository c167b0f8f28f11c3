//! `platform_service_account`: non-human accounts used by automation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::models::ServiceAccount;
use crate::client::ApiClient;
use crate::error::ProviderResult;
use crate::lookup::{find_first_by_name, DEFAULT_PAGE_SIZE};
use crate::mapping::{expand_tags, flatten_tags, Field, FieldKind, ENTITY_FIELDS, SCOPE_FIELDS};
use crate::reconcile::{ResourceHandler, NAME_LOOKUP};
use crate::schema::Schema;
use crate::types::Scope;

use super::{entity_state, EntityMeta};

/// Resource type name.
pub const SERVICE_ACCOUNT_TYPE: &str = "platform_service_account";

const SERVICE_ACCOUNT_FIELDS: &[Field] = &[
    Field::required("email", FieldKind::String, "Email of the service account."),
    Field::computed(
        "account_id",
        FieldKind::String,
        "Account the service account belongs to.",
    ),
];

/// State of a `platform_service_account`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccountState {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

entity_state!(ServiceAccountState, meta);

impl ServiceAccountState {
    fn body(&self, account_id: &str) -> ServiceAccount {
        let scope = self.meta.scope();
        ServiceAccount {
            identifier: self.meta.identifier().to_string(),
            name: self.meta.name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            description: self.meta.description.clone(),
            tags: expand_tags(&self.meta.tags),
            account_identifier: account_id.to_string(),
            org_identifier: scope.org_id,
            project_identifier: scope.project_id,
        }
    }
}

/// Handler for `platform_service_account`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceAccountHandler;

#[async_trait]
impl ResourceHandler for ServiceAccountHandler {
    type State = ServiceAccountState;
    type Remote = ServiceAccount;

    fn type_name(&self) -> &'static str {
        SERVICE_ACCOUNT_TYPE
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_fields(ENTITY_FIELDS)
            .with_fields(SCOPE_FIELDS)
            .with_fields(SERVICE_ACCOUNT_FIELDS)
            .with_description("Resource for creating a service account.")
    }

    fn lookup_fields(&self) -> &'static [&'static str] {
        NAME_LOOKUP
    }

    async fn create(&self, client: &ApiClient, state: &ServiceAccountState) -> ProviderResult<ServiceAccount> {
        client
            .create_service_account(&state.meta.scope(), &state.body(client.account_id()))
            .await
    }

    async fn update(
        &self,
        client: &ApiClient,
        id: &str,
        state: &ServiceAccountState,
    ) -> ProviderResult<ServiceAccount> {
        client
            .update_service_account(&state.meta.scope(), id, &state.body(client.account_id()))
            .await
    }

    async fn get(&self, client: &ApiClient, scope: &Scope, identifier: &str) -> ProviderResult<ServiceAccount> {
        client.get_service_account(scope, identifier).await
    }

    async fn find_by_name(
        &self,
        client: &ApiClient,
        scope: &Scope,
        name: &str,
    ) -> ProviderResult<Option<ServiceAccount>> {
        let found = find_first_by_name(name, DEFAULT_PAGE_SIZE, |page_index, page_size| {
            client.list_service_accounts(scope, name, page_index, page_size)
        })
        .await?;
        Ok(found.map(|aggregate| aggregate.service_account))
    }

    async fn delete(&self, client: &ApiClient, scope: &Scope, id: &str) -> ProviderResult<()> {
        client.delete_service_account(scope, id).await
    }

    fn flatten(&self, remote: ServiceAccount, state: &mut ServiceAccountState) -> ProviderResult<()> {
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
        state.email = Some(remote.email);
        state.account_id = Some(remote.account_identifier).filter(|a| !a.is_empty());
        Ok(())
    }
}
