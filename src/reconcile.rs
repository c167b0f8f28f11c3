//! Generic CRUD reconciliation.
//!
//! A resource type is described once by a [`ResourceHandler`]: its schema,
//! how to call the API, and how to copy a response onto typed state. The
//! functions here implement the create/update/read/delete cycle for every
//! handler, and [`DynResource`] erases the handler's types so the provider
//! can dispatch by type name on raw JSON state.
//!
//! State handed back to the framework always reflects the backend after a
//! successful call. Work happens on a clone of the incoming state, so a
//! failed call never leaves a half-updated document behind.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::client::ApiClient;
use crate::error::{ProviderError, ProviderResult};
use crate::schema::{Diagnostic, Schema};
use crate::types::{parse_import_id, LookupKey, Scope};
use crate::validation;

/// Lookup attributes of a data source that can only be read by identifier.
pub const IDENTIFIER_LOOKUP: &[&str] = &["identifier", "org_id", "project_id"];

/// Lookup attributes of a data source that can also be read by name.
pub const NAME_LOOKUP: &[&str] = &["identifier", "name", "org_id", "project_id"];

/// Typed state of one resource type.
pub trait ResourceState: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The stored id, present once the entity exists remotely.
    fn stored_id(&self) -> Option<&str>;

    /// How to find the entity: by identifier when known, else by name.
    fn lookup_key(&self) -> Option<LookupKey>;

    /// The org/project the entity lives in.
    fn scope(&self) -> Scope;

    /// Minimal state addressing an entity to import.
    fn for_import(scope: Scope, identifier: &str) -> Self;
}

/// API calls and field mapping for one resource type.
#[async_trait]
pub trait ResourceHandler: Send + Sync + 'static {
    /// Typed state.
    type State: ResourceState;
    /// Entity as returned by the API.
    type Remote: Send;

    /// Resource and data source type name, e.g. `platform_repo`.
    fn type_name(&self) -> &'static str;

    /// Resource schema.
    fn schema(&self) -> Schema;

    /// Attributes that stay settable in the data source schema.
    fn lookup_fields(&self) -> &'static [&'static str] {
        IDENTIFIER_LOOKUP
    }

    /// Type-specific configuration checks beyond the schema.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Create the entity.
    async fn create(&self, client: &ApiClient, state: &Self::State) -> ProviderResult<Self::Remote>;

    /// Update the entity stored under `id`.
    async fn update(
        &self,
        client: &ApiClient,
        id: &str,
        state: &Self::State,
    ) -> ProviderResult<Self::Remote>;

    /// Fetch the entity by identifier.
    async fn get(&self, client: &ApiClient, scope: &Scope, identifier: &str) -> ProviderResult<Self::Remote>;

    /// Find the first entity with exactly this name. Types that cannot be
    /// listed by name report nothing found.
    async fn find_by_name(
        &self,
        client: &ApiClient,
        scope: &Scope,
        name: &str,
    ) -> ProviderResult<Option<Self::Remote>> {
        let _ = (client, scope, name);
        Ok(None)
    }

    /// Delete the entity stored under `id`.
    async fn delete(&self, client: &ApiClient, scope: &Scope, id: &str) -> ProviderResult<()>;

    /// Overwrite every mapped field of `state` from the API response.
    fn flatten(&self, remote: Self::Remote, state: &mut Self::State) -> ProviderResult<()>;
}

/// Create the entity when there is no stored id, update it otherwise, and
/// return the state rebuilt from the response.
#[instrument(skip_all, fields(resource = handler.type_name(), id = stored_id))]
pub async fn apply<H: ResourceHandler>(
    handler: &H,
    client: &ApiClient,
    stored_id: Option<&str>,
    planned: &H::State,
) -> ProviderResult<H::State> {
    let remote = match stored_id {
        None => {
            debug!("no stored id, creating");
            handler.create(client, planned).await?
        },
        Some(id) => {
            debug!("stored id present, updating");
            handler.update(client, id, planned).await?
        },
    };

    let mut next = planned.clone();
    handler.flatten(remote, &mut next)?;
    info!(id = next.stored_id(), "resource applied");
    Ok(next)
}

/// Refresh state from the backend.
///
/// Returns `None` when the entity is gone (HTTP 404 or no name match) or
/// when the state has neither identifier nor name to look it up by.
#[instrument(skip_all, fields(resource = handler.type_name()))]
pub async fn read<H: ResourceHandler>(
    handler: &H,
    client: &ApiClient,
    current: &H::State,
) -> ProviderResult<Option<H::State>> {
    let scope = current.scope();
    let remote = match current.lookup_key() {
        None => {
            debug!("no identifier or name in state, treating as absent");
            return Ok(None);
        },
        Some(LookupKey::Identifier(identifier)) => {
            match handler.get(client, &scope, &identifier).await {
                Ok(remote) => Some(remote),
                Err(err) if err.is_not_found() => {
                    info!(%identifier, "resource no longer exists");
                    None
                },
                Err(err) => return Err(err),
            }
        },
        Some(LookupKey::Name(name)) => {
            let found = handler.find_by_name(client, &scope, &name).await?;
            if found.is_none() {
                info!(%name, "no resource with this name");
            }
            found
        },
    };

    match remote {
        Some(remote) => {
            let mut next = current.clone();
            handler.flatten(remote, &mut next)?;
            Ok(Some(next))
        },
        None => Ok(None),
    }
}

/// Delete the entity. An entity that is already gone counts as deleted.
#[instrument(skip_all, fields(resource = handler.type_name()))]
pub async fn delete<H: ResourceHandler>(
    handler: &H,
    client: &ApiClient,
    current: &H::State,
) -> ProviderResult<()> {
    let Some(id) = current.stored_id() else {
        debug!("no stored id, nothing to delete");
        return Ok(());
    };

    match handler.delete(client, &current.scope(), id).await {
        Ok(()) => {
            info!(id, "resource deleted");
            Ok(())
        },
        Err(err) if err.is_not_found() => {
            info!(id, "resource already deleted");
            Ok(())
        },
        Err(err) => Err(err),
    }
}

/// Type-erased resource, dispatched by the provider on raw JSON.
///
/// Each resource type doubles as the data source of the same name.
#[async_trait]
pub trait DynResource: Send + Sync {
    /// Resource type name.
    fn type_name(&self) -> &'static str;

    /// Resource schema.
    fn schema(&self) -> Schema;

    /// Data source schema.
    fn data_source_schema(&self) -> Schema;

    /// Validate a resource configuration.
    fn validate(&self, config: &Value) -> Vec<Diagnostic>;

    /// Validate a data source configuration.
    fn validate_data_source(&self, config: &Value) -> Vec<Diagnostic>;

    /// Create from planned state.
    async fn create(&self, client: &ApiClient, planned: Value) -> ProviderResult<Value>;

    /// Refresh state; `None` means the entity is absent.
    async fn read(&self, client: &ApiClient, current: Value) -> ProviderResult<Option<Value>>;

    /// Update from prior to planned state.
    async fn update(&self, client: &ApiClient, prior: Value, planned: Value) -> ProviderResult<Value>;

    /// Delete.
    async fn delete(&self, client: &ApiClient, current: Value) -> ProviderResult<()>;

    /// Import by `identifier`, `org_id/identifier` or `org_id/project_id/identifier`.
    async fn import(&self, client: &ApiClient, id: &str) -> ProviderResult<Value>;

    /// Read as a data source.
    async fn read_data_source(&self, client: &ApiClient, config: Value) -> ProviderResult<Value>;
}

/// Adapts a [`ResourceHandler`] to [`DynResource`].
pub struct TypedResource<H> {
    handler: H,
}

impl<H: ResourceHandler> TypedResource<H> {
    /// Wrap a handler.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    fn decode(&self, value: Value) -> ProviderResult<H::State> {
        serde_json::from_value(value).map_err(|err| {
            ProviderError::InvalidRequest(format!(
                "malformed {} state: {}",
                self.handler.type_name(),
                err
            ))
        })
    }
}

fn encode<S: ResourceState>(state: &S) -> ProviderResult<Value> {
    Ok(serde_json::to_value(state)?)
}

#[async_trait]
impl<H: ResourceHandler> DynResource for TypedResource<H> {
    fn type_name(&self) -> &'static str {
        self.handler.type_name()
    }

    fn schema(&self) -> Schema {
        self.handler.schema()
    }

    fn data_source_schema(&self) -> Schema {
        self.handler
            .schema()
            .into_data_source(self.handler.lookup_fields())
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate_resource_config(&self.handler.schema(), config);
        diagnostics.extend(self.handler.validate(config));
        diagnostics
    }

    fn validate_data_source(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.data_source_schema(), config);
        diagnostics.extend(validation::validate_scope(config));
        diagnostics
    }

    async fn create(&self, client: &ApiClient, planned: Value) -> ProviderResult<Value> {
        let planned = self.decode(planned)?;
        encode(&apply(&self.handler, client, None, &planned).await?)
    }

    async fn read(&self, client: &ApiClient, current: Value) -> ProviderResult<Option<Value>> {
        let current = self.decode(current)?;
        match read(&self.handler, client, &current).await? {
            Some(state) => Ok(Some(encode(&state)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, client: &ApiClient, prior: Value, planned: Value) -> ProviderResult<Value> {
        let prior = self.decode(prior)?;
        let planned = self.decode(planned)?;
        encode(&apply(&self.handler, client, prior.stored_id(), &planned).await?)
    }

    async fn delete(&self, client: &ApiClient, current: Value) -> ProviderResult<()> {
        let current = self.decode(current)?;
        delete(&self.handler, client, &current).await
    }

    async fn import(&self, client: &ApiClient, id: &str) -> ProviderResult<Value> {
        let (scope, identifier) = parse_import_id(id)?;
        let seed = H::State::for_import(scope, &identifier);
        match read(&self.handler, client, &seed).await? {
            Some(state) => encode(&state),
            None => Err(ProviderError::NotFound(format!(
                "{} '{}'",
                self.handler.type_name(),
                id
            ))),
        }
    }

    async fn read_data_source(&self, client: &ApiClient, config: Value) -> ProviderResult<Value> {
        let query = self.decode(config)?;
        let Some(key) = query.lookup_key() else {
            return Err(ProviderError::Validation(
                "Either identifier or name must be specified".to_string(),
            ));
        };

        match read(&self.handler, client, &query).await? {
            Some(state) => encode(&state),
            None => {
                let key = match key {
                    LookupKey::Identifier(identifier) => format!("identifier '{}'", identifier),
                    LookupKey::Name(name) => format!("name '{}'", name),
                };
                Err(ProviderError::NotFound(format!(
                    "{} with {}",
                    self.handler.type_name(),
                    key
                )))
            },
        }
    }
}
