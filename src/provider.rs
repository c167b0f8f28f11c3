//! The provider: resource registry, configured client and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::ApiClient;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::plan;
use crate::reconcile::{DynResource, TypedResource};
use crate::resources::{
    AzureCloudProvider, ConnectorResource, Docker, Github, RepositoryHandler, ServiceAccountHandler,
};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// Manages repositories, service accounts and connectors of one account.
pub struct PlatformProvider {
    resources: HashMap<&'static str, Box<dyn DynResource>>,
    client: RwLock<Option<Arc<ApiClient>>>,
}

impl Default for PlatformProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProvider {
    /// An unconfigured provider with every resource type registered.
    pub fn new() -> Self {
        let resources: Vec<Box<dyn DynResource>> = vec![
            Box::new(TypedResource::new(RepositoryHandler)),
            Box::new(TypedResource::new(ServiceAccountHandler)),
            Box::new(TypedResource::new(ConnectorResource::<AzureCloudProvider>::new())),
            Box::new(TypedResource::new(ConnectorResource::<Github>::new())),
            Box::new(TypedResource::new(ConnectorResource::<Docker>::new())),
        ];

        Self {
            resources: resources
                .into_iter()
                .map(|resource| (resource.type_name(), resource))
                .collect(),
            client: RwLock::new(None),
        }
    }

    /// A provider already configured with `client`.
    pub fn with_client(client: ApiClient) -> Self {
        Self {
            client: RwLock::new(Some(Arc::new(client))),
            ..Self::new()
        }
    }

    fn resource(&self, resource_type: &str) -> ProviderResult<&dyn DynResource> {
        self.resources
            .get(resource_type)
            .map(|resource| resource.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    async fn client(&self) -> ProviderResult<Arc<ApiClient>> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }
}

#[async_trait::async_trait]
impl ProviderService for PlatformProvider {
    fn schema(&self) -> ProviderSchema {
        self.resources.values().fold(
            ProviderSchema::new().with_provider_config(ProviderConfig::schema()),
            |schema, resource| {
                schema
                    .with_resource(resource.type_name(), resource.schema())
                    .with_data_source(resource.type_name(), resource.data_source_schema())
            },
        )
    }

    async fn validate_provider_config(&self, config: Value) -> ProviderResult<Vec<Diagnostic>> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }
        diagnostics.extend(ProviderConfig::from_value(config)?.diagnostics());
        Ok(diagnostics)
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> ProviderResult<Vec<Diagnostic>> {
        let diagnostics = self.validate_provider_config(config.clone()).await?;
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(count = diagnostics.len(), "provider configuration rejected");
            return Ok(diagnostics);
        }

        let client = match ProviderConfig::from_value(config)
            .and_then(ProviderConfig::resolve)
            .and_then(|resolved| ApiClient::new(&resolved))
        {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "provider configuration failed");
                return Ok(vec![err.to_diagnostic()]);
            },
        };

        info!(account_id = client.account_id(), "provider configured");
        *self.client.write().await = Some(Arc::new(client));
        Ok(diagnostics)
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> ProviderResult<Vec<Diagnostic>> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    #[instrument(skip(self, prior_state, proposed_state, _config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> ProviderResult<PlanResult> {
        let schema = self.resource(resource_type)?.schema();
        let result = plan::plan(&schema, prior_state.as_ref(), &proposed_state);
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "planned"
        );
        Ok(result)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> ProviderResult<Value> {
        let resource = self.resource(resource_type)?;
        resource.create(&*self.client().await?, planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> ProviderResult<Option<Value>> {
        let resource = self.resource(resource_type)?;
        resource.read(&*self.client().await?, current_state).await
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> ProviderResult<Value> {
        let resource = self.resource(resource_type)?;
        resource
            .update(&*self.client().await?, prior_state, planned_state)
            .await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> ProviderResult<()> {
        let resource = self.resource(resource_type)?;
        resource.delete(&*self.client().await?, current_state).await
    }

    #[instrument(skip(self))]
    async fn import_resource(&self, resource_type: &str, id: &str) -> ProviderResult<Vec<ImportedResource>> {
        let resource = self.resource(resource_type)?;
        let state = resource.import(&*self.client().await?, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> ProviderResult<Vec<Diagnostic>> {
        Ok(self.resource(data_source_type)?.validate_data_source(&config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(&self, data_source_type: &str, config: Value) -> ProviderResult<Value> {
        let resource = self.resource(data_source_type)?;
        resource.read_data_source(&*self.client().await?, config).await
    }
}
