use reqwest::Method;

use super::models::{
    ConnectorFilter, ConnectorInfo, ConnectorRequest, ConnectorResponse, Page, ResponseDto,
};
use super::ApiClient;
use crate::error::ProviderResult;
use crate::types::Scope;

fn connectors_path<'a>(tail: &[&'a str]) -> Vec<&'a str> {
    let mut path = vec!["ng", "api", "connectors"];
    path.extend_from_slice(tail);
    path
}

fn resource(identifier: &str) -> String {
    format!("connector '{}'", identifier)
}

fn scope_of(connector: &ConnectorInfo) -> Scope {
    Scope::new(
        connector.org_identifier.as_deref(),
        connector.project_identifier.as_deref(),
    )
}

impl ApiClient {
    /// Create a connector. Scope is taken from the connector body.
    pub async fn create_connector(&self, connector: ConnectorInfo) -> ProviderResult<ConnectorResponse> {
        let label = resource(&connector.identifier);
        let request = self
            .request(Method::POST, &connectors_path(&[]), &scope_of(&connector))?
            .json(&ConnectorRequest { connector });
        let response: ResponseDto<ConnectorResponse> = self.execute(request, &label).await?;
        Ok(response.data)
    }

    /// Replace a connector. Scope is taken from the connector body.
    pub async fn update_connector(&self, connector: ConnectorInfo) -> ProviderResult<ConnectorResponse> {
        let label = resource(&connector.identifier);
        let request = self
            .request(Method::PUT, &connectors_path(&[]), &scope_of(&connector))?
            .json(&ConnectorRequest { connector });
        let response: ResponseDto<ConnectorResponse> = self.execute(request, &label).await?;
        Ok(response.data)
    }

    /// Fetch a connector by identifier.
    pub async fn get_connector(&self, scope: &Scope, identifier: &str) -> ProviderResult<ConnectorResponse> {
        let request = self.request(Method::GET, &connectors_path(&[identifier]), scope)?;
        let response: ResponseDto<ConnectorResponse> =
            self.execute(request, &resource(identifier)).await?;
        Ok(response.data)
    }

    /// Fetch one page of connectors matching `filter`.
    pub async fn list_connectors(
        &self,
        scope: &Scope,
        filter: &ConnectorFilter,
        page_index: i32,
        page_size: i32,
    ) -> ProviderResult<Page<ConnectorResponse>> {
        let request = self
            .request(Method::POST, &connectors_path(&["listV2"]), scope)?
            .query(&[("pageIndex", page_index), ("pageSize", page_size)])
            .json(filter);
        let response: ResponseDto<Page<ConnectorResponse>> =
            self.execute(request, "connector list").await?;
        Ok(response.data)
    }

    /// Delete a connector.
    pub async fn delete_connector(&self, scope: &Scope, identifier: &str) -> ProviderResult<()> {
        let request = self.request(Method::DELETE, &connectors_path(&[identifier]), scope)?;
        self.execute_unit(request, &resource(identifier)).await
    }
}
