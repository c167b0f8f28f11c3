use reqwest::Method;

use super::models::{Page, ResponseDto, ServiceAccount, ServiceAccountAggregate};
use super::ApiClient;
use crate::error::ProviderResult;
use crate::types::Scope;

fn service_accounts_path<'a>(tail: &[&'a str]) -> Vec<&'a str> {
    let mut path = vec!["ng", "api", "serviceaccount"];
    path.extend_from_slice(tail);
    path
}

fn resource(identifier: &str) -> String {
    format!("service account '{}'", identifier)
}

impl ApiClient {
    /// Create a service account.
    pub async fn create_service_account(
        &self,
        scope: &Scope,
        account: &ServiceAccount,
    ) -> ProviderResult<ServiceAccount> {
        let request = self
            .request(Method::POST, &service_accounts_path(&[]), scope)?
            .json(account);
        let response: ResponseDto<ServiceAccount> =
            self.execute(request, &resource(&account.identifier)).await?;
        Ok(response.data)
    }

    /// Fetch a service account by identifier.
    pub async fn get_service_account(
        &self,
        scope: &Scope,
        identifier: &str,
    ) -> ProviderResult<ServiceAccount> {
        let request = self.request(Method::GET, &service_accounts_path(&[identifier]), scope)?;
        let response: ResponseDto<ServiceAccount> =
            self.execute(request, &resource(identifier)).await?;
        Ok(response.data)
    }

    /// Fetch one page of service accounts whose name or identifier contains `search_term`.
    pub async fn list_service_accounts(
        &self,
        scope: &Scope,
        search_term: &str,
        page_index: i32,
        page_size: i32,
    ) -> ProviderResult<Page<ServiceAccountAggregate>> {
        let request = self
            .request(Method::GET, &service_accounts_path(&["aggregate"]), scope)?
            .query(&[("searchTerm", search_term)])
            .query(&[("pageIndex", page_index), ("pageSize", page_size)]);
        let response: ResponseDto<Page<ServiceAccountAggregate>> =
            self.execute(request, "service account list").await?;
        Ok(response.data)
    }

    /// Replace a service account.
    pub async fn update_service_account(
        &self,
        scope: &Scope,
        identifier: &str,
        account: &ServiceAccount,
    ) -> ProviderResult<ServiceAccount> {
        let request = self
            .request(Method::PUT, &service_accounts_path(&[identifier]), scope)?
            .json(account);
        let response: ResponseDto<ServiceAccount> =
            self.execute(request, &resource(identifier)).await?;
        Ok(response.data)
    }

    /// Delete a service account.
    pub async fn delete_service_account(&self, scope: &Scope, identifier: &str) -> ProviderResult<()> {
        let request = self.request(Method::DELETE, &service_accounts_path(&[identifier]), scope)?;
        self.execute_unit(request, &resource(identifier)).await
    }
}
