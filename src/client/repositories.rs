use reqwest::Method;

use super::models::{CreateRepositoryBody, ImportRepositoryBody, Repository, UpdateRepositoryBody};
use super::ApiClient;
use crate::error::ProviderResult;
use crate::types::Scope;

fn repos_path<'a>(tail: &[&'a str]) -> Vec<&'a str> {
    let mut path = vec!["code", "api", "v1", "repos"];
    path.extend_from_slice(tail);
    path
}

fn resource(identifier: &str) -> String {
    format!("repository '{}'", identifier)
}

impl ApiClient {
    /// Create an empty repository.
    pub async fn create_repository(
        &self,
        scope: &Scope,
        body: &CreateRepositoryBody,
    ) -> ProviderResult<Repository> {
        let request = self.request(Method::POST, &repos_path(&[]), scope)?.json(body);
        self.execute(request, &resource(&body.identifier)).await
    }

    /// Import a repository from a remote SCM.
    pub async fn import_repository(
        &self,
        scope: &Scope,
        body: &ImportRepositoryBody,
    ) -> ProviderResult<Repository> {
        let path = repos_path(&["import"]);
        let request = self.request(Method::POST, &path, scope)?.json(body);
        self.execute(request, &resource(&body.identifier)).await
    }

    /// Fetch a repository by identifier.
    pub async fn get_repository(&self, scope: &Scope, identifier: &str) -> ProviderResult<Repository> {
        let path = repos_path(&[identifier]);
        let request = self.request(Method::GET, &path, scope)?;
        self.execute(request, &resource(identifier)).await
    }

    /// Update the mutable settings of a repository.
    pub async fn update_repository(
        &self,
        scope: &Scope,
        identifier: &str,
        body: &UpdateRepositoryBody,
    ) -> ProviderResult<Repository> {
        let path = repos_path(&[identifier]);
        let request = self.request(Method::PATCH, &path, scope)?.json(body);
        self.execute(request, &resource(identifier)).await
    }

    /// Delete a repository.
    pub async fn delete_repository(&self, scope: &Scope, identifier: &str) -> ProviderResult<()> {
        let path = repos_path(&[identifier]);
        let request = self.request(Method::DELETE, &path, scope)?;
        self.execute_unit(request, &resource(identifier)).await
    }
}
