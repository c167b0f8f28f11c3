//! `platform_repo`: code repositories.
//!
//! A repository is created empty, or imported from another SCM when the
//! `source` block names a repo to import. Only `description`, `is_public` and
//! `default_branch` can change afterwards; `readme`, `license`, `git_ignore` and `source` only
//! matter at creation and are never returned by the API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::models::{
    CreateRepositoryBody, ImportProvider, ImportRepositoryBody, Repository, UpdateRepositoryBody,
};
use crate::client::ApiClient;
use crate::error::ProviderResult;
use crate::mapping::{non_empty, null_default, Field, FieldKind, ID_FIELD, SCOPE_FIELDS};
use crate::reconcile::{ResourceHandler, ResourceState};
use crate::schema::{Block, Diagnostic, NestedBlock, Schema};
use crate::types::{LookupKey, Scope};

/// Resource type name.
pub const REPOSITORY_TYPE: &str = "platform_repo";

const REPOSITORY_FIELDS: &[Field] = &[
    ID_FIELD,
    Field::required("identifier", FieldKind::String, "Identifier of the repository.").force_new(),
    Field::computed("name", FieldKind::String, "Name of the repository, equal to its identifier."),
    Field::optional_computed("default_branch", FieldKind::String, "Default branch of the repository."),
    Field::optional("description", FieldKind::String, "Description of the repository."),
    Field::optional_computed("is_public", FieldKind::Bool, "Whether the repository is public."),
    Field::optional("readme", FieldKind::Bool, "Whether to create the repository with a readme."),
    Field::optional("license", FieldKind::String, "License to create the repository with."),
    Field::optional("git_ignore", FieldKind::String, "Gitignore template to create the repository with."),
    Field::computed("repo_id", FieldKind::Int, "Numeric id of the repository."),
    Field::computed("created", FieldKind::Int, "Timestamp when the repository was created."),
    Field::computed("created_by", FieldKind::Int, "ID of the user who created the repository."),
    Field::computed("updated", FieldKind::Int, "Timestamp when the repository was last updated."),
    Field::computed("git_url", FieldKind::String, "Git URL of the repository."),
    Field::computed("path", FieldKind::String, "Path of the repository."),
    Field::computed("importing", FieldKind::Bool, "Whether the repository is being imported."),
    Field::computed("num_pulls", FieldKind::Int, "Total number of pull requests."),
    Field::computed("num_open_pulls", FieldKind::Int, "Number of open pull requests."),
    Field::computed("num_closed_pulls", FieldKind::Int, "Number of closed pull requests."),
    Field::computed("num_merged_pulls", FieldKind::Int, "Number of merged pull requests."),
    Field::computed("num_forks", FieldKind::Int, "Number of forks."),
    Field::computed("size", FieldKind::Int, "Size of the repository."),
    Field::computed("size_updated", FieldKind::Int, "Timestamp when the size was last updated."),
];

const SOURCE_FIELDS: &[Field] = &[
    Field::optional("repo", FieldKind::String, "The provider repository to import from."),
    Field::optional("type", FieldKind::String, "The type of SCM provider, e.g. github."),
    Field::optional("host", FieldKind::String, "The host URL of the import source."),
    Field::optional("username", FieldKind::String, "Username used to authenticate the import."),
    Field::optional("password", FieldKind::String, "Password used to authenticate the import.")
        .sensitive(),
];

/// Where to import a repository from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositorySource {
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default, rename = "type")]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// State of a `platform_repo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryState {
    pub id: Option<String>,
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
    pub default_branch: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub readme: Option<bool>,
    pub license: Option<String>,
    pub git_ignore: Option<String>,
    pub repo_id: Option<i64>,
    pub created: Option<i64>,
    pub created_by: Option<i64>,
    pub updated: Option<i64>,
    pub git_url: Option<String>,
    pub path: Option<String>,
    pub importing: Option<bool>,
    pub num_pulls: Option<i64>,
    pub num_open_pulls: Option<i64>,
    pub num_closed_pulls: Option<i64>,
    pub num_merged_pulls: Option<i64>,
    pub num_forks: Option<i64>,
    pub size: Option<i64>,
    pub size_updated: Option<i64>,
    #[serde(deserialize_with = "null_default")]
    pub source: Vec<RepositorySource>,
}

impl RepositoryState {
    fn identifier(&self) -> &str {
        non_empty(&self.identifier)
            .or(self.stored_id())
            .unwrap_or_default()
    }

    /// The source to import from, if the `source` block names a repo.
    pub fn import_source(&self) -> Option<&RepositorySource> {
        self.source
            .first()
            .filter(|source| non_empty(&source.repo).is_some())
    }

    fn create_body(&self) -> CreateRepositoryBody {
        CreateRepositoryBody {
            identifier: self.identifier().to_string(),
            default_branch: self.default_branch.clone(),
            description: self.description.clone(),
            is_public: self.is_public,
            readme: self.readme,
            license: self.license.clone(),
            git_ignore: self.git_ignore.clone(),
        }
    }

    fn import_body(&self, source: &RepositorySource) -> ImportRepositoryBody {
        ImportRepositoryBody {
            identifier: self.identifier().to_string(),
            description: self.description.clone(),
            provider: ImportProvider {
                host: source.host.clone(),
                password: source.password.clone(),
                provider_type: source.provider_type.clone(),
                username: source.username.clone(),
            },
            provider_repo: source.repo.clone().unwrap_or_default(),
        }
    }

    fn update_body(&self) -> UpdateRepositoryBody {
        UpdateRepositoryBody {
            description: self.description.clone(),
            is_public: self.is_public,
            default_branch: self.default_branch.clone(),
        }
    }
}

// A repository's name is its identifier, so there is no separate name lookup.
impl ResourceState for RepositoryState {
    fn stored_id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    fn lookup_key(&self) -> Option<LookupKey> {
        non_empty(&self.identifier)
            .or(self.stored_id())
            .map(|identifier| LookupKey::Identifier(identifier.to_string()))
    }

    fn scope(&self) -> Scope {
        Scope::new(self.org_id.as_deref(), self.project_id.as_deref())
    }

    fn for_import(scope: Scope, identifier: &str) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            org_id: scope.org_id,
            project_id: scope.project_id,
            ..Default::default()
        }
    }
}

/// Handler for `platform_repo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoryHandler;

#[async_trait]
impl ResourceHandler for RepositoryHandler {
    type State = RepositoryState;
    type Remote = Repository;

    fn type_name(&self) -> &'static str {
        REPOSITORY_TYPE
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_fields(REPOSITORY_FIELDS)
            .with_fields(SCOPE_FIELDS)
            .with_block(
                "source",
                NestedBlock::list(
                    Block::new()
                        .with_fields(SOURCE_FIELDS)
                        .with_description("Remote repository to import from."),
                )
                .with_max_items(1),
            )
            .with_description("Resource for creating a code repository.")
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let source = config
            .get("source")
            .and_then(Value::as_array)
            .and_then(|blocks| blocks.first());
        let names_repo = source
            .and_then(|s| s.get("repo"))
            .and_then(Value::as_str)
            .is_some_and(|repo| !repo.is_empty());

        match source {
            Some(_) if !names_repo => vec![Diagnostic::warning(
                "source block without a repo creates an empty repository",
            )
            .with_attribute("source.0.repo")],
            _ => Vec::new(),
        }
    }

    async fn create(&self, client: &ApiClient, state: &RepositoryState) -> ProviderResult<Repository> {
        let scope = state.scope();
        match state.import_source() {
            Some(source) => {
                tracing::debug!(repo = ?source.repo, "importing repository");
                client.import_repository(&scope, &state.import_body(source)).await
            },
            None => client.create_repository(&scope, &state.create_body()).await,
        }
    }

    async fn update(
        &self,
        client: &ApiClient,
        id: &str,
        state: &RepositoryState,
    ) -> ProviderResult<Repository> {
        client
            .update_repository(&state.scope(), id, &state.update_body())
            .await
    }

    async fn get(&self, client: &ApiClient, scope: &Scope, identifier: &str) -> ProviderResult<Repository> {
        client.get_repository(scope, identifier).await
    }

    async fn delete(&self, client: &ApiClient, scope: &Scope, id: &str) -> ProviderResult<()> {
        client.delete_repository(scope, id).await
    }

    fn flatten(&self, remote: Repository, state: &mut RepositoryState) -> ProviderResult<()> {
        state.id = Some(remote.identifier.clone());
        state.name = Some(remote.identifier.clone());
        state.identifier = Some(remote.identifier);
        state.repo_id = Some(remote.id);
        state.default_branch = Some(remote.default_branch).filter(|b| !b.is_empty());
        state.description = Some(remote.description).filter(|d| !d.is_empty());
        state.is_public = Some(remote.is_public);
        state.created = Some(remote.created);
        state.created_by = Some(remote.created_by);
        state.updated = Some(remote.updated);
        state.git_url = Some(remote.git_url);
        state.path = Some(remote.path);
        state.importing = Some(remote.importing);
        state.num_pulls = Some(remote.num_pulls);
        state.num_open_pulls = Some(remote.num_open_pulls);
        state.num_closed_pulls = Some(remote.num_closed_pulls);
        state.num_merged_pulls = Some(remote.num_merged_pulls);
        state.num_forks = Some(remote.num_forks);
        state.size = Some(remote.size);
        state.size_updated = Some(remote.size_updated);
        Ok(())
    }
}
