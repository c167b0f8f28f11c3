//! `platform_connector_github`: a GitHub account or repository.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::models::ConnectorType;
use crate::mapping::{null_default, non_empty, Field, FieldKind};
use crate::schema::{Block, Diagnostic, NestedBlock};
use crate::validation::validate_one_of;

use super::{some_if_set, ConnectorKind, Typed};

/// Resource type name.
pub const GITHUB_TYPE: &str = "platform_connector_github";

const CONNECTION_TYPES: &[&str] = &["Account", "Repo"];

const GITHUB_FIELDS: &[Field] = &[
    Field::required("url", FieldKind::String, "URL of the GitHub account or repository."),
    Field::required(
        "connection_type",
        FieldKind::String,
        "Whether the connection is to an account or a single repository. Valid values are Account and Repo.",
    ),
    Field::optional(
        "validation_repo",
        FieldKind::String,
        "Repository to test the connection with. Required when connection_type is Account.",
    ),
    Field::optional(
        "api_token_ref",
        FieldKind::String,
        "Reference to the secret holding the personal access token used for API access.",
    ),
];

const CREDENTIAL_FIELDS: &[Field] = &[
    Field::required("username", FieldKind::String, "Username to use for authentication."),
    Field::required(
        "token_ref",
        FieldKind::String,
        "Reference to the secret holding the personal access token.",
    ),
];

/// HTTP credentials of a GitHub connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GithubCredentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token_ref: Option<String>,
}

/// GitHub-specific state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GithubFields {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub connection_type: Option<String>,
    #[serde(default)]
    pub validation_repo: Option<String>,
    #[serde(default)]
    pub api_token_ref: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub credentials: Vec<GithubCredentials>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameToken {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRef {
    #[serde(default)]
    pub token_ref: Option<String>,
}

/// The `spec` of a Github connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubSpec {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_repo: Option<String>,
    #[serde(default, rename = "type")]
    pub connection_type: Option<String>,
    #[serde(default)]
    pub authentication: Option<Typed<Typed<UsernameToken>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_access: Option<Typed<TokenRef>>,
}

/// [`ConnectorKind`] for GitHub.
#[derive(Debug, Clone, Copy, Default)]
pub struct Github;

impl ConnectorKind for Github {
    const TYPE_NAME: &'static str = GITHUB_TYPE;
    const CONNECTOR_TYPE: ConnectorType = ConnectorType::Github;
    const DESCRIPTION: &'static str = "Resource for creating a Github connector.";

    type Fields = GithubFields;
    type Spec = GithubSpec;

    fn fields() -> &'static [Field] {
        GITHUB_FIELDS
    }

    fn blocks() -> Vec<(&'static str, NestedBlock)> {
        vec![(
            "credentials",
            NestedBlock::list(
                Block::new()
                    .with_fields(CREDENTIAL_FIELDS)
                    .with_description("Credentials to use for the connection."),
            )
            .with_min_items(1)
            .with_max_items(1),
        )]
    }

    fn build_spec(fields: &GithubFields) -> GithubSpec {
        let authentication = fields.credentials.first().map(|credentials| {
            Typed::new(
                "Http",
                Typed::new(
                    "UsernameToken",
                    UsernameToken {
                        username: credentials.username.clone(),
                        token_ref: credentials.token_ref.clone(),
                    },
                ),
            )
        });
        let api_access = non_empty(&fields.api_token_ref).map(|token_ref| {
            Typed::new(
                "Token",
                TokenRef {
                    token_ref: Some(token_ref.to_string()),
                },
            )
        });

        GithubSpec {
            url: fields.url.clone(),
            validation_repo: non_empty(&fields.validation_repo).map(str::to_string),
            connection_type: fields.connection_type.clone(),
            authentication,
            api_access,
        }
    }

    fn read_spec(spec: GithubSpec, fields: &mut GithubFields) {
        fields.url = spec.url;
        fields.connection_type = spec.connection_type;
        fields.validation_repo = some_if_set(spec.validation_repo);
        fields.api_token_ref = spec
            .api_access
            .and_then(|access| access.into_spec("Token"))
            .and_then(|token| some_if_set(token.token_ref));

        let credentials = spec
            .authentication
            .and_then(|auth| auth.into_spec("Http"))
            .and_then(|http| http.into_spec("UsernameToken"));
        fields.credentials = match credentials {
            Some(credentials) => vec![GithubCredentials {
                username: credentials.username,
                token_ref: credentials.token_ref,
            }],
            None => Vec::new(),
        };
    }

    fn validate(config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> =
            validate_one_of(config, "connection_type", CONNECTION_TYPES)
                .into_iter()
                .collect();

        let is_account = config.get("connection_type").and_then(Value::as_str) == Some("Account");
        let has_validation_repo = config
            .get("validation_repo")
            .and_then(Value::as_str)
            .is_some_and(|repo| !repo.is_empty());
        if is_account && !has_validation_repo {
            diagnostics.push(
                Diagnostic::error("validation_repo is required when connection_type is Account")
                    .with_attribute("validation_repo"),
            );
        }
        diagnostics
    }
}
