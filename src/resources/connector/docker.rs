//! `platform_connector_docker`: a Docker registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::models::ConnectorType;
use crate::mapping::{null_default, Field, FieldKind};
use crate::schema::{Block, Diagnostic, NestedBlock};
use crate::validation::validate_one_of;

use super::{ConnectorKind, Typed};

/// Resource type name.
pub const DOCKER_TYPE: &str = "platform_connector_docker";

const PROVIDER_TYPES: &[&str] = &["DockerHub", "Harbor", "Quay", "Other"];

const DOCKER_FIELDS: &[Field] = &[
    Field::required("url", FieldKind::String, "The URL of the docker registry."),
    Field::required(
        "provider_type",
        FieldKind::String,
        "The type of the docker registry. Valid values are DockerHub, Harbor, Quay and Other.",
    ),
];

const CREDENTIAL_FIELDS: &[Field] = &[
    Field::required("username", FieldKind::String, "The username to use for the docker registry."),
    Field::required(
        "password_ref",
        FieldKind::String,
        "Reference to the secret containing the password to use for the docker registry.",
    ),
];

/// Registry login. Without it the connector is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerCredentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password_ref: Option<String>,
}

/// Docker-specific state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerFields {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub credentials: Vec<DockerCredentials>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernamePassword {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password_ref: Option<String>,
}

/// The `spec` of a Docker registry connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerSpec {
    #[serde(default)]
    pub docker_registry_url: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub auth: Option<Typed<UsernamePassword>>,
}

/// [`ConnectorKind`] for Docker registries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Docker;

impl ConnectorKind for Docker {
    const TYPE_NAME: &'static str = DOCKER_TYPE;
    const CONNECTOR_TYPE: ConnectorType = ConnectorType::DockerRegistry;
    const DESCRIPTION: &'static str = "Resource for creating a Docker connector.";

    type Fields = DockerFields;
    type Spec = DockerSpec;

    fn fields() -> &'static [Field] {
        DOCKER_FIELDS
    }

    fn blocks() -> Vec<(&'static str, NestedBlock)> {
        vec![(
            "credentials",
            NestedBlock::list(
                Block::new()
                    .with_fields(CREDENTIAL_FIELDS)
                    .with_description("The credentials to use for the docker registry. If not specified then the connection is made to the registry anonymously."),
            )
            .with_max_items(1),
        )]
    }

    fn build_spec(fields: &DockerFields) -> DockerSpec {
        let auth = match fields.credentials.first() {
            Some(credentials) => Typed::new(
                "UsernamePassword",
                UsernamePassword {
                    username: credentials.username.clone(),
                    password_ref: credentials.password_ref.clone(),
                },
            ),
            None => Typed::unit("Anonymous"),
        };

        DockerSpec {
            docker_registry_url: fields.url.clone(),
            provider_type: fields.provider_type.clone(),
            auth: Some(auth),
        }
    }

    fn read_spec(spec: DockerSpec, fields: &mut DockerFields) {
        fields.url = spec.docker_registry_url;
        fields.provider_type = spec.provider_type;
        fields.credentials = spec
            .auth
            .and_then(|auth| auth.into_spec("UsernamePassword"))
            .map(|login| DockerCredentials {
                username: login.username,
                password_ref: login.password_ref,
            })
            .into_iter()
            .collect();
    }

    fn validate(config: &Value) -> Vec<Diagnostic> {
        validate_one_of(config, "provider_type", PROVIDER_TYPES)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_anonymous_without_credentials() {
        let fields = DockerFields {
            url: Some("https://hub.docker.com".to_string()),
            provider_type: Some("DockerHub".to_string()),
            credentials: Vec::new(),
        };

        assert_eq!(
            serde_json::to_value(Docker::build_spec(&fields)).unwrap(),
            json!({
                "dockerRegistryUrl": "https://hub.docker.com",
                "providerType": "DockerHub",
                "auth": {"type": "Anonymous"}
            })
        );
    }

    #[test]
    fn test_username_password_round_trip() {
        let fields = DockerFields {
            url: Some("https://registry.example.com".to_string()),
            provider_type: Some("Harbor".to_string()),
            credentials: vec![DockerCredentials {
                username: Some("admin".to_string()),
                password_ref: Some("account.harbor_pw".to_string()),
            }],
        };

        let wire = serde_json::to_value(Docker::build_spec(&fields)).unwrap();
        assert_eq!(
            wire["auth"],
            json!({
                "type": "UsernamePassword",
                "spec": {"username": "admin", "passwordRef": "account.harbor_pw"}
            })
        );

        let mut read = DockerFields::default();
        Docker::read_spec(serde_json::from_value(wire).unwrap(), &mut read);
        assert_eq!(read, fields);
    }

    #[test]
    fn test_validate_provider_type() {
        assert!(Docker::validate(&json!({"provider_type": "Quay"})).is_empty());
        assert_eq!(Docker::validate(&json!({"provider_type": "Gcr"})).len(), 1);
    }
}
