//! `platform_connector_azure_cloud_provider`: an Azure service principal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::models::ConnectorType;
use crate::mapping::{non_empty, Field, FieldKind};
use crate::schema::Diagnostic;
use crate::validation::validate_one_of;

use super::{some_if_set, ConnectorKind, Typed};

/// Resource type name.
pub const AZURE_CLOUD_PROVIDER_TYPE: &str = "platform_connector_azure_cloud_provider";

const ENVIRONMENT_TYPES: &[&str] = &["AZURE", "AZURE_US_GOVERNMENT"];

const AZURE_FIELDS: &[Field] = &[
    Field::required("client_id", FieldKind::String, "Application ID of the Azure app."),
    Field::required("tenant_id", FieldKind::String, "The Azure Active Directory tenant ID."),
    Field::required(
        "key",
        FieldKind::String,
        "Reference to the secret holding the client secret of the application.",
    ),
    Field::optional_computed(
        "azure_environment_type",
        FieldKind::String,
        "Azure environment. Valid values are AZURE and AZURE_US_GOVERNMENT.",
    ),
];

/// Azure-specific state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureFields {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub azure_environment_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    #[serde(default)]
    pub secret_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualConfig {
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub auth: Option<Typed<SecretRef>>,
}

/// The `spec` of an Azure connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureSpec {
    #[serde(default)]
    pub credential: Option<Typed<ManualConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_environment_type: Option<String>,
}

/// [`ConnectorKind`] for Azure service principals.
#[derive(Debug, Clone, Copy, Default)]
pub struct AzureCloudProvider;

impl ConnectorKind for AzureCloudProvider {
    const TYPE_NAME: &'static str = AZURE_CLOUD_PROVIDER_TYPE;
    const CONNECTOR_TYPE: ConnectorType = ConnectorType::Azure;
    const DESCRIPTION: &'static str = "Resource for creating an Azure cloud provider connector.";

    type Fields = AzureFields;
    type Spec = AzureSpec;

    fn fields() -> &'static [Field] {
        AZURE_FIELDS
    }

    fn build_spec(fields: &AzureFields) -> AzureSpec {
        let manual = ManualConfig {
            application_id: fields.client_id.clone(),
            tenant_id: fields.tenant_id.clone(),
            auth: Some(Typed::new(
                "Secret",
                SecretRef {
                    secret_ref: fields.key.clone(),
                },
            )),
        };

        AzureSpec {
            credential: Some(Typed::new("ManualConfig", manual)),
            azure_environment_type: non_empty(&fields.azure_environment_type).map(str::to_string),
        }
    }

    fn read_spec(spec: AzureSpec, fields: &mut AzureFields) {
        fields.azure_environment_type = some_if_set(spec.azure_environment_type);

        let Some(manual) = spec
            .credential
            .and_then(|credential| credential.into_spec("ManualConfig"))
        else {
            fields.client_id = None;
            fields.tenant_id = None;
            fields.key = None;
            return;
        };

        fields.client_id = manual.application_id;
        fields.tenant_id = manual.tenant_id;
        fields.key = manual
            .auth
            .and_then(|auth| auth.into_spec("Secret"))
            .and_then(|secret| secret.secret_ref);
    }

    fn validate(config: &Value) -> Vec<Diagnostic> {
        validate_one_of(config, "azure_environment_type", ENVIRONMENT_TYPES)
            .into_iter()
            .collect()
    }
}
