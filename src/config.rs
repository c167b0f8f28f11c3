//! Provider configuration.
//!
//! The provider block supplies the API endpoint, the account and an API key.
//! Any value left out of the block is read from the environment:
//!
//! | Attribute              | Environment variable   |
//! |------------------------|------------------------|
//! | `endpoint`             | `PLATFORM_ENDPOINT`    |
//! | `account_id`           | `PLATFORM_ACCOUNT_ID`  |
//! | `api_key`              | `PLATFORM_API_KEY`     |

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::mapping::{Field, FieldKind};
use crate::schema::{Diagnostic, Schema};

/// Environment variable holding the API endpoint.
pub const ENDPOINT_ENV: &str = "PLATFORM_ENDPOINT";
/// Environment variable holding the account identifier.
pub const ACCOUNT_ID_ENV: &str = "PLATFORM_ACCOUNT_ID";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "PLATFORM_API_KEY";

const CONFIG_FIELDS: &[Field] = &[
    Field::optional(
        "endpoint",
        FieldKind::String,
        "Base URL of the platform API. Falls back to PLATFORM_ENDPOINT.",
    ),
    Field::optional(
        "account_id",
        FieldKind::String,
        "Account identifier. Falls back to PLATFORM_ACCOUNT_ID.",
    ),
    Field::optional(
        "api_key",
        FieldKind::String,
        "API key used to authenticate. Falls back to PLATFORM_API_KEY.",
    )
    .sensitive(),
    Field::optional(
        "request_timeout_secs",
        FieldKind::Int,
        "Per-request timeout in seconds. No timeout when unset.",
    ),
];

/// Provider block as written by the user.
#[derive(Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the platform API.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Account identifier.
    #[serde(default)]
    pub account_id: Option<String>,
    /// API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("account_id", &self.account_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_fields(CONFIG_FIELDS)
            .with_description("Platform provider configuration.")
    }

    /// Parse the provider block. A null block is an empty configuration.
    pub fn from_value(value: serde_json::Value) -> ProviderResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Check values that are present, without consulting the environment.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if let Some(endpoint) = present(&self.endpoint) {
            if let Err(err) = Url::parse(endpoint) {
                diagnostics.push(
                    Diagnostic::error("Invalid endpoint URL")
                        .with_detail(err.to_string())
                        .with_attribute("endpoint"),
                );
            }
        }
        if self.request_timeout_secs == Some(0) {
            diagnostics.push(
                Diagnostic::error("request_timeout_secs must be greater than zero")
                    .with_attribute("request_timeout_secs"),
            );
        }
        diagnostics
    }

    /// Resolve missing values from the process environment.
    pub fn resolve(self) -> ProviderResult<ClientConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve missing values through `lookup` instead of the process environment.
    pub fn resolve_with<F>(self, lookup: F) -> ProviderResult<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |value: Option<String>, env: &str, attribute: &str| {
            value
                .filter(|v| !v.is_empty())
                .or_else(|| lookup(env).filter(|v| !v.is_empty()))
                .ok_or_else(|| {
                    ProviderError::Configuration(format!(
                        "{} must be set in the provider block or through {}",
                        attribute, env
                    ))
                })
        };

        let endpoint = pick(self.endpoint, ENDPOINT_ENV, "endpoint")?;
        let account_id = pick(self.account_id, ACCOUNT_ID_ENV, "account_id")?;
        let api_key = pick(self.api_key, API_KEY_ENV, "api_key")?;

        let mut config = ClientConfig::new(&endpoint, account_id, api_key)?;
        config.request_timeout = self.request_timeout_secs.map(Duration::from_secs);
        Ok(config)
    }
}

/// Fully resolved settings used to build an [`crate::client::ApiClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the platform API.
    pub endpoint: Url,
    /// Account identifier sent with every request.
    pub account_id: String,
    /// API key sent in the `x-api-key` header.
    pub api_key: String,
    /// Per-request timeout handed to the HTTP transport.
    pub request_timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Create a client configuration without a request timeout.
    pub fn new(
        endpoint: &str,
        account_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ProviderResult<Self> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            account_id: account_id.into(),
            api_key: api_key.into(),
            request_timeout: None,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_from_block() {
        let config = ProviderConfig::from_value(json!({
            "endpoint": "https://platform.example.com/gateway",
            "account_id": "acc",
            "api_key": "secret",
            "request_timeout_secs": 30
        }))
        .unwrap();

        let resolved = config.resolve_with(no_env).unwrap();
        assert_eq!(resolved.endpoint.host_str(), Some("platform.example.com"));
        assert_eq!(resolved.account_id, "acc");
        assert_eq!(resolved.api_key, "secret");
        assert_eq!(resolved.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_resolve_falls_back_to_environment() {
        let config = ProviderConfig::from_value(json!({"account_id": "acc"})).unwrap();
        let resolved = config
            .resolve_with(|key| match key {
                ENDPOINT_ENV => Some("https://env.example.com".to_string()),
                API_KEY_ENV => Some("env-key".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(resolved.endpoint.as_str(), "https://env.example.com/");
        assert_eq!(resolved.account_id, "acc");
        assert_eq!(resolved.api_key, "env-key");
        assert!(resolved.request_timeout.is_none());
    }

    #[test]
    fn test_resolve_reports_missing_value() {
        let config = ProviderConfig::from_value(json!({
            "endpoint": "https://platform.example.com",
            "account_id": ""
        }))
        .unwrap();

        let err = config.resolve_with(no_env).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(err.to_string().contains("account_id"));
        assert!(err.to_string().contains(ACCOUNT_ID_ENV));
    }

    #[test]
    fn test_resolve_rejects_bad_endpoint() {
        let config = ProviderConfig::from_value(json!({
            "endpoint": "not a url",
            "account_id": "acc",
            "api_key": "k"
        }))
        .unwrap();

        let err = config.resolve_with(no_env).unwrap_err();
        assert!(err.to_string().contains("invalid endpoint URL"));
    }

    #[test]
    fn test_diagnostics() {
        let config = ProviderConfig::from_value(json!({
            "endpoint": "::bad::",
            "request_timeout_secs": 0
        }))
        .unwrap();

        let diagnostics = config.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("endpoint"));

        assert!(ProviderConfig::from_value(json!(null))
            .unwrap()
            .diagnostics()
            .is_empty());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("https://platform.example.com", "acc", "top-secret").unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("top-secret"));
        assert!(printed.contains("<redacted>"));

        let block = ProviderConfig {
            api_key: Some("top-secret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", block).contains("top-secret"));
    }

    #[test]
    fn test_schema_marks_api_key_sensitive() {
        let schema = ProviderConfig::schema();
        assert!(schema.attribute("api_key").unwrap().flags.sensitive);
        assert!(schema.attribute("endpoint").unwrap().flags.optional);
    }
}
