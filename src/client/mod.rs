//! Authenticated REST client for the platform API.
//!
//! One [`ApiClient`] is built per `configure` call and shared by every
//! resource. Per-entity calls live in the submodules as `impl ApiClient`
//! blocks; this module owns request construction and response handling.

use std::fmt;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::types::Scope;

mod connectors;
pub mod models;
mod repositories;
mod service_accounts;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const USER_AGENT: &str = concat!("platform-provider/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one endpoint and account.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    account_id: String,
    api_key: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ApiClient {
    /// Build a client from resolved configuration.
    pub fn new(config: &ClientConfig) -> ProviderResult<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.endpoint.clone(),
            account_id: config.account_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// The account every request is made for.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Join path segments onto the base URL.
    ///
    /// Segments are percent-encoded individually, so identifiers can never
    /// escape their position in the path.
    pub fn endpoint(&self, segments: &[&str]) -> ProviderResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::Configuration(format!(
                    "endpoint '{}' cannot be used as a base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request carrying authentication and scope parameters.
    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
        scope: &Scope,
    ) -> ProviderResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        trace!(%method, %url, "building request");

        Ok(self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("accountIdentifier", self.account_id.as_str())])
            .query(&scope.query_pairs()))
    }

    /// Send a request and decode the JSON response body.
    ///
    /// `resource` names the entity in error messages, e.g. `repository 'repo1'`.
    pub(crate) async fn execute<T>(&self, request: RequestBuilder, resource: &str) -> ProviderResult<T>
    where
        T: DeserializeOwned,
    {
        let body = self.send(request, resource).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request whose response body is ignored.
    pub(crate) async fn execute_unit(&self, request: RequestBuilder, resource: &str) -> ProviderResult<()> {
        self.send(request, resource).await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> ProviderResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(status = status.as_u16(), resource, "platform API response");

        if !status.is_success() {
            return Err(api_error(status, resource, &body));
        }
        Ok(body)
    }
}

/// Turn a non-success response into [`ProviderError::Api`].
///
/// The message comes from the body's `message` field when the body is JSON,
/// otherwise the raw body (or the status reason when the body is empty).
fn api_error(status: StatusCode, resource: &str, body: &str) -> ProviderError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.to_string()
            }
        });

    ProviderError::api(status.as_u16(), resource, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> ApiClient {
        ApiClient::new(&ClientConfig::new(endpoint, "acc", "key").unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("https://platform.example.com/gateway/");
        let url = api.endpoint(&["code", "api", "v1", "repos", "repo1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://platform.example.com/gateway/code/api/v1/repos/repo1"
        );

        let api = client("https://platform.example.com");
        let url = api.endpoint(&["ng", "api", "connectors"]).unwrap();
        assert_eq!(url.as_str(), "https://platform.example.com/ng/api/connectors");
    }

    #[test]
    fn test_endpoint_encodes_identifiers() {
        let api = client("https://platform.example.com");
        let url = api.endpoint(&["ng", "api", "connectors", "a/b"]).unwrap();
        assert_eq!(url.path(), "/ng/api/connectors/a%2Fb");
    }

    #[test]
    fn test_api_error_uses_json_message() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            "connector 'c1'",
            r#"{"status":"ERROR","code":"INVALID_REQUEST","message":"Invalid identifier"}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.message(), "Invalid identifier");
    }

    #[test]
    fn test_api_error_falls_back_to_body() {
        let err = api_error(StatusCode::BAD_GATEWAY, "repository 'r'", "upstream down");
        assert_eq!(err.message(), "upstream down");

        let err = api_error(StatusCode::NOT_FOUND, "repository 'r'", "");
        assert_eq!(err.message(), "Not Found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let printed = format!("{:?}", client("https://platform.example.com"));
        assert!(!printed.contains("\"key\""));
        assert!(printed.contains("<redacted>"));
    }
}
