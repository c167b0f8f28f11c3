//! Error types for the platform provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while reconciling platform resources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider is missing or has invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The remote entity exists but is of a different kind than requested.
    #[error("expected connector to be of type {expected}, but got {actual}")]
    UnexpectedType {
        /// The type the resource is declared as.
        expected: String,
        /// The type reported by the backend.
        actual: String,
    },

    /// Invalid request from the framework (malformed state or import id).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backend answered with a non-success HTTP status.
    #[error("API error ({status}) for {resource}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The resource the call was made for, e.g. `repository 'repo1'`.
        resource: String,
        /// Message extracted from the response body.
        message: String,
    },

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Build an [`ProviderError::Api`] error.
    pub fn api(status: u16, resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the remote entity does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api { status, .. } => *status == 404,
            _ => false,
        }
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the error message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::InvalidRequest(msg) => msg.clone(),
            Self::Api { message, .. } => message.clone(),
            Self::UnexpectedType { .. } | Self::Transport(_) | Self::Serialization(_) => {
                self.to_string()
            },
        }
    }

    /// Convert this error into a user-facing error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Api {
                status,
                resource,
                message,
            } => Diagnostic::error(format!("Request for {} failed", resource))
                .with_detail(format!("HTTP {}: {}", status, message)),
            Self::Transport(err) => Diagnostic::error("Could not reach the platform API")
                .with_detail(err.to_string()),
            other => Diagnostic::error(other.to_string()),
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        err.to_diagnostic()
    }
}

impl From<url::ParseError> for ProviderError {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration(format!("invalid endpoint URL: {}", err))
    }
}
