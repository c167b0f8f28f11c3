//! # Platform Provider
//!
//! A declarative infrastructure provider for a developer platform: code
//! repositories, service accounts and connectors to Azure, GitHub and Docker
//! registries, scoped by account, organization and project.
//!
//! # Overview
//!
//! - **ProviderService trait**: the operations the plugin host drives
//!   (schema, configure, validate, plan, CRUD, import, data sources)
//! - **PlatformProvider**: registers every resource type and dispatches on its name
//! - **Reconciler**: one generic create/read/update/delete flow, parameterized
//!   by a [`reconcile::ResourceHandler`] per resource type
//! - **REST client**: typed calls against the platform API
//! - **Schemas**: generated from per-resource field descriptor tables
//! - **Logging**: `tracing` to stderr, filtered by `PLATFORM_PROVIDER_LOG`
//!
//! # Quick Start
//!
//! ```ignore
//! use platform_provider::{init_logging, PlatformProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = PlatformProvider::new();
//!     provider
//!         .configure(json!({"account_id": "acc", "api_key": "pat.acc.xyz"}))
//!         .await?;
//!
//!     let state = provider
//!         .create("platform_repo", json!({"identifier": "repo1", "is_public": true}))
//!         .await?;
//!     println!("{}", state["git_url"]);
//!     Ok(())
//! }
//! ```
//!
//! # Resource Types
//!
//! | Type                                      | Looked up by       |
//! |-------------------------------------------|--------------------|
//! | `platform_repo`                           | identifier         |
//! | `platform_service_account`                | identifier or name |
//! | `platform_connector_azure_cloud_provider` | identifier or name |
//! | `platform_connector_github`               | identifier or name |
//! | `platform_connector_docker`               | identifier or name |
//!
//! Each type is also a data source of the same name.
//!
//! # Import IDs
//!
//! `identifier`, `org_id/identifier` or `org_id/project_id/identifier`.

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod mapping;
pub mod plan;
pub mod provider;
pub mod reconcile;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::ApiClient;
pub use config::{ClientConfig, ProviderConfig};
pub use error::{ProviderError, ProviderResult};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::PlatformProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata, Scope};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
