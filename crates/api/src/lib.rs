//! Catalog management API client.
//!
//! This crate provides a thin client for the versioned management REST API
//! that fronts the API catalog. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Scoping request paths by subscription, resource group, service, and
//!   workspace identifiers
//! - Attaching a bearer token from an injected [`auth::TokenProvider`] to
//!   every call
//! - Decoding the `{value: [...]}` list envelopes and export payloads
//!
//! The reconciliation engine consumes the client through the
//! [`CatalogOperations`] trait, so test suites can substitute an in-memory
//! fake. No call is retried: a transient failure is terminal for the unit of
//! work the caller is processing.

use std::sync::Arc;
use std::time::Duration;

use apitrail_types::{ApiDefinitionResource, ApiDeployment, CatalogApi, Collection, NewApiRequest, SpecExportResult};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub mod auth;

pub use auth::{MANAGEMENT_SCOPES, StaticTokenProvider, TokenProvider};

/// Default management endpoint fronting the catalog service.
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// API version pinned on every management call.
const API_VERSION: &str = "2024-03-01";

/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Errors raised by catalog calls.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to acquire catalog access token: {0}")]
    Auth(#[source] anyhow::Error),
    #[error("management endpoint is not usable: {0}")]
    InvalidEndpoint(String),
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("failed to deserialize catalog response: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Identifiers scoping every catalog resource path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogLocation {
    pub subscription_id: String,
    pub resource_group: String,
    pub service_name: String,
    pub workspace_name: String,
}

/// Catalog operations the reconciliation engine consumes.
///
/// Implemented by [`CatalogClient`] for the real service and by in-memory
/// fakes in tests; the engine depends only on this seam.
#[async_trait::async_trait]
pub trait CatalogOperations: Send + Sync {
    /// List the registered APIs in the workspace.
    async fn list_apis(&self) -> Result<Collection<CatalogApi>, CatalogError>;
    /// List the deployments of one API, by its stable name.
    async fn list_deployments(&self, api_name: &str) -> Result<Collection<ApiDeployment>, CatalogError>;
    /// Fetch definition metadata by resource-relative definition id.
    async fn get_definition(&self, definition_id: &str) -> Result<ApiDefinitionResource, CatalogError>;
    /// Render a stored definition into specification text.
    async fn export_specification(&self, definition_id: &str) -> Result<SpecExportResult, CatalogError>;
    /// Register a new API entry under the workspace.
    async fn create_api(&self, api_name: &str, entry: &NewApiRequest) -> Result<(), CatalogError>;
}

/// Thin wrapper around a configured `reqwest::Client` for catalog access.
#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    service_root: String,
    workspace_root: String,
    credential: Arc<dyn TokenProvider>,
}

impl CatalogClient {
    /// Construct a client against an explicit management endpoint.
    ///
    /// Non-localhost endpoints must use HTTPS.
    pub fn new(endpoint: &str, location: &CatalogLocation, credential: Arc<dyn TokenProvider>) -> Result<Self, CatalogError> {
        validate_endpoint(endpoint)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CatalogError::Http)?;

        let service_root = service_root(endpoint, location);
        let workspace_root = format!("{}/workspaces/{}", service_root, location.workspace_name);
        Ok(Self {
            http,
            service_root,
            workspace_root,
            credential,
        })
    }

    /// Construct a client against the default management endpoint.
    pub fn with_default_endpoint(location: &CatalogLocation, credential: Arc<dyn TokenProvider>) -> Result<Self, CatalogError> {
        Self::new(DEFAULT_MANAGEMENT_ENDPOINT, location, credential)
    }

    async fn bearer(&self) -> Result<String, CatalogError> {
        self.credential.get_token(MANAGEMENT_SCOPES).await.map_err(CatalogError::Auth)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, CatalogError> {
        let token = self.bearer().await?;
        debug!(%url, "issuing catalog GET");
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status { status, url });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(CatalogError::Deserialize)
    }
}

#[async_trait::async_trait]
impl CatalogOperations for CatalogClient {
    async fn list_apis(&self) -> Result<Collection<CatalogApi>, CatalogError> {
        self.get_json(versioned(format!("{}/apis", self.workspace_root))).await
    }

    async fn list_deployments(&self, api_name: &str) -> Result<Collection<ApiDeployment>, CatalogError> {
        self.get_json(versioned(format!("{}/apis/{}/deployments", self.workspace_root, api_name)))
            .await
    }

    async fn get_definition(&self, definition_id: &str) -> Result<ApiDefinitionResource, CatalogError> {
        // Definition ids are resource-relative and resolve under the service
        // scope, not the workspace scope.
        self.get_json(versioned(format!("{}{}", self.service_root, definition_id))).await
    }

    async fn export_specification(&self, definition_id: &str) -> Result<SpecExportResult, CatalogError> {
        let url = versioned(format!("{}{}/exportSpecification", self.service_root, definition_id));
        let token = self.bearer().await?;
        debug!(%url, "issuing catalog POST");
        let response = self.http.post(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status { status, url });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(CatalogError::Deserialize)
    }

    async fn create_api(&self, api_name: &str, entry: &NewApiRequest) -> Result<(), CatalogError> {
        let url = versioned(format!("{}/apis/{}", self.workspace_root, api_name));
        let token = self.bearer().await?;
        debug!(%url, "issuing catalog PUT");
        let response = self.http.put(&url).bearer_auth(token).json(entry).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(%status, body = body.as_str(), "create api response");
        if !status.is_success() {
            return Err(CatalogError::Status { status, url });
        }
        Ok(())
    }
}

/// Service-scoped resource root under the management endpoint.
fn service_root(endpoint: &str, location: &CatalogLocation) -> String {
    format!(
        "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ApiCenter/services/{}",
        endpoint.trim_end_matches('/'),
        location.subscription_id,
        location.resource_group,
        location.service_name
    )
}

fn versioned(url: String) -> String {
    format!("{}?api-version={}", url, API_VERSION)
}

/// Validate that a management endpoint is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
fn validate_endpoint(endpoint: &str) -> Result<(), CatalogError> {
    let parsed = Url::parse(endpoint).map_err(|error| CatalogError::InvalidEndpoint(format!("'{}': {}", endpoint, error)))?;

    let host_name = parsed
        .host_str()
        .ok_or_else(|| CatalogError::InvalidEndpoint(format!("'{}' has no host", endpoint)))?;

    if LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed)) {
        return Ok(());
    }

    if parsed.scheme() != "https" {
        return Err(CatalogError::InvalidEndpoint(format!(
            "non-localhost endpoints must use https; got '{}://'",
            parsed.scheme()
        )));
    }

    Ok(())
}
