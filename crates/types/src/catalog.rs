//! Wire model of the remote API catalog.
//!
//! These types mirror the management REST API payloads: list endpoints wrap
//! their results in a `{value: [...]}` envelope, resource payloads nest the
//! interesting fields under `properties`, and free-form extension data rides
//! along as an open `customProperties` mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{value: [...]}` envelope returned by catalog list endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct Collection<T> {
    #[serde(default)]
    pub value: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { value: Vec::new() }
    }
}

impl<T> Collection<T> {
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// A registered catalog entry. `name` is the stable identifier used to query
/// deployments.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogApi {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Option<ApiProperties>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProperties {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub kind: Option<ApiKind>,
    #[serde(default)]
    pub lifecycle_stage: Option<LifecycleStage>,
    #[serde(default)]
    pub contacts: Vec<ApiContact>,
    #[serde(default)]
    pub custom_properties: IndexMap<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKind {
    #[serde(rename = "graphql")]
    GraphQl,
    Grpc,
    Rest,
    Soap,
    Webhook,
    #[serde(rename = "websocket")]
    WebSocket,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    Deprecated,
    Design,
    Development,
    Preview,
    Production,
    Retired,
    Testing,
}

/// A registered runtime instance of a catalog API.
///
/// A deployment with no runtime URIs contributes nothing to the definition
/// cache.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDeployment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Option<DeploymentProperties>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProperties {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub definition_id: Option<String>,
    #[serde(default)]
    pub server: Option<DeploymentServer>,
    #[serde(default)]
    pub custom_properties: IndexMap<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentServer {
    #[serde(default)]
    pub runtime_uri: Vec<String>,
}

/// Definition metadata resource, fetched by resource-relative id.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinitionResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Option<DefinitionProperties>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionProperties {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub specification: Option<SpecificationInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl ApiDefinitionResource {
    /// Specification format name (`"openapi"`, `"wsdl"`, ...), when present.
    pub fn specification_name(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|properties| properties.specification.as_ref())
            .and_then(|specification| specification.name.as_deref())
    }
}

/// Result of rendering a stored definition into specification text.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecExportResult {
    #[serde(default)]
    pub format: Option<SpecExportFormat>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecExportFormat {
    /// The specification text is carried in `value`.
    Inline,
    /// `value` is a pointer to the specification, not the text itself.
    Link,
}

/// Body of a catalog entry creation request.
#[derive(Clone, Debug, Serialize)]
pub struct NewApiRequest {
    pub properties: NewApiProperties,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApiProperties {
    pub title: String,
    pub description: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub api_type: String,
}

impl NewApiRequest {
    /// Placeholder REST entry, the shape used for auto-registered stubs.
    pub fn rest(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            properties: NewApiProperties {
                title: title.into(),
                description: description.into(),
                kind: "REST".to_string(),
                api_type: "rest".to_string(),
            },
        }
    }
}
