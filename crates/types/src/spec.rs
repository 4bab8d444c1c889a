//! Parsed specification document subset.
//!
//! Reconciliation only needs method + path existence checks, so this model
//! keeps just the declared paths, their path-level parameters, and the HTTP
//! verbs each path item carries. Declaration order is preserved: matching is
//! first-declared-wins.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// HTTP verbs recognized as operations on a path item. Any other path item
/// member (`description`, `parameters`, vendor extensions) is not an
/// operation.
const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Error raised when specification text is neither valid JSON nor valid YAML.
#[derive(Debug, Error)]
#[error("specification text is not valid JSON or YAML: {0}")]
pub struct SpecParseError(String);

/// Minimal OpenAPI document: declared paths in declaration order.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SpecDocument {
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
}

impl SpecDocument {
    /// Parse specification text, accepting JSON first and falling back to
    /// YAML.
    pub fn parse(source: &str) -> Result<Self, SpecParseError> {
        serde_json::from_str::<SpecDocument>(source)
            .or_else(|_| serde_yaml::from_str::<SpecDocument>(source))
            .map_err(|error| SpecParseError(error.to_string()))
    }
}

/// One declared path: its path-level parameters plus every other member in
/// declaration order. Operations are the members keyed by an HTTP verb.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub parameters: Vec<PathParameter>,
    #[serde(flatten)]
    pub members: IndexMap<String, Value>,
}

impl PathItem {
    /// Declared operation methods, lowercase, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.members
            .keys()
            .map(String::as_str)
            .filter(|key| HTTP_METHODS.contains(key))
    }

    /// Whether any declared operation's method equals `method`,
    /// case-insensitively.
    pub fn allows_method(&self, method: &str) -> bool {
        self.methods().any(|declared| declared.eq_ignore_ascii_case(method))
    }
}

/// Path-level parameter declaration. Only the name participates in
/// placeholder substitution.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PathParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "in", default)]
    pub location: Option<String>,
}
