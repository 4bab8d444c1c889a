//! Run configuration bound from the host's configuration section.

use apitrail_api::CatalogLocation;
use serde::Deserialize;
use thiserror::Error;

/// A required identifier was absent; the run is skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    MissingSetting(&'static str),
}

/// Settings validated before a reconciliation run starts.
///
/// The three catalog identifiers are required; the workspace defaults to
/// `"default"` and stub creation is on unless the host turns it off.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcilerSettings {
    pub subscription_id: String,
    pub resource_group: String,
    pub service_name: String,
    pub workspace_name: String,
    pub create_entries_for_new_apis: bool,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            subscription_id: String::new(),
            resource_group: String::new(),
            service_name: String::new(),
            workspace_name: "default".to_string(),
            create_entries_for_new_apis: true,
        }
    }
}

impl ReconcilerSettings {
    /// Check the required identifiers, naming the first one missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subscription_id.is_empty() {
            return Err(ConfigError::MissingSetting("subscriptionId"));
        }
        if self.resource_group.is_empty() {
            return Err(ConfigError::MissingSetting("resourceGroup"));
        }
        if self.service_name.is_empty() {
            return Err(ConfigError::MissingSetting("serviceName"));
        }
        Ok(())
    }

    /// The catalog resource scope these settings describe.
    pub fn location(&self) -> CatalogLocation {
        CatalogLocation {
            subscription_id: self.subscription_id.clone(),
            resource_group: self.resource_group.clone(),
            service_name: self.service_name.clone(),
            workspace_name: self.workspace_name.clone(),
        }
    }
}
