//! Per-run mapping from runtime base URIs to lazily-resolved definitions.
//!
//! The cache is built once per run from the catalog's API and deployment
//! listings and never re-fetched mid-run. Entries keep the insertion order
//! produced by the build (API list order, then deployment order, then
//! runtime-URI order); lookup walks that order and the first hit wins, which
//! makes resolution order-dependent by design.

use apitrail_api::CatalogOperations;
use apitrail_types::{CatalogApi, SpecDocument, SpecExportFormat};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// A definition reference discovered through a deployment, resolved lazily.
///
/// `resolved` flips to true exactly once per run, on the first resolution
/// attempt, and is never reset: a record that failed to resolve keeps its
/// failed outcome for the rest of the run.
#[derive(Clone, Debug)]
pub struct DefinitionRecord {
    pub definition_id: String,
    pub specification_name: Option<String>,
    pub document: Option<SpecDocument>,
    pub resolved: bool,
}

impl DefinitionRecord {
    fn unresolved(definition_id: impl Into<String>) -> Self {
        Self {
            definition_id: definition_id.into(),
            specification_name: None,
            document: None,
            resolved: false,
        }
    }
}

/// Ordered runtime URI -> definition record mapping for one run.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: IndexMap<String, DefinitionRecord>,
}

impl DefinitionCache {
    /// Build the cache from the catalog's API list.
    ///
    /// For each API, deployments are fetched and every runtime URI of a
    /// deployment that carries both a definition id and at least one runtime
    /// URI is inserted. Deployments lacking either field are skipped with a
    /// log line; a failed deployment listing degrades that API to
    /// contributing nothing. Neither failure aborts the build.
    pub async fn build(catalog: &dyn CatalogOperations, apis: &[CatalogApi]) -> Self {
        let mut cache = Self::default();
        for api in apis {
            let Some(api_name) = api.name.as_deref() else {
                debug!("skipping catalog api without a name");
                continue;
            };
            debug!(api = api_name, "loading deployments");
            let deployments = match catalog.list_deployments(api_name).await {
                Ok(deployments) => deployments,
                Err(error) => {
                    info!(api = api_name, %error, "failed to list deployments; api contributes nothing to the cache");
                    continue;
                }
            };
            if deployments.is_empty() {
                debug!(api = api_name, "no deployments found");
                continue;
            }
            for deployment in &deployments.value {
                let Some(properties) = deployment.properties.as_ref() else {
                    debug!(api = api_name, "skipping deployment without properties");
                    continue;
                };
                let Some(definition_id) = properties.definition_id.as_deref() else {
                    debug!(api = api_name, "skipping deployment without a definition id");
                    continue;
                };
                let runtime_uris = properties.server.as_ref().map(|server| server.runtime_uri.as_slice()).unwrap_or(&[]);
                if runtime_uris.is_empty() {
                    debug!(api = api_name, deployment = deployment.name.as_deref(), "no runtime uris found for deployment");
                    continue;
                }
                for runtime_uri in runtime_uris {
                    cache.insert(runtime_uri, definition_id);
                }
            }
        }
        cache
    }

    /// First-wins insert: a duplicate runtime URI keeps the earlier
    /// registration and logs the collision.
    fn insert(&mut self, runtime_uri: &str, definition_id: &str) {
        if let Some(existing) = self.entries.get(runtime_uri) {
            warn!(
                runtime_uri,
                kept = %existing.definition_id,
                ignored = definition_id,
                "duplicate runtime uri registration; keeping the first"
            );
            return;
        }
        self.entries.insert(runtime_uri.to_string(), DefinitionRecord::unresolved(definition_id));
    }

    /// Index of the first entry, in insertion order, whose runtime URI is a
    /// case-sensitive substring of `url`.
    pub fn resolve(&self, url: &str) -> Option<usize> {
        self.entries.keys().position(|runtime_uri| url.contains(runtime_uri.as_str()))
    }

    pub fn record_mut(&mut self, index: usize) -> &mut DefinitionRecord {
        let (_, record) = self.entries.get_index_mut(index).expect("cache index out of bounds");
        record
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve a definition record's document, at most once per run.
///
/// Already-resolved records return their cached outcome immediately,
/// including failures. Otherwise the definition metadata is fetched; a
/// non-OpenAPI specification or a non-inline export leaves the record
/// resolved without a document, as does a parse failure. Every branch flips
/// `resolved` exactly once.
pub async fn ensure_resolved(record: &mut DefinitionRecord, catalog: &dyn CatalogOperations) {
    if record.resolved {
        debug!(definition = record.definition_id.as_str(), "definition outcome already cached");
        return;
    }
    record.resolved = true;

    let definition_id = record.definition_id.clone();
    debug!(definition = definition_id.as_str(), "loading definition metadata");
    let resource = match catalog.get_definition(&definition_id).await {
        Ok(resource) => resource,
        Err(error) => {
            warn!(definition = definition_id.as_str(), %error, "failed to load definition metadata");
            return;
        }
    };

    record.specification_name = resource.specification_name().map(str::to_string);
    if record.specification_name.as_deref() != Some("openapi") {
        debug!(
            definition = definition_id.as_str(),
            specification = record.specification_name.as_deref(),
            "definition is not OpenAPI; nothing to match against"
        );
        return;
    }

    let export = match catalog.export_specification(&definition_id).await {
        Ok(export) => export,
        Err(error) => {
            warn!(definition = definition_id.as_str(), %error, "failed to export specification");
            return;
        }
    };
    if export.format != Some(SpecExportFormat::Inline) {
        debug!(definition = definition_id.as_str(), "specification export is not inline; cannot parse by reference");
        return;
    }
    let Some(text) = export.value else {
        warn!(definition = definition_id.as_str(), "inline export carried no specification text");
        return;
    };

    match SpecDocument::parse(&text) {
        Ok(document) => record.document = Some(document),
        Err(error) => {
            warn!(definition = definition_id.as_str(), %error, "failed to parse specification document");
        }
    }
}
