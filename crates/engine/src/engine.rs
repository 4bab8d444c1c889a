//! The reconciliation run state machine.

use std::sync::Arc;

use apitrail_api::{CatalogOperations, MANAGEMENT_SCOPES, TokenProvider};
use apitrail_types::{CapturedExchange, NewApiRequest, ObservedCall};
use apitrail_util::{distinct_requests, find_matching_path, stub_api_name};
use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::cache::{DefinitionCache, ensure_resolved};
use crate::report::{RunOutcome, RunReport, StubCreation};
use crate::settings::ReconcilerSettings;

/// Reconciles one completed capture against the catalog.
///
/// One engine instance serves one run. Every remote call happens strictly in
/// sequence and nothing is shared across instances, so concurrent captures
/// need concurrent engine instances, each with its own state.
pub struct ReconciliationEngine {
    settings: ReconcilerSettings,
    credential: Arc<dyn TokenProvider>,
    catalog: Arc<dyn CatalogOperations>,
}

impl ReconciliationEngine {
    pub fn new(settings: ReconcilerSettings, credential: Arc<dyn TokenProvider>, catalog: Arc<dyn CatalogOperations>) -> Self {
        Self {
            settings,
            credential,
            catalog,
        }
    }

    /// Single pass over the capture: load the catalog, build the definition
    /// cache, classify each distinct request, aggregate the unmatched ones
    /// by host, and optionally register stub entries for them.
    ///
    /// Failures never escape: configuration and credential problems skip the
    /// run, everything later degrades the single item being processed.
    pub async fn run(&self, capture: &[CapturedExchange]) -> RunOutcome {
        if let Err(error) = self.settings.validate() {
            error!(%error, "reconciliation skipped: configuration incomplete");
            return RunOutcome::SkippedConfiguration(error);
        }
        if let Err(error) = self.credential.get_token(MANAGEMENT_SCOPES).await {
            error!(%error, "reconciliation skipped: credential cannot produce a token");
            return RunOutcome::SkippedCredential;
        }

        let requests = distinct_requests(capture);
        if requests.is_empty() {
            debug!("no requests to process");
            return RunOutcome::NoRequests;
        }

        info!("checking whether recorded requests belong to APIs in the catalog");
        let apis = match self.catalog.list_apis().await {
            Ok(apis) => apis,
            Err(error) => {
                info!(%error, "failed to list catalog APIs; treating the catalog as empty");
                return RunOutcome::EmptyCatalog;
            }
        };
        if apis.is_empty() {
            info!("no APIs found in the catalog");
            return RunOutcome::EmptyCatalog;
        }

        let mut cache = DefinitionCache::build(self.catalog.as_ref(), &apis.value).await;
        debug!(runtime_uris = cache.len(), "definition cache built");

        let mut matched = Vec::new();
        let mut candidates: IndexSet<ObservedCall> = IndexSet::new();
        for call in requests {
            debug!(%call, "classifying request");

            let Some(index) = cache.resolve(&call.url) else {
                debug!(url = call.url.as_str(), "no cached runtime uri matches; marking as new");
                candidates.insert(call);
                continue;
            };
            let record = cache.record_mut(index);
            ensure_resolved(record, self.catalog.as_ref()).await;
            let Some(document) = record.document.as_ref() else {
                debug!(url = call.url.as_str(), "no specification document to compare to; marking as new");
                candidates.insert(call);
                continue;
            };

            let Some((template, item)) = find_matching_path(&call.url, document) else {
                debug!(url = call.url.as_str(), "no declared path matches; marking as new");
                candidates.insert(call);
                continue;
            };
            if !item.allows_method(&call.method) {
                debug!(
                    template,
                    method = call.method.as_str(),
                    "path matched but no operation supports the method; marking as new"
                );
                candidates.insert(call);
                continue;
            }

            debug!(%call, template, "request matches a registered operation");
            matched.push(call);
        }

        let new_by_host = group_by_host(candidates);
        if new_by_host.is_empty() {
            info!("no new APIs found");
            return RunOutcome::Completed(RunReport {
                matched,
                ..Default::default()
            });
        }

        log_new_api_report(&new_by_host);

        let creations = if self.settings.create_entries_for_new_apis {
            self.create_stub_entries(&new_by_host).await
        } else {
            Vec::new()
        };

        RunOutcome::Completed(RunReport {
            matched,
            new_by_host,
            creations,
        })
    }

    /// One creation attempt per host group. A failed host is logged and the
    /// next host is still attempted.
    async fn create_stub_entries(&self, new_by_host: &IndexMap<String, Vec<ObservedCall>>) -> Vec<StubCreation> {
        info!("creating new API entries in the catalog");
        let mut creations = Vec::with_capacity(new_by_host.len());
        for (host, calls) in new_by_host {
            let api_name = stub_api_name(host, Utc::now().timestamp());
            info!(host = host.as_str(), api = api_name.as_str(), "creating catalog entry");

            let entry = stub_entry(host, calls);
            let created = match self.catalog.create_api(&api_name, &entry).await {
                Ok(()) => {
                    debug!(api = api_name.as_str(), "catalog entry created");
                    true
                }
                Err(error) => {
                    error!(host = host.as_str(), api = api_name.as_str(), %error, "failed to create catalog entry");
                    false
                }
            };
            creations.push(StubCreation {
                host: host.clone(),
                api_name,
                created,
            });
        }
        info!("done creating catalog entries");
        creations
    }
}

/// Group candidates by URL host, preserving candidate order. Candidates
/// whose URL has no parseable host are logged and left out of grouping.
fn group_by_host(candidates: IndexSet<ObservedCall>) -> IndexMap<String, Vec<ObservedCall>> {
    let mut groups: IndexMap<String, Vec<ObservedCall>> = IndexMap::new();
    for call in candidates {
        let host = Url::parse(&call.url).ok().and_then(|url| url.host_str().map(str::to_string));
        let Some(host) = host else {
            warn!(url = call.url.as_str(), "candidate url has no parseable host; excluded from grouping");
            continue;
        };
        groups.entry(host).or_default().push(call);
    }
    groups
}

fn log_new_api_report(new_by_host: &IndexMap<String, Vec<ObservedCall>>) {
    let mut lines = vec!["New APIs that aren't registered in the catalog:".to_string(), String::new()];
    for (host, calls) in new_by_host {
        lines.push(format!("{}:", host));
        lines.extend(calls.iter().map(|call| format!("  {}", call)));
    }
    info!("{}", lines.join("\n"));
}

fn stub_entry(host: &str, calls: &[ObservedCall]) -> NewApiRequest {
    let mut description = vec!["New APIs discovered from captured traffic".to_string(), String::new()];
    description.extend(calls.iter().map(|call| format!("  {}", call)));
    NewApiRequest::rest(format!("New APIs: {}", host), description.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_keys_by_host_and_skips_unparseable_urls() {
        let mut candidates = IndexSet::new();
        candidates.insert(ObservedCall::new("GET", "https://a.example.com/x"));
        candidates.insert(ObservedCall::new("GET", "https://b.example.com/y"));
        candidates.insert(ObservedCall::new("POST", "https://a.example.com/z"));
        candidates.insert(ObservedCall::new("GET", "not a url"));

        let groups = group_by_host(candidates);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["a.example.com"].len(), 2);
        assert_eq!(groups["b.example.com"].len(), 1);
    }

    #[test]
    fn stub_entry_lists_discovered_calls_in_description() {
        let calls = vec![
            ObservedCall::new("GET", "https://a.example.com/x"),
            ObservedCall::new("POST", "https://a.example.com/y"),
        ];
        let entry = stub_entry("a.example.com", &calls);

        assert_eq!(entry.properties.title, "New APIs: a.example.com");
        assert!(entry.properties.description.contains("  GET https://a.example.com/x"));
        assert!(entry.properties.description.contains("  POST https://a.example.com/y"));
    }
}
