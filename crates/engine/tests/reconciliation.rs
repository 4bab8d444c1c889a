//! End-to-end reconciliation runs against an in-memory fake catalog.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use apitrail_api::{CatalogError, CatalogOperations, StaticTokenProvider, TokenProvider};
use apitrail_engine::{ReconcilerSettings, ReconciliationEngine, RunOutcome, RunReport};
use apitrail_types::{
    ApiDefinitionResource, ApiDeployment, CapturedExchange, CatalogApi, Collection, ExchangeKind, NewApiRequest, SpecExportResult,
};

fn init_logs() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
}

#[derive(Default, Clone)]
struct CallLog {
    list_apis: usize,
    list_deployments: usize,
    get_definition: usize,
    export_specification: usize,
    create_api: usize,
    created_names: Vec<String>,
}

/// Programmable in-memory catalog. Unconfigured lookups behave like empty
/// or failing remote resources.
#[derive(Default)]
struct FakeCatalog {
    apis: Vec<CatalogApi>,
    fail_list_apis: bool,
    deployments: HashMap<String, Vec<ApiDeployment>>,
    definitions: HashMap<String, ApiDefinitionResource>,
    failing_definitions: HashSet<String>,
    exports: HashMap<String, SpecExportResult>,
    fail_create_for_host: Option<String>,
    calls: Mutex<CallLog>,
}

impl FakeCatalog {
    fn log(&self) -> CallLog {
        self.calls.lock().expect("call log").clone()
    }
}

fn remote_failure() -> CatalogError {
    CatalogError::Deserialize(serde_json::from_str::<serde_json::Value>("not json").expect_err("forced error"))
}

#[async_trait::async_trait]
impl CatalogOperations for FakeCatalog {
    async fn list_apis(&self) -> Result<Collection<CatalogApi>, CatalogError> {
        self.calls.lock().expect("call log").list_apis += 1;
        if self.fail_list_apis {
            return Err(remote_failure());
        }
        Ok(Collection {
            value: self.apis.clone(),
        })
    }

    async fn list_deployments(&self, api_name: &str) -> Result<Collection<ApiDeployment>, CatalogError> {
        self.calls.lock().expect("call log").list_deployments += 1;
        Ok(Collection {
            value: self.deployments.get(api_name).cloned().unwrap_or_default(),
        })
    }

    async fn get_definition(&self, definition_id: &str) -> Result<ApiDefinitionResource, CatalogError> {
        self.calls.lock().expect("call log").get_definition += 1;
        if self.failing_definitions.contains(definition_id) {
            return Err(remote_failure());
        }
        self.definitions.get(definition_id).cloned().ok_or_else(remote_failure)
    }

    async fn export_specification(&self, definition_id: &str) -> Result<SpecExportResult, CatalogError> {
        self.calls.lock().expect("call log").export_specification += 1;
        self.exports.get(definition_id).cloned().ok_or_else(remote_failure)
    }

    async fn create_api(&self, api_name: &str, entry: &NewApiRequest) -> Result<(), CatalogError> {
        let mut calls = self.calls.lock().expect("call log");
        calls.create_api += 1;
        calls.created_names.push(api_name.to_string());
        if let Some(host) = &self.fail_create_for_host
            && entry.properties.title == format!("New APIs: {}", host)
        {
            return Err(remote_failure());
        }
        Ok(())
    }
}

struct FailingCredential;

#[async_trait::async_trait]
impl TokenProvider for FailingCredential {
    async fn get_token(&self, _scopes: &[&str]) -> anyhow::Result<String> {
        anyhow::bail!("no usable credential in the chain")
    }
}

fn settings() -> ReconcilerSettings {
    ReconcilerSettings {
        subscription_id: "sub-1".to_string(),
        resource_group: "rg-1".to_string(),
        service_name: "catalog-1".to_string(),
        ..Default::default()
    }
}

fn engine(catalog: Arc<FakeCatalog>) -> ReconciliationEngine {
    ReconciliationEngine::new(settings(), Arc::new(StaticTokenProvider::new("token")), catalog)
}

fn api(name: &str) -> CatalogApi {
    serde_json::from_value(serde_json::json!({"name": name})).expect("api fixture")
}

fn deployment(definition_id: &str, runtime_uris: &[&str]) -> ApiDeployment {
    serde_json::from_value(serde_json::json!({
        "name": "prod",
        "properties": {
            "definitionId": definition_id,
            "server": {"runtimeUri": runtime_uris}
        }
    }))
    .expect("deployment fixture")
}

fn definition(specification_name: &str) -> ApiDefinitionResource {
    serde_json::from_value(serde_json::json!({
        "properties": {"specification": {"name": specification_name}}
    }))
    .expect("definition fixture")
}

fn inline_export(document: serde_json::Value) -> SpecExportResult {
    serde_json::from_value(serde_json::json!({"format": "inline", "value": document.to_string()})).expect("export fixture")
}

fn petstore_spec() -> serde_json::Value {
    serde_json::json!({
        "openapi": "3.0.1",
        "paths": {
            "/pets/{petId}": {
                "parameters": [{"name": "petId", "in": "path"}],
                "get": {}
            },
            "/store/inventory": {"get": {}}
        }
    })
}

/// Fake with one registered API: runtime URI `https://api.pets.example.com`
/// backed by an inline OpenAPI petstore definition.
fn petstore_catalog() -> FakeCatalog {
    FakeCatalog {
        apis: vec![api("petstore")],
        deployments: HashMap::from([(
            "petstore".to_string(),
            vec![deployment("/defs/petstore", &["https://api.pets.example.com"])],
        )]),
        definitions: HashMap::from([("/defs/petstore".to_string(), definition("openapi"))]),
        exports: HashMap::from([("/defs/petstore".to_string(), inline_export(petstore_spec()))]),
        ..Default::default()
    }
}

fn completed(outcome: RunOutcome) -> RunReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        other => panic!("expected a completed run, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_request_set_issues_zero_catalog_calls() {
    init_logs();
    let catalog = Arc::new(petstore_catalog());
    let capture = vec![CapturedExchange {
        kind: ExchangeKind::Response,
        lines: vec!["200 OK".to_string()],
    }];

    let outcome = engine(catalog.clone()).run(&capture).await;

    assert!(matches!(outcome, RunOutcome::NoRequests));
    let log = catalog.log();
    assert_eq!(log.list_apis, 0);
    assert_eq!(log.list_deployments, 0);
    assert_eq!(log.get_definition, 0);
}

#[tokio::test]
async fn missing_configuration_skips_the_run() {
    init_logs();
    let catalog = Arc::new(petstore_catalog());
    let mut incomplete = settings();
    incomplete.subscription_id.clear();
    let engine = ReconciliationEngine::new(incomplete, Arc::new(StaticTokenProvider::new("token")), catalog.clone());

    let outcome = engine
        .run(&[CapturedExchange::request("GET https://api.pets.example.com/pets")])
        .await;

    assert!(matches!(outcome, RunOutcome::SkippedConfiguration(_)));
    assert_eq!(catalog.log().list_apis, 0);
}

#[tokio::test]
async fn unusable_credential_skips_the_run() {
    init_logs();
    let catalog = Arc::new(petstore_catalog());
    let engine = ReconciliationEngine::new(settings(), Arc::new(FailingCredential), catalog.clone());

    let outcome = engine
        .run(&[CapturedExchange::request("GET https://api.pets.example.com/pets")])
        .await;

    assert!(matches!(outcome, RunOutcome::SkippedCredential));
    assert_eq!(catalog.log().list_apis, 0);
}

#[tokio::test]
async fn empty_catalog_terminates_before_deployment_calls() {
    init_logs();
    let catalog = Arc::new(FakeCatalog::default());

    let outcome = engine(catalog.clone())
        .run(&[CapturedExchange::request("GET https://api.pets.example.com/pets")])
        .await;

    assert!(matches!(outcome, RunOutcome::EmptyCatalog));
    let log = catalog.log();
    assert_eq!(log.list_apis, 1);
    assert_eq!(log.list_deployments, 0);
    assert_eq!(log.get_definition, 0);
}

#[tokio::test]
async fn failed_catalog_listing_is_treated_as_empty() {
    init_logs();
    let catalog = Arc::new(FakeCatalog {
        fail_list_apis: true,
        ..Default::default()
    });

    let outcome = engine(catalog.clone())
        .run(&[CapturedExchange::request("GET https://api.pets.example.com/pets")])
        .await;

    assert!(matches!(outcome, RunOutcome::EmptyCatalog));
    assert_eq!(catalog.log().list_deployments, 0);
}

#[tokio::test]
async fn registered_operation_is_classified_matched() {
    init_logs();
    let catalog = Arc::new(petstore_catalog());

    let outcome = engine(catalog.clone())
        .run(&[CapturedExchange::request("GET https://api.pets.example.com/store/inventory")])
        .await;

    let report = completed(outcome);
    assert_eq!(report.matched.len(), 1);
    assert!(!report.has_new_apis());
    assert_eq!(catalog.log().create_api, 0);
}

#[tokio::test]
async fn templated_path_matches_unanchored() {
    init_logs();
    let catalog = Arc::new(petstore_catalog());

    let outcome = engine(catalog.clone())
        .run(&[
            CapturedExchange::request("GET https://api.pets.example.com/pets/123"),
            CapturedExchange::request("GET https://api.pets.example.com/pets/123/extra"),
        ])
        .await;

    // Both URLs match `/pets/{petId}`: the template pattern is applied
    // anywhere in the URL, so the trailing-segment URL is also a hit.
    let report = completed(outcome);
    assert_eq!(report.matched.len(), 2);
    assert!(!report.has_new_apis());
}

#[tokio::test]
async fn method_without_declared_operation_is_new() {
    init_logs();
    let catalog = Arc::new(petstore_catalog());

    let outcome = engine(catalog.clone())
        .run(&[CapturedExchange::request("DELETE https://api.pets.example.com/store/inventory")])
        .await;

    let report = completed(outcome);
    assert!(report.matched.is_empty());
    assert_eq!(report.new_by_host["api.pets.example.com"].len(), 1);
}

#[tokio::test]
async fn duplicate_tuples_collapse_before_matching_and_in_the_report() {
    init_logs();
    let catalog = Arc::new(petstore_catalog());

    let outcome = engine(catalog.clone())
        .run(&[
            CapturedExchange::request("GET https://unregistered.example.com/a"),
            CapturedExchange::request("GET https://unregistered.example.com/a"),
            CapturedExchange::request("GET https://unregistered.example.com/a"),
        ])
        .await;

    let report = completed(outcome);
    assert_eq!(report.new_by_host["unregistered.example.com"].len(), 1);
    assert_eq!(catalog.log().create_api, 1);
}

#[tokio::test]
async fn creation_failure_for_one_host_does_not_block_the_other() {
    init_logs();
    let catalog = Arc::new(FakeCatalog {
        fail_create_for_host: Some("a.example.com".to_string()),
        ..petstore_catalog()
    });

    let outcome = engine(catalog.clone())
        .run(&[
            CapturedExchange::request("GET https://a.example.com/x"),
            CapturedExchange::request("GET https://b.example.com/y"),
        ])
        .await;

    let report = completed(outcome);
    assert_eq!(report.new_by_host.len(), 2);
    assert_eq!(report.creations.len(), 2);
    assert!(!report.creations[0].created);
    assert!(report.creations[1].created);

    let log = catalog.log();
    assert_eq!(log.create_api, 2);
    assert!(log.created_names[0].starts_with("new-a-example-com-"));
    assert!(log.created_names[1].starts_with("new-b-example-com-"));
}

#[tokio::test]
async fn zero_deployments_classify_every_request_as_new() {
    init_logs();
    let catalog = Arc::new(FakeCatalog {
        apis: vec![api("petstore"), api("orders")],
        ..Default::default()
    });

    let outcome = engine(catalog.clone())
        .run(&[
            CapturedExchange::request("GET https://api.pets.example.com/pets"),
            CapturedExchange::request("GET https://api.orders.example.com/orders"),
        ])
        .await;

    let report = completed(outcome);
    assert!(report.matched.is_empty());
    assert_eq!(report.new_by_host.len(), 2);

    let log = catalog.log();
    assert_eq!(log.list_deployments, 2);
    assert_eq!(log.get_definition, 0);
}

#[tokio::test]
async fn failed_definition_resolution_is_cached_for_the_run() {
    init_logs();
    let mut catalog = petstore_catalog();
    catalog.failing_definitions.insert("/defs/petstore".to_string());
    let catalog = Arc::new(catalog);

    let outcome = engine(catalog.clone())
        .run(&[
            CapturedExchange::request("GET https://api.pets.example.com/pets"),
            CapturedExchange::request("POST https://api.pets.example.com/pets"),
        ])
        .await;

    // Both requests hit the same runtime URI; the failed resolution is
    // cached so the definition is only fetched once.
    let report = completed(outcome);
    assert!(report.matched.is_empty());
    assert_eq!(report.new_by_host["api.pets.example.com"].len(), 2);
    assert_eq!(catalog.log().get_definition, 1);
}

#[tokio::test]
async fn non_openapi_definition_degrades_to_new_without_export() {
    init_logs();
    let mut catalog = petstore_catalog();
    catalog.definitions.insert("/defs/petstore".to_string(), definition("wsdl"));
    let catalog = Arc::new(catalog);

    let outcome = engine(catalog.clone())
        .run(&[CapturedExchange::request("GET https://api.pets.example.com/pets")])
        .await;

    let report = completed(outcome);
    assert!(report.has_new_apis());
    assert_eq!(catalog.log().export_specification, 0);
}

#[tokio::test]
async fn linked_export_cannot_be_parsed_and_degrades_to_new() {
    init_logs();
    let mut catalog = petstore_catalog();
    catalog.exports.insert(
        "/defs/petstore".to_string(),
        serde_json::from_value(serde_json::json!({"format": "link", "value": "https://specs.example.com/petstore"}))
            .expect("export fixture"),
    );
    let catalog = Arc::new(catalog);

    let outcome = engine(catalog.clone())
        .run(&[CapturedExchange::request("GET https://api.pets.example.com/pets")])
        .await;

    let report = completed(outcome);
    assert!(report.has_new_apis());
    assert_eq!(catalog.log().export_specification, 1);
}

#[tokio::test]
async fn unparseable_specification_text_degrades_to_new() {
    init_logs();
    let mut catalog = petstore_catalog();
    catalog.exports.insert(
        "/defs/petstore".to_string(),
        serde_json::from_value(serde_json::json!({"format": "inline", "value": "{not: valid: spec:"})).expect("export fixture"),
    );
    let catalog = Arc::new(catalog);

    let outcome = engine(catalog.clone())
        .run(&[CapturedExchange::request("GET https://api.pets.example.com/pets")])
        .await;

    let report = completed(outcome);
    assert!(report.has_new_apis());
}

#[tokio::test]
async fn stub_creation_can_be_disabled() {
    init_logs();
    let catalog = Arc::new(petstore_catalog());
    let mut no_create = settings();
    no_create.create_entries_for_new_apis = false;
    let engine = ReconciliationEngine::new(no_create, Arc::new(StaticTokenProvider::new("token")), catalog.clone());

    let outcome = engine
        .run(&[CapturedExchange::request("GET https://unregistered.example.com/a")])
        .await;

    let report = completed(outcome);
    assert!(report.has_new_apis());
    assert!(report.creations.is_empty());
    assert_eq!(catalog.log().create_api, 0);
}
