//! # Apitrail Engine
//!
//! Reconciles live captured HTTP traffic against a remote catalog of
//! registered APIs: each distinct observed call is classified as known
//! (matches a catalog-registered operation) or new (unregistered), and hosts
//! that produced new calls can be auto-registered as placeholder catalog
//! entries.
//!
//! ## How a run works
//!
//! 1. Validate settings and probe the injected credential
//! 2. Extract distinct `(method, url)` tuples from the capture
//! 3. Load the catalog's APIs and build the [`cache::DefinitionCache`]
//!    (runtime URI -> lazily-resolved definition)
//! 4. Classify each tuple: cache miss, missing specification document,
//!    missing path, or missing method all mark the call as new
//! 5. Group the new calls by host, report them, and optionally register a
//!    stub catalog entry per host
//!
//! The engine is strictly sequential: deployment lookups, definition
//! resolutions, and stub creations each await one network round trip at a
//! time, and no state outlives the run.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use apitrail_api::{CatalogClient, StaticTokenProvider};
//! use apitrail_engine::{ReconcilerSettings, ReconciliationEngine};
//!
//! let settings = ReconcilerSettings {
//!     subscription_id: "sub".into(),
//!     resource_group: "rg".into(),
//!     service_name: "catalog".into(),
//!     ..Default::default()
//! };
//! let credential = Arc::new(StaticTokenProvider::new("token"));
//! let client = Arc::new(CatalogClient::with_default_endpoint(&settings.location(), credential.clone())?);
//! let engine = ReconciliationEngine::new(settings, credential, client);
//! let outcome = engine.run(&capture).await;
//! ```

pub mod cache;
pub mod engine;
pub mod report;
pub mod settings;

pub use cache::{DefinitionCache, DefinitionRecord, ensure_resolved};
pub use engine::ReconciliationEngine;
pub use report::{RunOutcome, RunReport, StubCreation};
pub use settings::{ConfigError, ReconcilerSettings};
