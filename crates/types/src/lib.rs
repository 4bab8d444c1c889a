//! Shared type definitions for the apitrail reconciliation engine.
//!
//! Three families of types live here:
//!
//! - capture records produced by the intercepting proxy ([`capture`])
//! - the wire model of the remote API catalog ([`catalog`])
//! - the parsed specification document subset used for path matching ([`spec`])
//!
//! All of these are per-run values: the engine builds them fresh for each
//! reconciliation pass and drops them when the pass completes.

pub mod capture;
pub mod catalog;
pub mod spec;

pub use capture::{CapturedExchange, ExchangeKind, ObservedCall};
pub use catalog::{
    ApiContact, ApiDefinitionResource, ApiDeployment, ApiKind, ApiProperties, CatalogApi, Collection, DefinitionProperties,
    DeploymentProperties, DeploymentServer, LifecycleStage, NewApiProperties, NewApiRequest, SpecExportFormat, SpecExportResult,
    SpecificationInfo,
};
pub use spec::{PathItem, PathParameter, SpecDocument, SpecParseError};
