//! Run outcomes and the aggregated new-API report.

use apitrail_types::ObservedCall;
use indexmap::IndexMap;

use crate::settings::ConfigError;

/// Result of one reconciliation pass.
///
/// The skip variants are the only fatal-to-run outcomes, and even those are
/// returned, never raised: a run degrades, it does not panic or error out.
#[derive(Debug)]
pub enum RunOutcome {
    /// A required identifier was missing; nothing was attempted.
    SkippedConfiguration(ConfigError),
    /// The credential could not produce a token; nothing was attempted.
    SkippedCredential,
    /// The capture held no parseable request records; no catalog calls made.
    NoRequests,
    /// The catalog listed no APIs, or the listing failed.
    EmptyCatalog,
    /// The full pass ran.
    Completed(RunReport),
}

/// Aggregated results of a completed pass.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Calls that matched a registered operation and were dropped from
    /// further processing.
    pub matched: Vec<ObservedCall>,
    /// Unregistered calls grouped by URL host; no duplicates within a group.
    pub new_by_host: IndexMap<String, Vec<ObservedCall>>,
    /// Per-host stub creation outcomes, in group order. Empty when stub
    /// creation is disabled or no new APIs were found.
    pub creations: Vec<StubCreation>,
}

impl RunReport {
    pub fn has_new_apis(&self) -> bool {
        !self.new_by_host.is_empty()
    }
}

/// Outcome of one per-host stub creation attempt.
#[derive(Clone, Debug)]
pub struct StubCreation {
    pub host: String,
    pub api_name: String,
    pub created: bool,
}
