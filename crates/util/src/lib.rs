//! Pure helpers shared by the reconciliation engine.
//!
//! Everything in this crate is synchronous and side-effect free (apart from
//! log output), so the matching and extraction rules can be exercised
//! without a catalog or a network.

pub mod extract;
pub mod naming;
pub mod spec_match;

pub use extract::distinct_requests;
pub use naming::stub_api_name;
pub use spec_match::find_matching_path;
