//! Records produced by the intercepting proxy during a recording session.

use serde::{Deserialize, Serialize};

/// Kind tag on an intercepted exchange record.
///
/// Only [`ExchangeKind::Request`] entries participate in reconciliation;
/// responses and auxiliary records are carried through the capture but
/// ignored by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExchangeKind {
    Request,
    Response,
    Other,
}

/// A single intercepted exchange.
///
/// The first message line of a request is `"METHOD URL"`, split on the first
/// space. Method case is normalized at comparison time, never at storage
/// time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapturedExchange {
    pub kind: ExchangeKind,
    pub lines: Vec<String>,
}

impl CapturedExchange {
    /// Convenience constructor for a request record with a single
    /// `"METHOD URL"` message line.
    pub fn request(first_line: impl Into<String>) -> Self {
        Self {
            kind: ExchangeKind::Request,
            lines: vec![first_line.into()],
        }
    }

    pub fn first_line(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }
}

/// A distinct observed call: method plus the full request URL.
///
/// Candidate sets are deduplicated by exact `(method, url)` equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObservedCall {
    pub method: String,
    pub url: String,
}

impl ObservedCall {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }
}

impl std::fmt::Display for ObservedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
