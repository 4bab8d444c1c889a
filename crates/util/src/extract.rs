//! Extraction of distinct observed calls from a recorded capture.

use apitrail_types::{CapturedExchange, ExchangeKind, ObservedCall};
use indexmap::IndexSet;
use tracing::debug;

/// Extracts the distinct `(method, url)` tuples from a capture.
///
/// Only request-kind entries participate. Each entry's first message line is
/// parsed as `"METHOD URL"`, split on the first space; entries without a
/// splittable first line are skipped. Exact duplicates collapse, preserving
/// first-seen order.
pub fn distinct_requests(capture: &[CapturedExchange]) -> Vec<ObservedCall> {
    let mut seen: IndexSet<ObservedCall> = IndexSet::new();
    for exchange in capture {
        if exchange.kind != ExchangeKind::Request {
            continue;
        }
        let Some(first_line) = exchange.first_line() else {
            debug!("skipping request record without message lines");
            continue;
        };
        let Some((method, url)) = first_line.split_once(' ') else {
            debug!(line = first_line, "skipping request record with unparseable first line");
            continue;
        };
        seen.insert(ObservedCall::new(method, url));
    }
    seen.into_iter().collect()
}
