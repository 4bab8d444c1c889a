//! Matching of request URLs against declared specification paths.
//!
//! Templated paths are converted to regular expressions by substituting each
//! declared path parameter with a single-segment wildcard and matching the
//! result **unanchored** against the full URL. A match anywhere in the URL
//! counts, so `/users/{id}` matches both `.../users/123` and
//! `.../users/123/extra`. This is a known source of false positives, kept
//! for compatibility with the behavior the catalog tooling already exhibits.
//!
//! Non-templated paths use case-insensitive substring containment of the
//! literal path within the URL. The first declared path that matches wins.

use apitrail_types::{PathItem, PathParameter, SpecDocument};
use regex::Regex;
use tracing::{debug, warn};

/// Placeholder stand-in that survives `regex::escape` untouched.
const SEGMENT_SENTINEL: char = '\u{0}';

/// Pattern a substituted placeholder matches: one path segment.
const SEGMENT_WILDCARD: &str = "[^/]+";

/// Returns the first declared path whose pattern matches `url`, along with
/// its path item, or `None` when no declared path matches.
pub fn find_matching_path<'doc>(url: &str, document: &'doc SpecDocument) -> Option<(&'doc str, &'doc PathItem)> {
    for (template, item) in &document.paths {
        debug!(template, "checking declared path");
        if template.contains('{') {
            let pattern = template_pattern(template, &item.parameters);
            match Regex::new(&pattern) {
                Ok(matcher) if matcher.is_match(url) => return Some((template.as_str(), item)),
                Ok(_) => {}
                Err(error) => {
                    warn!(template, %error, "skipping path with unusable template pattern");
                }
            }
        } else if contains_ignore_ascii_case(url, template) {
            return Some((template.as_str(), item));
        }
    }
    None
}

/// Builds the unanchored pattern for a templated path.
///
/// Each declared parameter's `{name}` placeholder, in parameter declaration
/// order, becomes a single-segment wildcard; all remaining text is matched
/// literally. Placeholders with no declared parameter stay literal and will
/// not match a concrete segment.
fn template_pattern(template: &str, parameters: &[PathParameter]) -> String {
    let mut templated = template.to_string();
    for parameter in parameters {
        let placeholder = format!("{{{}}}", parameter.name);
        templated = templated.replace(&placeholder, &SEGMENT_SENTINEL.to_string());
    }
    regex::escape(&templated).replace(SEGMENT_SENTINEL, SEGMENT_WILDCARD)
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}
