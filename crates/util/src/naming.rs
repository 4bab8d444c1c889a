//! Synthesis of catalog resource names for auto-registered stubs.

/// Maximum length the catalog accepts for an API resource name.
const MAX_API_NAME_LEN: usize = 50;

/// Synthesizes a stub entry name for a host: `new-<host>-<unix seconds>`,
/// dots replaced with dashes, truncated to the catalog's name length limit.
pub fn stub_api_name(host: &str, unix_seconds: i64) -> String {
    let name = format!("new-{}-{}", host.replace('.', "-"), unix_seconds);
    truncate(&name, MAX_API_NAME_LEN)
}

fn truncate(input: &str, max_len: usize) -> String {
    match input.char_indices().nth(max_len) {
        Some((boundary, _)) => input[..boundary].to_string(),
        None => input.to_string(),
    }
}
