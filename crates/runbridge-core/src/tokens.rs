//! Token-list input parsing.

/// Split a newline- or comma-separated list into trimmed, non-empty tokens.
///
/// Used for file lists, event-path allow-lists, and required-event lists.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
