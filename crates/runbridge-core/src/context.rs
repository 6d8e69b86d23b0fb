//! Ordered-source resolution for platform-provided context values.
//!
//! Provenance fields can arrive from an explicit input or from the ambient
//! runner environment. Validation logic never reads the environment itself:
//! the entrypoint captures a snapshot and passes candidates here as an
//! explicit ordered list, most specific first.

use crate::error::{BridgeError, Result};

/// Resolve the first non-empty candidate.
///
/// Candidates are `(source name, value)` pairs; blank and absent values are
/// skipped. The winning source is logged on the debug channel.
pub fn resolve_first(candidates: &[(&str, Option<String>)]) -> Option<String> {
    candidates.iter().find_map(|(source, value)| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                tracing::debug!(source = *source, "context value resolved");
                v.to_string()
            })
    })
}

/// Like [`resolve_first`], but a miss is fatal and names the field.
pub fn resolve_required(field: &str, candidates: &[(&str, Option<String>)]) -> Result<String> {
    resolve_first(candidates).ok_or_else(|| BridgeError::MissingContext {
        field: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_empty_wins() {
        let resolved = resolve_first(&[
            ("input", Some(String::new())),
            ("env:GITHUB_SHA", Some("abc".to_string())),
            ("default", Some("def".to_string())),
        ]);
        assert_eq!(resolved.as_deref(), Some("abc"));
    }

    #[test]
    fn test_blank_and_absent_candidates_skipped() {
        let resolved = resolve_first(&[("input", Some("   ".to_string())), ("env", None)]);
        assert!(resolved.is_none());
    }

    #[test]
    fn test_values_are_trimmed() {
        let resolved = resolve_first(&[("input", Some("  123 \n".to_string()))]);
        assert_eq!(resolved.as_deref(), Some("123"));
    }

    #[test]
    fn test_required_miss_names_the_field() {
        let err = resolve_required("repository", &[("env", None)]).unwrap_err();
        assert!(err.to_string().contains("repository"));
    }
}
