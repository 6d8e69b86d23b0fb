//! Identity binding checks between bundle metadata and the consumer's
//! declared expected execution context.
//!
//! Every check is a plain equality or membership test over already-parsed
//! values, and every mismatch is fatal. This chain is the security
//! boundary, so no downgrade path exists. Repository and run id are always
//! enforced; the remaining bindings apply only when the consumer supplies
//! them, which keeps each check independently toggleable by policy.

use crate::error::ExpectationError;
use crate::meta::BridgeMeta;

/// The consumer's declared expected identity and policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectations {
    /// Repository the bundle must have been produced in. Always enforced.
    pub repository: String,
    /// Workflow run id the bundle must have been produced by. Always
    /// enforced, compared as strings.
    pub run_id: String,
    pub run_attempt: Option<String>,
    pub source_workflow: Option<String>,
    pub expected_head_sha: Option<String>,
    /// Expected pull request number, compared in string form.
    pub expected_pr_number: Option<String>,
    /// When non-empty, the bundle's event name must be a member.
    pub require_events: Vec<String>,
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Run the ordered binding chain; the first mismatch wins and aborts the
/// remaining checks.
pub fn validate_expectations(
    meta: &BridgeMeta,
    expectations: &Expectations,
) -> Result<(), ExpectationError> {
    if meta.repository != expectations.repository {
        return Err(ExpectationError::Repository {
            expected: expectations.repository.clone(),
            actual: meta.repository.clone(),
        });
    }

    if meta.workflow_run_id != expectations.run_id {
        return Err(ExpectationError::Run {
            expected: expectations.run_id.clone(),
            actual: meta.workflow_run_id.clone(),
        });
    }

    if let Some(attempt) = supplied(&expectations.run_attempt) {
        if meta.workflow_run_attempt != attempt {
            return Err(ExpectationError::RunAttempt {
                expected: attempt.to_string(),
                actual: meta.workflow_run_attempt.clone(),
            });
        }
    }

    if let Some(workflow) = supplied(&expectations.source_workflow) {
        if meta.workflow_name != workflow {
            return Err(ExpectationError::Workflow {
                expected: workflow.to_string(),
                actual: meta.workflow_name.clone(),
            });
        }
    }

    if let Some(sha) = supplied(&expectations.expected_head_sha) {
        if meta.head_sha != sha {
            return Err(ExpectationError::HeadSha {
                expected: sha.to_string(),
                actual: meta.head_sha.clone(),
            });
        }
    }

    if let Some(pr) = supplied(&expectations.expected_pr_number) {
        // An absent producer PR number stringifies to the literal
        // "undefined", so a supplied expectation can never match it.
        let actual = meta
            .pr_number
            .as_ref()
            .map_or_else(|| "undefined".to_string(), ToString::to_string);
        if actual != pr {
            return Err(ExpectationError::PrNumber {
                expected: pr.to_string(),
                actual,
            });
        }
    }

    if !expectations.require_events.is_empty()
        && !expectations
            .require_events
            .iter()
            .any(|event| event == &meta.event_name)
    {
        return Err(ExpectationError::EventNotAllowed {
            event: meta.event_name.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Number};

    fn meta() -> BridgeMeta {
        BridgeMeta {
            schema_version: 2,
            repository: "owner/repo".to_string(),
            workflow_name: "Maintainer merge".to_string(),
            workflow_run_id: "123".to_string(),
            workflow_run_attempt: "2".to_string(),
            event_name: "issue_comment".to_string(),
            head_sha: "deadbeef".to_string(),
            created_at: "2026-08-06T12:00:00+00:00".to_string(),
            pr_number: Some(Number::from(42)),
            producer_job: None,
            producer_step: None,
            event: None,
            extra: Map::new(),
        }
    }

    fn full_expectations() -> Expectations {
        Expectations {
            repository: "owner/repo".to_string(),
            run_id: "123".to_string(),
            run_attempt: Some("2".to_string()),
            source_workflow: Some("Maintainer merge".to_string()),
            expected_head_sha: Some("deadbeef".to_string()),
            expected_pr_number: Some("42".to_string()),
            require_events: vec![
                "issue_comment".to_string(),
                "pull_request_review".to_string(),
            ],
        }
    }

    #[test]
    fn test_all_supplied_bindings_match() {
        assert!(validate_expectations(&meta(), &full_expectations()).is_ok());
    }

    #[test]
    fn test_minimal_expectations_accept() {
        let expectations = Expectations {
            repository: "owner/repo".to_string(),
            run_id: "123".to_string(),
            ..Default::default()
        };
        assert!(validate_expectations(&meta(), &expectations).is_ok());
    }

    #[test]
    fn test_repository_mismatch() {
        let mut expectations = full_expectations();
        expectations.repository = "other/repo".to_string();
        let err = validate_expectations(&meta(), &expectations).unwrap_err();
        assert!(err.to_string().contains("Repository mismatch"));
    }

    #[test]
    fn test_run_mismatch() {
        let mut expectations = full_expectations();
        expectations.run_id = "124".to_string();
        let err = validate_expectations(&meta(), &expectations).unwrap_err();
        assert!(err.to_string().contains("Run mismatch"));
    }

    #[test]
    fn test_run_attempt_mismatch() {
        let mut expectations = full_expectations();
        expectations.run_attempt = Some("3".to_string());
        let err = validate_expectations(&meta(), &expectations).unwrap_err();
        assert!(err.to_string().contains("Run attempt mismatch"));
    }

    #[test]
    fn test_workflow_mismatch() {
        let mut expectations = full_expectations();
        expectations.source_workflow = Some("Other workflow".to_string());
        let err = validate_expectations(&meta(), &expectations).unwrap_err();
        assert!(err.to_string().contains("Workflow mismatch"));
    }

    #[test]
    fn test_head_sha_mismatch() {
        let mut expectations = full_expectations();
        expectations.expected_head_sha = Some("cafebabe".to_string());
        let err = validate_expectations(&meta(), &expectations).unwrap_err();
        assert!(err.to_string().contains("Head SHA mismatch"));
    }

    #[test]
    fn test_pr_mismatch() {
        let mut expectations = full_expectations();
        expectations.expected_pr_number = Some("43".to_string());
        let err = validate_expectations(&meta(), &expectations).unwrap_err();
        assert!(err.to_string().contains("PR mismatch"));
    }

    #[test]
    fn test_pr_expectation_never_matches_absent_producer_number() {
        let mut bundle_meta = meta();
        bundle_meta.pr_number = None;
        let err = validate_expectations(&bundle_meta, &full_expectations()).unwrap_err();
        // fail-closed: the producer had no PR number, reported as a plain
        // mismatch against the literal "undefined"
        assert!(err.to_string().contains("PR mismatch"));
        assert!(err.to_string().contains("undefined"));
    }

    #[test]
    fn test_event_allow_list() {
        let mut expectations = full_expectations();
        expectations.require_events = vec!["pull_request_review".to_string()];
        let err = validate_expectations(&meta(), &expectations).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Source event issue_comment is not allowed"
        );

        expectations.require_events = vec![];
        assert!(validate_expectations(&meta(), &expectations).is_ok());
    }

    #[test]
    fn test_blank_supplied_values_are_skipped() {
        let mut expectations = full_expectations();
        expectations.run_attempt = Some(String::new());
        expectations.expected_head_sha = Some(String::new());
        assert!(validate_expectations(&meta(), &expectations).is_ok());
    }

    #[test]
    fn test_first_failure_wins() {
        // both repository and run id are wrong; repository is checked first
        let mut expectations = full_expectations();
        expectations.repository = "other/repo".to_string();
        expectations.run_id = "999".to_string();
        let err = validate_expectations(&meta(), &expectations).unwrap_err();
        assert!(err.to_string().contains("Repository mismatch"));
    }
}
