//! Error taxonomy for the bridge contract.

/// Errors produced by the identity binding checks tying bundle metadata to
/// the consumer's expected execution context.
///
/// Every variant is fatal and fail-closed; there is no downgrade path for
/// a binding mismatch.
#[derive(Debug, thiserror::Error)]
pub enum ExpectationError {
    #[error("Repository mismatch: expected {expected}, bundle was produced in {actual}")]
    Repository { expected: String, actual: String },

    #[error("Run mismatch: expected run {expected}, bundle was produced by run {actual}")]
    Run { expected: String, actual: String },

    #[error("Run attempt mismatch: expected attempt {expected}, got {actual}")]
    RunAttempt { expected: String, actual: String },

    #[error("Workflow mismatch: expected {expected}, got {actual}")]
    Workflow { expected: String, actual: String },

    #[error("Head SHA mismatch: expected {expected}, got {actual}")]
    HeadSha { expected: String, actual: String },

    #[error("PR mismatch: expected {expected}, got {actual}")]
    PrNumber { expected: String, actual: String },

    #[error("Source event {event} is not allowed")]
    EventNotAllowed { event: String },
}

/// Bridge contract errors.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("{label} is not valid JSON: {source}")]
    InvalidJson {
        label: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{label} must be a JSON object")]
    NotAnObject { label: String },

    #[error("Invalid output key: {key}")]
    InvalidOutputKey { key: String },

    #[error("Output {key} must be a string, number, boolean, or null")]
    NonScalarOutput { key: String },

    #[error("Bundle metadata is missing required field: {field}")]
    MissingMetaField { field: String },

    #[error("Bundle metadata field {field} must be a non-empty string")]
    EmptyMetaField { field: String },

    #[error("Unsupported bundle schema version: {found}")]
    UnsupportedSchemaVersion { found: String },

    #[error("Bundle metadata field {field} must be {expected}")]
    InvalidMetaField {
        field: String,
        expected: &'static str,
    },

    #[error("Invalid extract mapping: {line}")]
    InvalidMapping { line: String },

    #[error("Invalid extract output key: {key}")]
    InvalidMappingKey { key: String },

    #[error("Bundle file path must be relative: {path}")]
    AbsolutePath { path: String },

    #[error("Bundle file path may not escape workspace: {path}")]
    PathEscape { path: String },

    #[error("Missing required context value: {field}")]
    MissingContext { field: String },

    #[error(transparent)]
    Expectation(#[from] ExpectationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
