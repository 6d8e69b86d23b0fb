//! Outputs map schema and sanitization.
//!
//! Producer outputs cross the trust boundary as a flat JSON object. Under
//! strict sanitize mode every key must be a plain identifier and every
//! value a scalar, so nothing unvalidated rides along inside a nested
//! structure. Relaxed mode passes values through unchanged; the consumer
//! re-validates strictly on read regardless of how the bundle was written.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// Flat key/value outputs published by a producer run.
///
/// Insertion order is preserved through serialization (`serde_json`
/// `preserve_order`) but carries no meaning.
pub type OutputsMap = Map<String, Value>;

/// Sanitize mode for producer outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeMode {
    /// Identifier keys and scalar values only.
    #[default]
    Strict,
    /// No shape constraints; arbitrary JSON values pass through.
    None,
}

fn output_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"))
}

/// Whether `key` is a valid output (or extract-mapping) identifier.
pub fn is_valid_output_key(key: &str) -> bool {
    output_key_pattern().is_match(key)
}

/// Parse `raw` as a JSON object.
///
/// Failures carry `label` so callers juggling several JSON sources can
/// tell which one was malformed. Arrays and bare scalars are rejected.
pub fn parse_json_object(raw: &str, label: &str) -> Result<OutputsMap> {
    let value: Value = serde_json::from_str(raw).map_err(|source| BridgeError::InvalidJson {
        label: label.to_string(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(BridgeError::NotAnObject {
            label: label.to_string(),
        }),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

/// Validate (or pass through) an outputs map according to `mode`.
///
/// Strict mode rejects keys that are not plain identifiers and values that
/// are not scalars. Objects and arrays are rejected even when empty, and
/// each rejection names the offending key.
pub fn normalize_outputs(input: &OutputsMap, mode: SanitizeMode) -> Result<OutputsMap> {
    match mode {
        SanitizeMode::None => Ok(input.clone()),
        SanitizeMode::Strict => {
            for (key, value) in input {
                if !is_valid_output_key(key) {
                    return Err(BridgeError::InvalidOutputKey { key: key.clone() });
                }
                if !is_scalar(value) {
                    return Err(BridgeError::NonScalarOutput { key: key.clone() });
                }
            }
            Ok(input.clone())
        }
    }
}

/// Parse both output sources, merge them, and sanitize the result.
///
/// The file-sourced object is the base; the inline text overrides it
/// key-by-key. Either source may be empty or whitespace-only text, which
/// stands for an empty object.
pub fn parse_and_merge_outputs(
    inline_json: &str,
    file_json: &str,
    mode: SanitizeMode,
) -> Result<OutputsMap> {
    let base = if file_json.trim().is_empty() {
        OutputsMap::new()
    } else {
        parse_json_object(file_json, "outputs file")?
    };
    let overrides = if inline_json.trim().is_empty() {
        OutputsMap::new()
    } else {
        parse_json_object(inline_json, "outputs input")?
    };

    let mut merged = base;
    for (key, value) in overrides {
        merged.insert(key, value);
    }
    normalize_outputs(&merged, mode)
}
