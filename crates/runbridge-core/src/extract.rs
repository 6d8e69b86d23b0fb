//! The `name=path` extraction mini-language.
//!
//! Consumers can pull arbitrary named values out of a validated bundle by
//! listing `name=dotted.or.indexed.path` lines. Paths are resolved against
//! a merged view of outputs, metadata, and the embedded event subset, with
//! `|` fallback alternatives.

use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};
use crate::meta::BridgeMeta;
use crate::outputs::{is_valid_output_key, OutputsMap};
use crate::path::get_by_path;

/// One parsed extraction rule: emit the value at `path` under `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractMapping {
    pub name: String,
    pub path: String,
}

/// Parse a newline-delimited block of `name=path` mappings.
///
/// Blank lines are skipped. The first `=` splits each line; a missing,
/// leading, or trailing separator is malformed, the name must be a valid
/// output identifier, and the path must be non-empty after trimming.
///
/// Line order is preserved and determines emission order. Duplicate names
/// are not rejected; the last emission wins at the output sink.
pub fn parse_extract_mappings(raw: &str) -> Result<Vec<ExtractMapping>> {
    let mut mappings = Vec::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some(eq) = line.find('=') else {
            return Err(BridgeError::InvalidMapping {
                line: line.to_string(),
            });
        };
        if eq == 0 || eq == line.len() - 1 {
            return Err(BridgeError::InvalidMapping {
                line: line.to_string(),
            });
        }

        let name = line[..eq].trim();
        let path = line[eq + 1..].trim();
        if !is_valid_output_key(name) {
            return Err(BridgeError::InvalidMappingKey {
                key: name.to_string(),
            });
        }
        if path.is_empty() {
            return Err(BridgeError::InvalidMapping {
                line: line.to_string(),
            });
        }

        mappings.push(ExtractMapping {
            name: name.to_string(),
            path: path.to_string(),
        });
    }
    Ok(mappings)
}

/// Render a resolved scalar for output emission.
///
/// `null` becomes the literal text `null`; strings pass through verbatim;
/// numbers and booleans use their natural form.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Apply mappings against the merged `{ outputs, meta, event }` view.
///
/// `event` is the metadata's embedded event subset, or an empty object when
/// absent. Resolution honors fallback paths; undefined resolutions are
/// silently skipped, not errors. Returns `(name, value)` pairs in mapping
/// order.
pub fn apply_extract_mappings(
    mappings: &[ExtractMapping],
    outputs: &OutputsMap,
    meta: &BridgeMeta,
) -> Vec<(String, String)> {
    let mut root = Map::new();
    root.insert("outputs".to_string(), Value::Object(outputs.clone()));
    root.insert(
        "meta".to_string(),
        serde_json::to_value(meta).unwrap_or(Value::Null),
    );
    root.insert(
        "event".to_string(),
        Value::Object(meta.event.clone().unwrap_or_default()),
    );
    let root = Value::Object(root);

    mappings
        .iter()
        .filter_map(|mapping| {
            get_by_path(&root, &mapping.path)
                .map(|value| (mapping.name.clone(), scalar_to_string(&value)))
        })
        .collect()
}
