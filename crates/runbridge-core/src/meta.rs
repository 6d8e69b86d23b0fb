//! Bundle provenance metadata.
//!
//! A [`BridgeMeta`] record binds a bundle to the producer run that made it:
//! repository, workflow, run id/attempt, triggering event, and head commit.
//! The producer stamps it once at build time; the consumer structurally
//! validates it on read and never mutates it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{BridgeError, Result};

/// The single schema version this crate reads and writes.
///
/// Bundles carrying any other version are rejected outright; there is no
/// migration path.
pub const SCHEMA_VERSION: u64 = 2;

/// Required metadata fields, in the order they are checked and reported.
const REQUIRED_FIELDS: &[&str] = &[
    "repository",
    "workflow_name",
    "workflow_run_id",
    "workflow_run_attempt",
    "event_name",
    "head_sha",
    "created_at",
];

/// Provenance of the producer run, captured from the hosting platform's
/// run context by the entrypoint and passed in explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerContext {
    pub repository: String,
    pub workflow_name: String,
    pub run_id: String,
    pub run_attempt: String,
    pub event_name: String,
    pub head_sha: String,
    /// Pull request number, when the triggering event carries one.
    pub pr_number: Option<Number>,
    /// Identifier of the producing job, when known.
    pub job: Option<String>,
}

/// Structurally validated bundle metadata.
///
/// Caller-supplied extension fields survive in `extra` via serde flatten;
/// `created_at` is fixed at construction time and preserved verbatim on
/// read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMeta {
    pub schema_version: u64,
    pub repository: String,
    pub workflow_name: String,
    pub workflow_run_id: String,
    pub workflow_run_attempt: String,
    pub event_name: String,
    pub head_sha: String,
    pub created_at: String,

    /// Pull request number of the triggering event, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_job: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_step: Option<String>,

    /// Subset (or full copy) of the triggering event payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Map<String, Value>>,

    /// Arbitrary caller-supplied extension fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Assemble the producer-side metadata record.
///
/// Stamps the schema version, copies the producer context verbatim, and
/// fixes `created_at` at the current instant. `extra` is shallow-merged
/// last, so caller-supplied keys (including an `event` subset) take
/// precedence over anything already set.
pub fn build_bridge_meta(ctx: &ProducerContext, extra: &Map<String, Value>) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("schema_version".to_string(), Value::from(SCHEMA_VERSION));
    meta.insert(
        "repository".to_string(),
        Value::String(ctx.repository.clone()),
    );
    meta.insert(
        "workflow_name".to_string(),
        Value::String(ctx.workflow_name.clone()),
    );
    meta.insert(
        "workflow_run_id".to_string(),
        Value::String(ctx.run_id.clone()),
    );
    meta.insert(
        "workflow_run_attempt".to_string(),
        Value::String(ctx.run_attempt.clone()),
    );
    meta.insert(
        "event_name".to_string(),
        Value::String(ctx.event_name.clone()),
    );
    meta.insert("head_sha".to_string(), Value::String(ctx.head_sha.clone()));
    meta.insert(
        "created_at".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    if let Some(pr) = &ctx.pr_number {
        meta.insert("pr_number".to_string(), Value::Number(pr.clone()));
    }
    if let Some(job) = &ctx.job {
        meta.insert("producer_job".to_string(), Value::String(job.clone()));
    }
    for (key, value) in extra {
        meta.insert(key.clone(), value.clone());
    }
    meta
}

/// Structurally validate raw metadata and return the typed record.
///
/// Checks run in a fixed order and fail fast on the first violation:
/// presence of every required field (first missing name wins), schema
/// version equality, every required field a non-empty string (an empty
/// string is reported distinctly from a missing field), then the optional
/// fields (`pr_number` numeric, `event` a non-array object).
pub fn validate_meta(raw: &Value) -> Result<BridgeMeta> {
    let Value::Object(map) = raw else {
        return Err(BridgeError::NotAnObject {
            label: "bundle metadata".to_string(),
        });
    };

    for field in REQUIRED_FIELDS {
        if !map.contains_key(*field) {
            return Err(BridgeError::MissingMetaField {
                field: (*field).to_string(),
            });
        }
    }

    let version = map.get("schema_version");
    if version.and_then(Value::as_u64) != Some(SCHEMA_VERSION) {
        let found = version.map_or_else(|| "none".to_string(), Value::to_string);
        return Err(BridgeError::UnsupportedSchemaVersion { found });
    }

    for field in REQUIRED_FIELDS {
        match map.get(*field) {
            Some(Value::String(s)) if !s.is_empty() => {}
            _ => {
                return Err(BridgeError::EmptyMetaField {
                    field: (*field).to_string(),
                })
            }
        }
    }

    if let Some(pr) = map.get("pr_number") {
        if !pr.is_number() {
            return Err(BridgeError::InvalidMetaField {
                field: "pr_number".to_string(),
                expected: "a number",
            });
        }
    }
    if let Some(event) = map.get("event") {
        if !event.is_object() {
            return Err(BridgeError::InvalidMetaField {
                field: "event".to_string(),
                expected: "an object",
            });
        }
    }

    let meta: BridgeMeta =
        serde_json::from_value(raw.clone()).map_err(|source| BridgeError::InvalidJson {
            label: "bundle metadata".to_string(),
            source,
        })?;
    Ok(meta)
}
