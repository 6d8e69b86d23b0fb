//! Dotted/indexed path resolution over untrusted JSON values.
//!
//! Paths address object keys and array indices with `.`-separated segments;
//! `|` separates ordered fallback alternatives. Resolution only ever yields
//! scalar leaves. Reaching an object or array at the end of a path is a
//! miss, so unvalidated nested structure cannot leak through the extraction
//! surface.

use serde_json::{Map, Value};

/// Resolve `path` against `value`, honoring `|` fallback alternatives.
///
/// Candidates are trimmed, empty candidates discarded, and tried in order;
/// the first one resolving to a defined scalar wins (`null` is a scalar and
/// counts as defined). Fallback does not nest; candidates are plain
/// dotted/indexed paths.
pub fn get_by_path(value: &Value, path: &str) -> Option<Value> {
    if path.contains('|') {
        return path
            .split('|')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .find_map(|candidate| resolve_simple(value, candidate));
    }
    resolve_simple(value, path)
}

/// Walk a single dotted/indexed path, one segment at a time.
///
/// Array steps require an all-digit index strictly below the array length;
/// object steps require an existing key; a scalar reached with segments
/// remaining fails. The terminal value must be a scalar.
fn resolve_simple(value: &Value, path: &str) -> Option<Value> {
    let mut current = value;
    for segment in path.split('.').map(str::trim).filter(|s| !s.is_empty()) {
        current = match current {
            Value::Array(items) => {
                let index = parse_index(segment)?;
                items.get(index)?
            }
            Value::Object(map) => map.get(segment)?,
            // null, or a scalar with segments still to walk
            _ => return None,
        };
    }
    match current {
        Value::Object(_) | Value::Array(_) => None,
        scalar => Some(scalar.clone()),
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Project the allow-listed scalar leaves of `value` into a fresh object
/// mirroring the original nesting.
///
/// Each path is resolved with the plain (non-fallback) algorithm; paths
/// that do not resolve are silently omitted. Intermediate objects are
/// created as needed.
pub fn pick_by_paths(value: &Value, paths: &[String]) -> Map<String, Value> {
    let mut picked = Map::new();
    for path in paths {
        if let Some(leaf) = resolve_simple(value, path) {
            insert_at_path(&mut picked, path, leaf);
        }
    }
    picked
}

fn insert_at_path(target: &mut Map<String, Value>, path: &str, leaf: Value) {
    let segments: Vec<&str> = path
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            // A previous path left a scalar here; the later, deeper path
            // takes over the slot.
            *slot = Value::Object(Map::new());
        }
        current = slot.as_object_mut().expect("slot was just made an object");
    }
    current.insert((*last).to_string(), leaf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_object_walk() {
        let value = json!({ "event": { "comment": { "user": { "login": "alice" } } } });
        assert_eq!(
            get_by_path(&value, "event.comment.user.login"),
            Some(json!("alice"))
        );
        assert_eq!(get_by_path(&value, "event.comment.user.name"), None);
    }

    #[test]
    fn test_fallback_skips_non_resolving_candidates() {
        let value = json!({ "event": { "comment": { "user": { "login": "alice" } } } });
        assert_eq!(
            get_by_path(&value, "event.review.user.login|event.comment.user.login"),
            Some(json!("alice"))
        );
    }

    #[test]
    fn test_fallback_null_counts_as_defined() {
        let value = json!({ "a": null, "b": "fallback" });
        assert_eq!(get_by_path(&value, "a|b"), Some(Value::Null));
    }

    #[test]
    fn test_fallback_no_candidate_resolves() {
        let value = json!({ "x": 1 });
        assert_eq!(get_by_path(&value, "a|b.c|"), None);
    }

    #[test]
    fn test_array_indexing() {
        let value = json!({ "arr": [ { "name": "a" }, { "name": "b" } ] });
        assert_eq!(get_by_path(&value, "arr.1.name"), Some(json!("b")));
        // out of bounds
        assert_eq!(get_by_path(&value, "arr.2.name"), None);
        // non-numeric index
        assert_eq!(get_by_path(&value, "arr.x.name"), None);
        // signed forms are not indices
        assert_eq!(get_by_path(&value, "arr.+1.name"), None);
        assert_eq!(get_by_path(&value, "arr.-1.name"), None);
    }

    #[test]
    fn test_terminal_container_is_a_miss() {
        let value = json!({ "root": { "nested": { "x": 1 } } });
        assert_eq!(get_by_path(&value, "root.nested"), None);
        assert_eq!(get_by_path(&value, "root.nested.x"), Some(json!(1)));

        let value = json!({ "items": [1, 2] });
        assert_eq!(get_by_path(&value, "items"), None);
    }

    #[test]
    fn test_scalar_with_remaining_segments_fails() {
        let value = json!({ "a": "scalar" });
        assert_eq!(get_by_path(&value, "a.b"), None);

        let value = json!({ "a": null });
        assert_eq!(get_by_path(&value, "a.b"), None);
    }

    #[test]
    fn test_segments_are_trimmed_and_blanks_discarded() {
        let value = json!({ "a": { "b": 2 } });
        assert_eq!(get_by_path(&value, " a . b "), Some(json!(2)));
        assert_eq!(get_by_path(&value, "a..b"), Some(json!(2)));
    }

    #[test]
    fn test_pick_by_paths_mirrors_shape() {
        let value = json!({
            "comment": { "user": { "login": "alice" }, "body": "hi" },
            "number": 7,
            "junk": { "deep": {} }
        });
        let picked = pick_by_paths(
            &value,
            &[
                "comment.user.login".to_string(),
                "number".to_string(),
                "missing.path".to_string(),
                "junk.deep".to_string(),
            ],
        );
        assert_eq!(
            Value::Object(picked),
            json!({ "comment": { "user": { "login": "alice" } }, "number": 7 })
        );
    }

    #[test]
    fn test_pick_by_paths_no_fallback_at_this_layer() {
        let value = json!({ "b": 1 });
        // the whole string is treated as one literal path, which has no
        // pipe-named key and resolves nothing
        let picked = pick_by_paths(&value, &["a|b".to_string()]);
        assert!(picked.is_empty());
    }

    #[test]
    fn test_pick_by_paths_scalar_slot_taken_over_by_deeper_path() {
        let value = json!({ "a": 1, "deep": { "a": { "b": 2 } } });
        let picked = pick_by_paths(&value, &["a".to_string(), "a.b".to_string()]);
        // "a.b" does not resolve against the source (a is scalar), so the
        // scalar survives
        assert_eq!(Value::Object(picked), json!({ "a": 1 }));

        let picked = pick_by_paths(&value, &["a".to_string(), "deep.a.b".to_string()]);
        assert_eq!(
            Value::Object(picked),
            json!({ "a": 1, "deep": { "a": { "b": 2 } } })
        );
    }
}
