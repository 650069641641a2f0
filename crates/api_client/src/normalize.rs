//! Defensive normalization of API response shapes.
//!
//! The external API does not contractually guarantee its response shape, so
//! every decoded body passes through here: the UI degrades to "no data"
//! instead of crashing on a surprising payload. Nothing in this module
//! returns an error.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Conventional pagination/grouping keys probed before the entity's own
/// plural name.
const COLLECTION_KEYS: [&str; 3] = ["results", "data", "items"];

/// Coerces an arbitrary decoded body into a list of entries:
/// a list passes through, a keyed map is probed for a nested collection,
/// a lone record (map with an `id`) wraps into a one-element list, and
/// anything else becomes empty.
pub fn collection(raw: Value, plural_key: &str) -> Vec<Value> {
    match raw {
        Value::Array(entries) => entries,
        Value::Object(mut map) => {
            for key in COLLECTION_KEYS.iter().copied().chain([plural_key]) {
                if map.get(key).map_or(false, Value::is_array) {
                    if let Some(Value::Array(entries)) = map.remove(key) {
                        return entries;
                    }
                }
            }
            if map.contains_key("id") {
                return vec![Value::Object(map)];
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Coerces a single-record response: some backends answer item fetches with
/// a one-element list.
pub fn single(raw: Value) -> Option<Value> {
    match raw {
        Value::Array(entries) => entries.into_iter().next(),
        Value::Object(_) => Some(raw),
        _ => None,
    }
}

/// Typed decoding after the shape pass. Every record type fills missing
/// keys with its serde defaults, uniformly across entity kinds; entries
/// that are not objects or fail to decode are skipped, never fatal.
pub fn typed<T: DeserializeOwned>(entries: Vec<Value>) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|entry| {
            if !entry.is_object() {
                warn!("skipping non-object entry in collection response");
                return None;
            }
            match serde_json::from_value::<T>(entry) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(%err, "skipping undecodable entry in collection response");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shared::domain::{Patient, ProcessTask};

    use super::*;

    #[test]
    fn well_formed_list_passes_through_unchanged() {
        let raw = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(collection(raw.clone(), "patients"), raw.as_array().expect("array").clone());
    }

    #[test]
    fn conventional_wrapper_keys_all_yield_the_inner_list() {
        let inner = json!([{"id": 1, "full_name": "Ana"}]);
        for key in ["results", "data", "items", "patients"] {
            let raw = json!({ key: inner.clone() });
            assert_eq!(
                collection(raw, "patients"),
                inner.as_array().expect("array").clone(),
                "key {key} must unwrap"
            );
        }
    }

    #[test]
    fn first_matching_wrapper_key_wins() {
        let raw = json!({
            "results": [{"id": 1}],
            "data": [{"id": 2}]
        });
        assert_eq!(collection(raw, "patients"), vec![json!({"id": 1})]);
    }

    #[test]
    fn wrapper_key_holding_a_non_list_is_skipped() {
        let raw = json!({
            "results": "not-a-list",
            "data": [{"id": 2}]
        });
        assert_eq!(collection(raw, "patients"), vec![json!({"id": 2})]);
    }

    #[test]
    fn lone_record_with_id_wraps_into_a_single_element_list() {
        let raw = json!({"id": 9, "full_name": "Ana"});
        assert_eq!(collection(raw.clone(), "patients"), vec![raw]);
    }

    #[test]
    fn garbage_shapes_become_empty_never_an_error() {
        for raw in [json!(null), json!("garbage"), json!(42), json!({"unrelated": true})] {
            assert!(collection(raw, "patients").is_empty());
        }
    }

    #[test]
    fn single_unwraps_one_element_lists() {
        assert_eq!(single(json!([{"id": 3}])), Some(json!({"id": 3})));
        assert_eq!(single(json!({"id": 3})), Some(json!({"id": 3})));
        assert_eq!(single(json!([])), None);
        assert_eq!(single(json!("garbage")), None);
    }

    #[test]
    fn typed_records_default_missing_keys_uniformly() {
        let raw = json!({"results": [{"id": 1}, {"id": 2, "name": "Audit"}]});
        let tasks: Vec<ProcessTask> = typed(collection(raw, "process_tasks"));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].sla_minutes, 60);
        assert_eq!(tasks[1].name, "Audit");

        let raw = json!([{"id": 4}]);
        let patients: Vec<Patient> = typed(collection(raw, "patients"));
        assert_eq!(patients[0].full_name, "");
    }

    #[test]
    fn undecodable_entries_are_skipped_not_fatal() {
        let raw = json!([
            {"id": 1, "full_name": "Ana"},
            "not-an-object",
            {"id": 2, "birthdate": "not-a-date"}
        ]);
        let patients: Vec<Patient> = typed(collection(raw, "patients"));
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, Some(1));
    }
}
