//! Deep merge of JSON configuration fragments.
//!
//! Objects are merged key by key, recursively. Every other pairing
//! (arrays, scalars, or mismatched kinds) is resolved by letting the later
//! fragment replace the earlier value wholesale.

use serde_json::{Map, Value};

/// Merges `overlay` into `base` in place.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => merge_objects(base, overlay),
        (base, overlay) => *base = overlay,
    }
}

fn merge_objects(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

/// Folds `fragments` in order onto an empty object.
pub fn merge_all<I>(fragments: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = Value::Object(Map::new());
    for fragment in fragments {
        deep_merge(&mut merged, fragment);
    }
    merged
}

/// Short description of a value's kind, used in diagnostics.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_last_write_wins() {
        let merged = merge_all([json!({"a": 1}), json!({"a": 2}), json!({"a": 3})]);
        assert_eq!(merged, json!({"a": 3}));
    }

    #[test]
    fn test_arrays_are_replaced_not_spliced() {
        let merged = merge_all([
            json!({"a": [{"x": 42, "y": 21}, {"z": 7}]}),
            json!({"a": [{"a": 42, "b": 21}]}),
        ]);
        assert_eq!(merged, json!({"a": [{"a": 42, "b": 21}]}));
    }

    #[test]
    fn test_nested_objects_union_keys() {
        let merged = merge_all([
            json!({"db": {"host": "localhost", "pool": {"min": 1}}}),
            json!({"db": {"port": 5432, "pool": {"max": 10}}}),
        ]);
        assert_eq!(
            merged,
            json!({"db": {"host": "localhost", "port": 5432, "pool": {"min": 1, "max": 10}}})
        );
    }

    #[test]
    fn test_kind_mismatch_replaces() {
        let mut base = json!({"mail": {"host": "smtp"}});
        deep_merge(&mut base, json!({"mail": false}));
        assert_eq!(base, json!({"mail": false}));

        deep_merge(&mut base, json!({"mail": {"host": "relay"}}));
        assert_eq!(base, json!({"mail": {"host": "relay"}}));
    }

    #[test]
    fn test_null_overrides_value() {
        let merged = merge_all([json!({"a": 1}), json!({"a": null})]);
        assert_eq!(merged, json!({"a": null}));
    }

    #[test]
    fn test_non_object_fragment_replaces_root() {
        let merged = merge_all([json!({"a": 1}), json!([1, 2])]);
        assert_eq!(merged, json!([1, 2]));
    }

    #[test]
    fn test_empty_fold_is_empty_object() {
        assert_eq!(merge_all(Vec::new()), json!({}));
    }

    use crate::arbitrary::{json_object, json_value};
    use proptest::prelude::*;

    // Reference semantics: objects union their keys, anything else is the overlay.
    fn merged_as_expected(base: &Value, overlay: &Value, merged: &Value) -> bool {
        match (base, overlay) {
            (Value::Object(base), Value::Object(overlay)) => {
                let Value::Object(merged) = merged else {
                    return false;
                };
                base.keys().chain(overlay.keys()).all(|key| merged.contains_key(key))
                    && merged.iter().all(|(key, value)| match (base.get(key), overlay.get(key)) {
                        (Some(b), Some(o)) => merged_as_expected(b, o, value),
                        (Some(b), None) => b == value,
                        (None, Some(o)) => o == value,
                        (None, None) => false,
                    })
            }
            _ => overlay == merged,
        }
    }

    proptest! {
        #[test]
        fn test_merge_matches_reference_semantics(base in json_value(), overlay in json_value()) {
            let mut merged = base.clone();
            deep_merge(&mut merged, overlay.clone());
            prop_assert!(merged_as_expected(&base, &overlay, &merged));
        }

        #[test]
        fn test_non_object_overlay_always_wins(base in json_value(), overlay in json_value()) {
            prop_assume!(!overlay.is_object());
            let mut merged = base;
            deep_merge(&mut merged, overlay.clone());
            prop_assert_eq!(merged, overlay);
        }

        #[test]
        fn test_merging_a_value_into_itself_changes_nothing(value in json_value()) {
            let mut merged = value.clone();
            deep_merge(&mut merged, value.clone());
            prop_assert_eq!(merged, value);
        }

        #[test]
        fn test_fold_is_deterministic_and_keeps_last_top_level_keys(
            fragments in prop::collection::vec(json_object(), 1..5)
        ) {
            let first = merge_all(fragments.clone());
            let second = merge_all(fragments.clone());
            prop_assert_eq!(&first, &second);

            let last = fragments.last().and_then(Value::as_object).cloned().unwrap_or_default();
            for (key, value) in last {
                if !value.is_object() {
                    prop_assert_eq!(&first[&key], &value);
                }
            }
        }
    }
}
