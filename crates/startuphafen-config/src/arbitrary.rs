//! proptest strategies for JSON configuration fragments.

use proptest::prelude::*;
use serde_json::{Map, Value};

/// Keys drawn from a small alphabet so fragments collide often.
fn key() -> impl Strategy<Value = String> {
    "[a-d]"
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

/// Any JSON value, nested a few levels deep.
pub(crate) fn json_value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(key(), inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// A JSON object whose values are arbitrary.
pub(crate) fn json_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key(), json_value(), 0..4)
        .prop_map(|entries| Value::Object(entries.into_iter().collect()))
}
