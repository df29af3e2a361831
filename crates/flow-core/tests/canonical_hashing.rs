use flow_core::hashing::{hash_str, hash_value, to_canonical_json};
use serde_json::json;

#[test]
fn nested_key_order_does_not_change_the_hash() {
    let a = json!({"params": {"treeCount": 100, "seed": 42}, "stage": "model-training"});
    let b = json!({"stage": "model-training", "params": {"seed": 42, "treeCount": 100}});
    assert_eq!(to_canonical_json(&a), to_canonical_json(&b));
    assert_eq!(hash_value(&a), hash_value(&b));
    assert_eq!(hash_value(&a).len(), 64);
}

#[test]
fn any_parameter_change_changes_the_hash() {
    let base = json!({"testFraction": 0.2, "seed": 42});
    let other = json!({"testFraction": 0.25, "seed": 42});
    assert_ne!(hash_value(&base), hash_value(&other));
    assert_ne!(hash_str("train_data"), hash_str("test_data"));
}

#[test]
fn canonical_form_has_no_whitespace() {
    let v = json!({"b": [1, 2], "a": {"y": "x y", "x": null}});
    assert_eq!(to_canonical_json(&v), r#"{"a":{"x":null,"y":"x y"},"b":[1,2]}"#);
}
