//! Small helpers for poking at raw `serde_json::Value` trees while parsing
//! envelopes.

use serde_json::Value;

/// Returns true iff `value` is an object containing `key` (of any type).
pub fn has_key(value: &Value, key: &str) -> bool {
    value.as_object().is_some_and(|map| map.contains_key(key))
}

/// Returns true iff `value` is an object containing `key` with a string value.
pub fn has_string_key(value: &Value, key: &str) -> bool {
    value
        .as_object()
        .and_then(|map| map.get(key))
        .is_some_and(Value::is_string)
}

/// Returns true iff `value` is an object containing `key` with an integer value.
pub fn has_integer_key(value: &Value, key: &str) -> bool {
    value
        .as_object()
        .and_then(|map| map.get(key))
        .is_some_and(Value::is_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_key() {
        let value = json!({"a": 1, "b": null});
        assert!(has_key(&value, "a"));
        assert!(has_key(&value, "b"));
        assert!(!has_key(&value, "c"));
        assert!(!has_key(&json!(42), "a"));
    }

    #[test]
    fn test_typed_keys() {
        let value = json!({"name": "x", "count": 3, "rate": 1.5});
        assert!(has_string_key(&value, "name"));
        assert!(!has_string_key(&value, "count"));
        assert!(has_integer_key(&value, "count"));
        assert!(!has_integer_key(&value, "rate"));
        assert!(!has_integer_key(&value, "missing"));
    }
}
