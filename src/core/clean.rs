//! Outbound record cleaning
//!
//! A blank field means "not specified", never "set to empty": the backend
//! would otherwise overwrite stored values with null. Every create, update
//! and partial update goes through [`clean_record`] first.

use crate::core::entity::Record;
use crate::core::error::ClientResult;
use serde_json::{Map, Value};

/// Serialize a record and strip the fields that carry no value
pub fn clean_record<R: Record>(record: &R) -> ClientResult<Value> {
    Ok(clean_value(serde_json::to_value(record)?))
}

/// Strip unspecified fields from a JSON object
///
/// A top-level field is dropped when it is `null`, an empty string, or a
/// relation object whose `id` is `null`, `""` or `-1` (an unselected
/// reference in a form). Everything else is passed through untouched.
pub fn clean_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !is_unspecified(v))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn is_unspecified(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(obj) => match obj.get("id") {
            Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Number(n)) => n.as_i64() == Some(-1),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_drops_null_and_empty() {
        let cleaned = clean_value(json!({
            "id": null,
            "name": "Flood",
            "startDate": "",
            "count": 0,
            "active": false,
        }));
        assert_eq!(cleaned, json!({"name": "Flood", "count": 0, "active": false}));
    }

    #[test]
    fn test_clean_drops_unselected_relations() {
        let cleaned = clean_value(json!({
            "firstName": "Ada",
            "incident": {"id": ""},
            "other": {"id": -1},
            "kept": {"id": 3, "name": "Flood"},
            "noId": {"lastName": "Smith"},
        }));
        assert_eq!(
            cleaned,
            json!({
                "firstName": "Ada",
                "kept": {"id": 3, "name": "Flood"},
                "noId": {"lastName": "Smith"},
            })
        );
    }

    #[test]
    fn test_clean_keeps_lists_and_non_objects() {
        assert_eq!(clean_value(json!([1, null])), json!([1, null]));
        let cleaned = clean_value(json!({"patients": [], "tags": ["a"]}));
        assert_eq!(cleaned, json!({"patients": [], "tags": ["a"]}));
    }
}
