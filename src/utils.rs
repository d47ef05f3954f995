//! Utility functions for SCIM responses

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Formats a DateTime to SCIM 2.0 compliant XSD dateTime format
///
/// Example output: "2025-06-14T10:03:54.374Z"
pub fn format_scim_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Re-format a directory timestamp for SCIM. Values that are not RFC 3339
/// are passed through unchanged.
pub fn normalize_directory_datetime(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => format_scim_datetime(dt.with_timezone(&Utc)),
        Err(_) => raw.to_string(),
    }
}

/// Recursively strip null fields, null array elements and empty objects
pub fn remove_null_fields(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut filtered = Map::new();
            for (key, val) in obj {
                match val {
                    Value::Null => continue,
                    Value::Object(_) => {
                        let cleaned = remove_null_fields(val);
                        if cleaned.as_object().is_some_and(|o| !o.is_empty()) {
                            filtered.insert(key.clone(), cleaned);
                        }
                    }
                    _ => {
                        filtered.insert(key.clone(), remove_null_fields(val));
                    }
                }
            }
            Value::Object(filtered)
        }
        Value::Array(arr) => Value::Array(
            arr.iter()
                .filter(|item| !item.is_null())
                .map(remove_null_fields)
                .collect(),
        ),
        other => other.clone(),
    }
}
