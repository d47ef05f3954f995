//! Normalisation of PATCH `value` payloads.
//!
//! A payload is either a JSON scalar or an array of `{"value": ...}`
//! objects; both become an ordered list of [`OperationValue`].

use serde_json::Value;

use crate::error::{AppError, AppResult};

/// A single normalised leaf value of a patch operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationValue {
    pub value: Option<String>,
}

impl OperationValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn null() -> Self {
        Self { value: None }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Convert a raw payload into an ordered sequence of values.
///
/// Absent and `null` payloads yield no values. An empty array also yields
/// no values.
pub fn normalize(raw: Option<&Value>) -> AppResult<Vec<OperationValue>> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(raw) => raw,
    };

    if let Some(values) = parse_value_array(raw) {
        return Ok(values);
    }

    match scalar_to_string(raw) {
        Some(value) => Ok(vec![OperationValue::new(value)]),
        None => Err(AppError::MalformedValue(format!(
            "Value must be a string, number, boolean or an array of {{\"value\": ...}} objects, got: {}",
            raw
        ))),
    }
}

fn parse_value_array(raw: &Value) -> Option<Vec<OperationValue>> {
    let items = raw.as_array()?;
    items
        .iter()
        .map(|item| {
            let object = item.as_object()?;
            match object.get("value") {
                None | Some(Value::Null) => Some(OperationValue::null()),
                Some(value) => scalar_to_string(value).map(OperationValue::new),
            }
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
