use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::ScimPatchOp;
use crate::parser::{PatchPath, SubAttributeFilter};
use crate::patch::value::{normalize, OperationValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationName {
    Add,
    Remove,
    Replace,
}

impl FromStr for OperationName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(OperationName::Add),
            "remove" => Ok(OperationName::Remove),
            "replace" => Ok(OperationName::Replace),
            other => Err(AppError::UnsupportedPatch(format!(
                "Unsupported patch operation: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationName::Add => "add",
            OperationName::Remove => "remove",
            OperationName::Replace => "replace",
        };
        write!(f, "{}", name)
    }
}

/// One normalised patch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    pub name: OperationName,
    pub path: PatchPath,
    pub values: Vec<OperationValue>,
}

impl PatchOperation {
    pub fn new(name: OperationName, path: PatchPath, values: Vec<OperationValue>) -> Self {
        Self { name, path, values }
    }

    /// Build an operation from wire parts: `op`, `path` and raw `value`.
    pub fn parse(op: &str, path: &str, value: Option<&serde_json::Value>) -> AppResult<Self> {
        Ok(Self {
            name: op.parse()?,
            path: PatchPath::parse(path)?,
            values: normalize(value)?,
        })
    }

    pub fn is_remove(&self) -> bool {
        self.name == OperationName::Remove
    }

    pub fn attribute(&self) -> &str {
        self.path.attribute()
    }

    pub fn filter(&self) -> Option<&SubAttributeFilter> {
        self.path.filter()
    }

    pub fn value_path(&self) -> Option<&str> {
        self.path.value_path()
    }

    pub fn first_value(&self) -> Option<&OperationValue> {
        self.values.first()
    }

    /// The operation's only value; more than one is a client error.
    pub fn single_value(&self) -> AppResult<Option<&OperationValue>> {
        match self.values.as_slice() {
            [] => Ok(None),
            [value] => Ok(Some(value)),
            _ => Err(AppError::MalformedValue(format!(
                "Attribute '{}' accepts a single value, got {}",
                self.attribute(),
                self.values.len()
            ))),
        }
    }
}

/// Ordered list of normalised operations. Order is significant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchRequest {
    pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
    /// Validate and normalise a wire PatchOp document.
    ///
    /// Every operation is normalised up front so that a malformed value fails
    /// the whole request before anything is sent downstream. Operations
    /// without a path are inert and dropped here.
    pub fn from_wire(patch: &ScimPatchOp) -> AppResult<Self> {
        if !patch.is_patch_op() {
            return Err(AppError::UnsupportedPatch(
                "Request is not a PatchOp message".to_string(),
            ));
        }
        if patch.operations.is_empty() {
            return Err(AppError::UnsupportedPatch(
                "Patch request contains no operations".to_string(),
            ));
        }

        let mut operations = Vec::with_capacity(patch.operations.len());
        for operation in &patch.operations {
            let path = match operation.path.as_deref().map(str::trim) {
                Some(path) if !path.is_empty() => path,
                _ => {
                    // Still reject unknown op names on inert operations
                    operation.op.parse::<OperationName>()?;
                    debug!(op = %operation.op, "ignoring patch operation without path");
                    continue;
                }
            };
            operations.push(PatchOperation::parse(
                &operation.op,
                path,
                operation.value.as_ref(),
            )?);
        }

        Ok(Self { operations })
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PATCH_OP_SCHEMA;
    use serde_json::json;

    fn patch_op(operations: serde_json::Value) -> ScimPatchOp {
        serde_json::from_value(json!({
            "schemas": [PATCH_OP_SCHEMA],
            "Operations": operations
        }))
        .unwrap()
    }

    #[test]
    fn test_operation_names_are_case_insensitive() {
        assert_eq!("Add".parse::<OperationName>().unwrap(), OperationName::Add);
        assert_eq!("REPLACE".parse::<OperationName>().unwrap(), OperationName::Replace);
        assert_eq!("remove".parse::<OperationName>().unwrap(), OperationName::Remove);
        assert!(matches!(
            "move".parse::<OperationName>(),
            Err(AppError::UnsupportedPatch(_))
        ));
    }

    #[test]
    fn test_from_wire_preserves_order() {
        let request = PatchRequest::from_wire(&patch_op(json!([
            {"op": "replace", "path": "department", "value": "Eng"},
            {"op": "remove", "path": "department", "value": "Eng"}
        ])))
        .unwrap();

        assert_eq!(request.len(), 2);
        assert_eq!(request.operations[0].name, OperationName::Replace);
        assert_eq!(request.operations[1].name, OperationName::Remove);
        assert_eq!(request.operations[1].values, vec![OperationValue::new("Eng")]);
    }

    #[test]
    fn test_from_wire_rejects_empty_request() {
        let result = PatchRequest::from_wire(&patch_op(json!([])));
        assert!(matches!(result, Err(AppError::UnsupportedPatch(_))));
    }

    #[test]
    fn test_from_wire_rejects_missing_schema() {
        let patch: ScimPatchOp = serde_json::from_value(json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "Operations": [{"op": "add", "path": "title", "value": "x"}]
        }))
        .unwrap();
        assert!(matches!(
            PatchRequest::from_wire(&patch),
            Err(AppError::UnsupportedPatch(_))
        ));
    }

    #[test]
    fn test_operations_without_path_are_inert() {
        let request = PatchRequest::from_wire(&patch_op(json!([
            {"op": "Replace", "value": {"active": false}},
            {"op": "Replace", "path": "  ", "value": "x"},
            {"op": "Add", "path": "title", "value": "Engineer"}
        ])))
        .unwrap();

        assert_eq!(request.len(), 1);
        assert_eq!(request.operations[0].attribute(), "title");
    }

    #[test]
    fn test_malformed_value_fails_whole_request() {
        let result = PatchRequest::from_wire(&patch_op(json!([
            {"op": "add", "path": "title", "value": "Engineer"},
            {"op": "replace", "path": "name", "value": {"givenName": "A"}}
        ])));
        assert!(matches!(result, Err(AppError::MalformedValue(_))));
    }

    #[test]
    fn test_single_value_rejects_multiple() {
        let operation = PatchOperation::parse(
            "replace",
            "displayName",
            Some(&json!([{"value": "a"}, {"value": "b"}])),
        )
        .unwrap();
        assert!(matches!(
            operation.single_value(),
            Err(AppError::MalformedValue(_))
        ));
    }
}
