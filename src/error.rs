use axum::{http::StatusCode, Json};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// A patch value payload that is neither a scalar nor an array of `{value}` objects
    MalformedValue(String),
    /// A patch request that is missing, empty, or not a PatchOp document
    UnsupportedPatch(String),
    NotFound(String),
    BadRequest(String),
    /// A create that collides with an existing directory object
    Conflict(String),
    /// The directory service rejected or failed a call
    Directory(String),
    Serialization(serde_json::Error),
    Configuration(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MalformedValue(e) => write!(f, "Malformed value: {}", e),
            AppError::UnsupportedPatch(e) => write!(f, "Unsupported patch: {}", e),
            AppError::NotFound(e) => write!(f, "Not found: {}", e),
            AppError::BadRequest(e) => write!(f, "Bad request: {}", e),
            AppError::Conflict(e) => write!(f, "Conflict: {}", e),
            AppError::Directory(e) => write!(f, "Directory error: {}", e),
            AppError::Serialization(e) => write!(f, "Serialization error: {}", e),
            AppError::Configuration(e) => write!(f, "Configuration error: {}", e),
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;

// SCIM 2.0 standard error response helper
pub fn scim_error_response(
    status_code: StatusCode,
    scim_type: &str,
    detail: &str,
) -> (StatusCode, Json<serde_json::Value>) {
    let status_str = status_code.as_u16().to_string();
    let mut body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
        "detail": detail,
        "status": status_str,
    });
    if !scim_type.is_empty() {
        body["scimType"] = json!(scim_type);
    }
    (status_code, Json(body))
}

impl AppError {
    pub fn to_response(&self) -> (StatusCode, Json<serde_json::Value>) {
        match self {
            AppError::MalformedValue(e) => {
                scim_error_response(StatusCode::BAD_REQUEST, "invalidValue", e)
            }
            AppError::UnsupportedPatch(e) => {
                scim_error_response(StatusCode::BAD_REQUEST, "invalidSyntax", e)
            }
            AppError::BadRequest(e) => {
                scim_error_response(StatusCode::BAD_REQUEST, "invalidValue", e)
            }
            AppError::NotFound(e) => scim_error_response(StatusCode::NOT_FOUND, "", e),
            AppError::Conflict(e) => scim_error_response(StatusCode::CONFLICT, "uniqueness", e),
            AppError::Directory(e) => {
                tracing::error!("Directory error: {}", e);
                scim_error_response(StatusCode::BAD_GATEWAY, "", e)
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                scim_error_response(StatusCode::INTERNAL_SERVER_ERROR, "", &e.to_string())
            }
            AppError::Configuration(e) => {
                tracing::error!("Configuration error: {}", e);
                scim_error_response(StatusCode::INTERNAL_SERVER_ERROR, "", e)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                scim_error_response(StatusCode::INTERNAL_SERVER_ERROR, "", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let (status, Json(body)) = AppError::MalformedValue("bad".to_string()).to_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["scimType"], "invalidValue");

        let (status, Json(body)) = AppError::UnsupportedPatch("empty".to_string()).to_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["scimType"], "invalidSyntax");
        assert_eq!(body["status"], "400");
    }

    #[test]
    fn test_not_found_has_no_scim_type() {
        let (status, Json(body)) = AppError::NotFound("user 1".to_string()).to_response();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.get("scimType").is_none());
        assert_eq!(body["detail"], "user 1");
    }

    #[test]
    fn test_conflict_maps_to_uniqueness() {
        let (status, Json(body)) =
            AppError::Conflict("User ada@example.com already exists".to_string()).to_response();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["scimType"], "uniqueness");
        assert_eq!(body["status"], "409");
    }
}
