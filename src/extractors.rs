use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::scim_error_response;

/// JSON extractor that accepts both application/json and application/scim+json
pub struct ScimJson<T>(pub T);

impl<T, S> FromRequest<S> for ScimJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ScimJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req.headers().get(header::CONTENT_TYPE) {
            let content_type_str = content_type
                .to_str()
                .map_err(|_| ScimJsonRejection::InvalidContentType)?;

            // Ignore parameters such as charset
            let media_type = content_type_str
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_lowercase();

            if media_type != "application/json" && media_type != "application/scim+json" {
                return Err(ScimJsonRejection::InvalidContentType);
            }
        }

        // axum's Json insists on application/json, so parse the bytes directly
        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|_| ScimJsonRejection::UnreadableBody)?;
        match Json::<T>::from_bytes(&bytes) {
            Ok(Json(value)) => Ok(ScimJson(value)),
            Err(rejection) => Err(ScimJsonRejection::JsonRejection(rejection)),
        }
    }
}

pub enum ScimJsonRejection {
    InvalidContentType,
    UnreadableBody,
    JsonRejection(JsonRejection),
}

impl IntoResponse for ScimJsonRejection {
    fn into_response(self) -> Response {
        match self {
            ScimJsonRejection::InvalidContentType => scim_error_response(
                StatusCode::BAD_REQUEST,
                "invalidSyntax",
                "Content-Type must be application/json or application/scim+json",
            )
            .into_response(),
            ScimJsonRejection::UnreadableBody => scim_error_response(
                StatusCode::BAD_REQUEST,
                "invalidSyntax",
                "Request body could not be read",
            )
            .into_response(),
            ScimJsonRejection::JsonRejection(rejection) => scim_error_response(
                StatusCode::BAD_REQUEST,
                "invalidSyntax",
                &format!("Invalid JSON: {}", rejection.body_text()),
            )
            .into_response(),
        }
    }
}
