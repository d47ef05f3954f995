//! SCIM HTTP handlers for `/Users` and `/Groups`.

pub mod group;
pub mod user;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::backend::directory::PatchOutcome;
use crate::backend::DirectoryClient;
use crate::config::AppConfig;
use crate::error::scim_error_response;

pub type AppState = (Arc<dyn DirectoryClient>, Arc<AppConfig>);

type HandlerResult = Result<Response, (StatusCode, Json<Value>)>;

/// 204 when every call succeeded; 502 naming the failed calls otherwise.
/// The field update has already been applied in both cases.
fn patch_outcome_response(outcome: PatchOutcome) -> HandlerResult {
    if outcome.is_complete() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Err(scim_error_response(
        StatusCode::BAD_GATEWAY,
        "",
        &format!(
            "Patch applied partially; failed calls: {}",
            outcome.failure_detail()
        ),
    ))
}

fn scim_resource_response(body: Value) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/scim+json")],
        Json(body),
    )
        .into_response()
}

/// 201 with the created resource and a Location header from `meta.location`
fn created_response(body: Value) -> HandlerResult {
    let Some(location) = body["meta"]["location"].as_str().map(String::from) else {
        return Err(scim_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "",
            "Created resource is missing meta.location",
        ));
    };
    Ok((
        StatusCode::CREATED,
        [
            (header::CONTENT_TYPE, "application/scim+json".to_string()),
            (header::LOCATION, location),
        ],
        Json(body),
    )
        .into_response())
}

/// Decode a create payload, mapping shape errors to a SCIM 400
fn decode_payload<T: serde::de::DeserializeOwned>(
    kind: &str,
    payload: Value,
) -> Result<T, (StatusCode, Json<Value>)> {
    serde_json::from_value(payload).map_err(|e| {
        scim_error_response(
            StatusCode::BAD_REQUEST,
            "invalidValue",
            &format!("Invalid {} data: {}", kind, e),
        )
    })
}

fn not_found(kind: &str, id: &str) -> (StatusCode, Json<Value>) {
    scim_error_response(
        StatusCode::NOT_FOUND,
        "",
        &format!("{} {} not found", kind, id),
    )
}
