use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;

use super::{
    created_response, decode_payload, not_found, patch_outcome_response, scim_resource_response,
    AppState, HandlerResult,
};
use crate::backend::directory::{
    ResourceCreateOps, ResourceDeleteOps, UserPatchOps, UserReadOps,
};
use crate::backend::ResourceKind;
use crate::extractors::ScimJson;
use crate::models::{ScimPatchOp, User};

pub async fn get_user(
    State((directory, app_config)): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult {
    let ops = UserReadOps::new(directory, app_config.server.base_path.clone());
    match ops.get_user(&id).await {
        Ok(Some(body)) => Ok(scim_resource_response(body)),
        Ok(None) => Err(not_found("User", &id)),
        Err(e) => Err(e.to_response()),
    }
}

pub async fn patch_user(
    State((directory, _)): State<AppState>,
    Path(id): Path<String>,
    ScimJson(patch_ops): ScimJson<ScimPatchOp>,
) -> HandlerResult {
    let ops = UserPatchOps::new(directory);
    match ops.patch_user(&id, &patch_ops).await {
        Ok(outcome) => patch_outcome_response(outcome),
        Err(e) => Err(e.to_response()),
    }
}

pub async fn delete_user(
    State((directory, _)): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult {
    let ops = ResourceDeleteOps::new(directory);
    match ops.delete(ResourceKind::User, &id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => Err(e.to_response()),
    }
}

pub async fn create_user(
    State((directory, app_config)): State<AppState>,
    ScimJson(payload): ScimJson<Value>,
) -> HandlerResult {
    let user: User = decode_payload("user", payload)?;
    let ops = ResourceCreateOps::new(
        directory,
        app_config.server.base_path.clone(),
        app_config.member_bind_base(),
    );
    match ops.create_user(&user).await {
        Ok(body) => created_response(body),
        Err(e) => Err(e.to_response()),
    }
}
