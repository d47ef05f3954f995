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
use crate::backend::directory::resource_create::GroupCreateRequest;
use crate::backend::directory::{
    GroupPatchOps, GroupReadOps, ResourceCreateOps, ResourceDeleteOps,
};
use crate::backend::ResourceKind;
use crate::extractors::ScimJson;
use crate::models::ScimPatchOp;

pub async fn get_group(
    State((directory, app_config)): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult {
    let ops = GroupReadOps::new(directory, app_config.server.base_path.clone());
    match ops.get_group(&id).await {
        Ok(Some(body)) => Ok(scim_resource_response(body)),
        Ok(None) => Err(not_found("Group", &id)),
        Err(e) => Err(e.to_response()),
    }
}

pub async fn patch_group(
    State((directory, app_config)): State<AppState>,
    Path(id): Path<String>,
    ScimJson(patch_ops): ScimJson<ScimPatchOp>,
) -> HandlerResult {
    let ops = GroupPatchOps::new(directory, app_config.member_bind_base());
    match ops.patch_group(&id, &patch_ops).await {
        Ok(outcome) => patch_outcome_response(outcome),
        Err(e) => Err(e.to_response()),
    }
}

pub async fn delete_group(
    State((directory, _)): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult {
    let ops = ResourceDeleteOps::new(directory);
    match ops.delete(ResourceKind::Group, &id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => Err(e.to_response()),
    }
}

pub async fn create_group(
    State((directory, app_config)): State<AppState>,
    ScimJson(payload): ScimJson<Value>,
) -> HandlerResult {
    let request: GroupCreateRequest = decode_payload("group", payload)?;
    let ops = ResourceCreateOps::new(
        directory,
        app_config.server.base_path.clone(),
        app_config.member_bind_base(),
    );
    match ops.create_group(&request).await {
        Ok(body) => created_response(body),
        Err(e) => Err(e.to_response()),
    }
}
