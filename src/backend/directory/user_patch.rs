use std::sync::Arc;

use tracing::{debug, info};

use super::{drain_deferred, validate_resource_id, PatchOutcome};
use crate::backend::{DirectoryClient, ResourceKind};
use crate::error::{AppError, AppResult};
use crate::models::ScimPatchOp;
use crate::patch::{apply_all, DispatchContext, PatchRequest, TargetUser};

/// Processor for user patch business logic
pub struct UserPatchProcessor;

impl UserPatchProcessor {
    /// Apply the operations to a fresh user projection.
    ///
    /// Pure: no directory calls are made here.
    pub fn prepare_user_patch(request: &PatchRequest) -> AppResult<(TargetUser, DispatchContext)> {
        let mut user = TargetUser::new();
        let mut context = DispatchContext::new();
        apply_all(&request.operations, &mut user, &mut context)?;
        Ok((user, context))
    }

    /// Apply a patch request to a directory user
    ///
    /// Users are not hydrated: the projection starts empty and only touched
    /// fields are sent downstream.
    pub async fn apply_patch_operations(
        directory: &dyn DirectoryClient,
        id: &str,
        request: &PatchRequest,
    ) -> AppResult<PatchOutcome> {
        let (user, context) = Self::prepare_user_patch(request)?;

        let fields = user.to_fields()?;
        debug!(user = id, fields = %fields, "persisting user patch");
        directory
            .update_resource(ResourceKind::User, id, &fields)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound(format!("User {} not found", id)),
                other => other,
            })?;

        let outcome = drain_deferred(directory, context.into_deferred()).await;
        info!(
            user = id,
            operations = request.len(),
            deferred_failures = outcome.failures.len(),
            "user patched"
        );
        Ok(outcome)
    }
}

/// User patch operations handler
pub struct UserPatchOps {
    directory: Arc<dyn DirectoryClient>,
}

impl UserPatchOps {
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self { directory }
    }

    /// Validate, normalise and apply a wire PatchOp to a user
    pub async fn patch_user(&self, id: &str, patch: &ScimPatchOp) -> AppResult<PatchOutcome> {
        validate_resource_id(id)?;
        let request = PatchRequest::from_wire(patch)?;
        UserPatchProcessor::apply_patch_operations(self.directory.as_ref(), id, &request).await
    }
}
