use std::sync::Arc;

use tracing::{debug, info};

use super::{drain_deferred, validate_resource_id, PatchOutcome};
use crate::backend::{DirectoryClient, ResourceKind};
use crate::error::{AppError, AppResult};
use crate::models::ScimPatchOp;
use crate::patch::{apply_all, DispatchContext, PatchRequest, TargetGroup};

/// Processor for group patch business logic
pub struct GroupPatchProcessor;

impl GroupPatchProcessor {
    /// Apply the operations to a hydrated group projection. Pure.
    pub fn prepare_group_patch(
        group: &mut TargetGroup,
        request: &PatchRequest,
    ) -> AppResult<DispatchContext> {
        let mut context = DispatchContext::new();
        apply_all(&request.operations, group, &mut context)?;
        Ok(context)
    }

    /// Apply a patch request to a directory group.
    ///
    /// The current membership is fetched first so that adds of existing
    /// members are skipped. Removals run after the field update.
    pub async fn apply_patch_operations(
        directory: &dyn DirectoryClient,
        bind_base: &str,
        id: &str,
        request: &PatchRequest,
    ) -> AppResult<PatchOutcome> {
        let members = directory.fetch_members(id).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound(format!("Group {} not found", id)),
            other => other,
        })?;
        let mut group = TargetGroup::with_members(id, members);

        let context = Self::prepare_group_patch(&mut group, request)?;

        let fields = group.to_fields(bind_base)?;
        debug!(
            group = id,
            added = group.members_to_add.len(),
            removed = group.members_to_remove.len(),
            "persisting group patch"
        );
        directory
            .update_resource(ResourceKind::Group, id, &fields)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound(format!("Group {} not found", id)),
                other => other,
            })?;

        let outcome = drain_deferred(directory, context.into_deferred()).await;
        info!(
            group = id,
            operations = request.len(),
            deferred_failures = outcome.failures.len(),
            "group patched"
        );
        Ok(outcome)
    }
}

/// Group patch operations handler
pub struct GroupPatchOps {
    directory: Arc<dyn DirectoryClient>,
    bind_base: String,
}

impl GroupPatchOps {
    pub fn new(directory: Arc<dyn DirectoryClient>, bind_base: impl Into<String>) -> Self {
        Self {
            directory,
            bind_base: bind_base.into(),
        }
    }

    /// Validate, normalise and apply a wire PatchOp to a group
    pub async fn patch_group(&self, id: &str, patch: &ScimPatchOp) -> AppResult<PatchOutcome> {
        validate_resource_id(id)?;
        let request = PatchRequest::from_wire(patch)?;
        GroupPatchProcessor::apply_patch_operations(
            self.directory.as_ref(),
            &self.bind_base,
            id,
            &request,
        )
        .await
    }
}
