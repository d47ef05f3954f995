use std::sync::Arc;

use tracing::info;

use super::validate_resource_id;
use crate::backend::{DirectoryClient, ResourceKind};
use crate::error::{AppError, AppResult};

/// Delete operations for users and groups
pub struct ResourceDeleteOps {
    directory: Arc<dyn DirectoryClient>,
}

impl ResourceDeleteOps {
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self { directory }
    }

    pub async fn delete(&self, kind: ResourceKind, id: &str) -> AppResult<()> {
        validate_resource_id(id)?;
        if !self.directory.delete_resource(kind, id).await? {
            return Err(AppError::NotFound(format!("{} {} not found", kind, id)));
        }
        info!(kind = %kind, id = id, "resource deleted");
        Ok(())
    }
}
