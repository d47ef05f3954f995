//! Resource-level operations on top of a [`DirectoryClient`].
//!
//! # Architecture
//!
//! ```text
//! resource handlers (axum)
//!     ↓
//! *PatchOps / *ReadOps / ResourceCreateOps / ResourceDeleteOps
//!     ↓
//! patch engine (pure)  +  DirectoryClient (I/O)
//! ```
//!
//! A patch runs as one forward pass: hydrate, dispatch every operation,
//! persist the field update, then drain the deferred calls. Nothing is
//! rolled back; failures during the drain are reported in [`PatchOutcome`].

pub mod group_patch;
pub mod group_read;
pub mod resource_create;
pub mod resource_delete;
pub mod user_patch;
pub mod user_read;

pub use group_patch::GroupPatchOps;
pub use group_read::GroupReadOps;
pub use resource_create::ResourceCreateOps;
pub use resource_delete::ResourceDeleteOps;
pub use user_patch::UserPatchOps;
pub use user_read::UserReadOps;

#[cfg(test)]
pub(crate) mod recording;

use tracing::warn;

use super::DirectoryClient;
use crate::error::{AppError, AppResult};
use crate::patch::DeferredCall;

/// Validate that a resource ID is not empty or whitespace
pub fn validate_resource_id(id: &str) -> AppResult<()> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("Resource ID cannot be empty".to_string()));
    }
    Ok(())
}

/// A deferred call that the directory rejected
#[derive(Debug)]
pub struct DeferredFailure {
    pub call: DeferredCall,
    pub error: AppError,
}

/// Result of a patch whose field update was persisted
#[derive(Debug, Default)]
pub struct PatchOutcome {
    pub completed: Vec<DeferredCall>,
    pub failures: Vec<DeferredFailure>,
}

impl PatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human readable summary of failed calls
    pub fn failure_detail(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.call, f.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Execute deferred calls in order. Every call is attempted; failures are
/// collected rather than aborting the drain.
pub async fn drain_deferred(
    directory: &dyn DirectoryClient,
    calls: Vec<DeferredCall>,
) -> PatchOutcome {
    let mut outcome = PatchOutcome::default();
    for call in calls {
        let result = match &call {
            DeferredCall::RemoveGroupMember {
                group_id,
                member_id,
            } => directory.delete_membership_reference(group_id, member_id).await,
        };
        match result {
            Ok(()) => outcome.completed.push(call),
            Err(error) => {
                warn!(call = %call, error = %error, "deferred call failed");
                outcome.failures.push(DeferredFailure { call, error });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryDirectory;
    use serde_json::json;

    #[test]
    fn test_validate_resource_id() {
        assert!(validate_resource_id("valid-id").is_ok());
        assert!(validate_resource_id("").is_err());
        assert!(validate_resource_id("   ").is_err());
    }

    #[tokio::test]
    async fn test_drain_continues_after_failure() {
        let directory = InMemoryDirectory::new();
        directory.insert_user(json!({"id": "A"})).await.unwrap();
        directory.insert_user(json!({"id": "B"})).await.unwrap();
        directory
            .insert_group(json!({"id": "g1"}), &["A", "B"])
            .await
            .unwrap();

        let calls = ["A", "Z", "B"]
            .iter()
            .map(|m| DeferredCall::RemoveGroupMember {
                group_id: "g1".to_string(),
                member_id: m.to_string(),
            })
            .collect();

        let outcome = drain_deferred(&directory, calls).await;
        assert_eq!(outcome.completed.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert!(!outcome.is_complete());
        assert!(outcome.failure_detail().contains("remove member Z from group g1"));
        assert!(directory.members("g1").await.is_empty());
    }
}
