//! Call-recording directory used by the synchronizer tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::{DirectoryClient, ResourceKind};
use crate::error::{AppError, AppResult};

/// Records every call. Fails membership deletes for `failing_member` and
/// every update when `failing_update` is set.
#[derive(Default)]
pub struct RecordingDirectory {
    pub members: Vec<String>,
    pub failing_member: Option<String>,
    pub failing_update: bool,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingDirectory {
    pub fn with_members(members: &[&str]) -> Self {
        Self {
            members: members.iter().map(|m| m.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DirectoryClient for RecordingDirectory {
    async fn fetch_members(&self, group_id: &str) -> AppResult<Vec<String>> {
        self.record(format!("fetch_members {}", group_id));
        Ok(self.members.clone())
    }

    async fn update_resource(&self, kind: ResourceKind, id: &str, fields: &Value) -> AppResult<()> {
        self.record(format!("update {} {} {}", kind, id, fields));
        if self.failing_update {
            return Err(AppError::Directory("update rejected".to_string()));
        }
        Ok(())
    }

    async fn delete_membership_reference(&self, group_id: &str, member_id: &str) -> AppResult<()> {
        self.record(format!("delete {} {}", group_id, member_id));
        if self.failing_member.as_deref() == Some(member_id) {
            return Err(AppError::Directory("reference not found".to_string()));
        }
        Ok(())
    }

    async fn fetch_resource(&self, kind: ResourceKind, id: &str) -> AppResult<Option<Value>> {
        self.record(format!("fetch {} {}", kind, id));
        Ok(None)
    }

    async fn delete_resource(&self, kind: ResourceKind, id: &str) -> AppResult<bool> {
        self.record(format!("delete_resource {} {}", kind, id));
        Ok(false)
    }

    async fn create_resource(&self, kind: ResourceKind, fields: &Value) -> AppResult<String> {
        self.record(format!("create {} {}", kind, fields));
        Ok("new-id".to_string())
    }

    async fn find_by_attribute(
        &self,
        kind: ResourceKind,
        attribute: &str,
        value: &str,
    ) -> AppResult<Option<String>> {
        self.record(format!("find {} {} {}", kind, attribute, value));
        Ok(None)
    }

    async fn fetch_role_assignments(&self, user_id: &str) -> AppResult<Vec<Value>> {
        self.record(format!("roles {}", user_id));
        Ok(Vec::new())
    }
}
