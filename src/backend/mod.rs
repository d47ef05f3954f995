use crate::config::DirectoryConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub mod directory;
pub mod memory;

pub use memory::InMemoryDirectory;

/// Directory object kinds the bridge patches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Group,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::User => write!(f, "user"),
            ResourceKind::Group => write!(f, "group"),
        }
    }
}

/// Directory service capability
///
/// Resources are exchanged as Graph-shaped JSON objects. Implementations
/// decide how calls reach the directory; the patch engine only depends on
/// this trait.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Identifiers of the current members of a group
    async fn fetch_members(&self, group_id: &str) -> AppResult<Vec<String>>;

    /// Apply a partial update; fails with `NotFound` if the object is gone
    async fn update_resource(&self, kind: ResourceKind, id: &str, fields: &Value) -> AppResult<()>;

    /// Delete one membership reference of a group
    async fn delete_membership_reference(&self, group_id: &str, member_id: &str) -> AppResult<()>;

    /// Fetch an object by ID
    async fn fetch_resource(&self, kind: ResourceKind, id: &str) -> AppResult<Option<Value>>;

    /// Delete an object, returning whether it existed
    async fn delete_resource(&self, kind: ResourceKind, id: &str) -> AppResult<bool>;

    /// Create an object from a Graph-shaped body and return its new ID
    async fn create_resource(&self, kind: ResourceKind, fields: &Value) -> AppResult<String>;

    /// ID of the object whose `attribute` equals `value` exactly, if any
    async fn find_by_attribute(
        &self,
        kind: ResourceKind,
        attribute: &str,
        value: &str,
    ) -> AppResult<Option<String>>;

    /// App role assignments granted to a user
    async fn fetch_role_assignments(&self, user_id: &str) -> AppResult<Vec<Value>>;
}

/// Factory for creating directory clients
pub struct BackendFactory;

impl BackendFactory {
    /// Create a directory client based on configuration
    pub async fn create(config: &DirectoryConfig) -> AppResult<Arc<dyn DirectoryClient>> {
        match config.directory_type.as_str() {
            "memory" => {
                let directory = match &config.seed {
                    Some(path) => InMemoryDirectory::load_seed_file(path).await?,
                    None => InMemoryDirectory::new(),
                };
                Ok(Arc::new(directory))
            }
            other => Err(AppError::Configuration(format!(
                "Unsupported directory type: {}",
                other
            ))),
        }
    }
}
