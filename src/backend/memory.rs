//! In-memory directory holding Graph-shaped users and groups.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{DirectoryClient, ResourceKind};
use crate::error::{AppError, AppResult};

const MEMBERS_BIND: &str = "members@odata.bind";
const OWNERS_BIND: &str = "owners@odata.bind";
const ROLE_ASSIGNMENTS: &str = "appRoleAssignments";

/// Initial directory content, as loaded from a seed file
#[derive(Debug, Default, Deserialize)]
pub struct DirectorySeed {
    /// Users may carry an `appRoleAssignments` array
    #[serde(default)]
    pub users: Vec<Value>,
    /// Groups may carry a `members` array of member IDs
    #[serde(default)]
    pub groups: Vec<Value>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<String, Map<String, Value>>,
    groups: HashMap<String, Map<String, Value>>,
    memberships: HashMap<String, Vec<String>>,
    owners: HashMap<String, Vec<String>>,
    role_assignments: HashMap<String, Vec<Value>>,
}

impl DirectoryState {
    fn objects(&self, kind: ResourceKind) -> &HashMap<String, Map<String, Value>> {
        match kind {
            ResourceKind::User => &self.users,
            ResourceKind::Group => &self.groups,
        }
    }

    fn objects_mut(&mut self, kind: ResourceKind) -> &mut HashMap<String, Map<String, Value>> {
        match kind {
            ResourceKind::User => &mut self.users,
            ResourceKind::Group => &mut self.groups,
        }
    }

    fn object_type(&self, id: &str) -> Option<&'static str> {
        if self.users.contains_key(id) {
            Some("#microsoft.graph.user")
        } else if self.groups.contains_key(id) {
            Some("#microsoft.graph.group")
        } else {
            None
        }
    }

    fn insert_user(&mut self, user: Value) -> AppResult<()> {
        let (id, mut object) = split_object(user)?;
        if let Some(Value::Array(assignments)) = object.remove(ROLE_ASSIGNMENTS) {
            self.role_assignments.insert(id.clone(), assignments);
        }
        self.users.insert(id, object);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: DirectorySeed) -> AppResult<Self> {
        let mut state = DirectoryState::default();
        for user in seed.users {
            state.insert_user(user)?;
        }
        for group in seed.groups {
            let (id, mut object) = split_object(group)?;
            let members = match object.remove("members") {
                Some(Value::Array(members)) => members
                    .iter()
                    .filter_map(|m| m.as_str().map(String::from))
                    .collect(),
                _ => Vec::new(),
            };
            state.memberships.insert(id.clone(), members);
            state.groups.insert(id, object);
        }
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    pub async fn load_seed_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Configuration(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        let seed: DirectorySeed = serde_json::from_str(&content).map_err(|e| {
            AppError::Configuration(format!("Failed to parse seed file {}: {}", path.display(), e))
        })?;
        Self::from_seed(seed)
    }

    pub async fn insert_user(&self, user: Value) -> AppResult<()> {
        self.state.write().await.insert_user(user)
    }

    pub async fn insert_group(&self, group: Value, members: &[&str]) -> AppResult<()> {
        let (id, object) = split_object(group)?;
        let mut state = self.state.write().await;
        state
            .memberships
            .insert(id.clone(), members.iter().map(|m| m.to_string()).collect());
        state.groups.insert(id, object);
        Ok(())
    }

    /// Current member IDs of a group, in binding order
    pub async fn members(&self, group_id: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .memberships
            .get(group_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Owner IDs bound when a group was created
    pub async fn owners(&self, group_id: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .owners
            .get(group_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn split_object(value: Value) -> AppResult<(String, Map<String, Value>)> {
    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(AppError::Configuration(format!(
                "Directory object must be a JSON object, got: {}",
                other
            )))
        }
    };
    let id = object
        .get("id")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| AppError::Configuration("Directory object is missing an 'id'".to_string()))?;
    Ok((id, object))
}

fn bound_member_id(reference: &Value) -> AppResult<String> {
    reference
        .as_str()
        .and_then(|url| url.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::Directory(format!("Invalid member reference: {}", reference)))
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn fetch_members(&self, group_id: &str) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        if !state.groups.contains_key(group_id) {
            return Err(AppError::NotFound(format!("Group {} not found", group_id)));
        }
        Ok(state.memberships.get(group_id).cloned().unwrap_or_default())
    }

    async fn update_resource(&self, kind: ResourceKind, id: &str, fields: &Value) -> AppResult<()> {
        let fields = fields
            .as_object()
            .ok_or_else(|| AppError::BadRequest("Update body must be a JSON object".to_string()))?;

        let mut state = self.state.write().await;
        if !state.objects(kind).contains_key(id) {
            return Err(AppError::NotFound(format!("{} {} not found", kind, id)));
        }

        // Resolve and validate every reference before touching anything
        let mut new_members = Vec::new();
        if let Some(references) = fields.get(MEMBERS_BIND) {
            if kind != ResourceKind::Group {
                return Err(AppError::BadRequest(format!(
                    "{} is only valid for groups",
                    MEMBERS_BIND
                )));
            }
            let references = references.as_array().ok_or_else(|| {
                AppError::BadRequest(format!("{} must be an array", MEMBERS_BIND))
            })?;
            let existing = state.memberships.get(id).cloned().unwrap_or_default();
            for reference in references {
                let member_id = bound_member_id(reference)?;
                if state.object_type(&member_id).is_none() {
                    return Err(AppError::Directory(format!(
                        "Resource '{}' does not exist",
                        member_id
                    )));
                }
                if existing.contains(&member_id) || new_members.contains(&member_id) {
                    return Err(AppError::Directory(
                        "One or more added object references already exist".to_string(),
                    ));
                }
                new_members.push(member_id);
            }
        }

        if let Some(object) = state.objects_mut(kind).get_mut(id) {
            for (key, value) in fields {
                if key == MEMBERS_BIND || key == "id" {
                    continue;
                }
                if value.is_null() {
                    object.remove(key);
                } else {
                    object.insert(key.clone(), value.clone());
                }
            }
        }
        if !new_members.is_empty() {
            debug!(group = id, added = new_members.len(), "bound group members");
            state
                .memberships
                .entry(id.to_string())
                .or_default()
                .extend(new_members);
        }
        Ok(())
    }

    async fn delete_membership_reference(&self, group_id: &str, member_id: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(group_id) {
            return Err(AppError::NotFound(format!("Group {} not found", group_id)));
        }
        let members = state.memberships.entry(group_id.to_string()).or_default();
        match members.iter().position(|m| m == member_id) {
            Some(index) => {
                members.remove(index);
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "{} is not a member of group {}",
                member_id, group_id
            ))),
        }
    }

    async fn fetch_resource(&self, kind: ResourceKind, id: &str) -> AppResult<Option<Value>> {
        let state = self.state.read().await;
        let Some(object) = state.objects(kind).get(id) else {
            return Ok(None);
        };
        let mut object = object.clone();
        if kind == ResourceKind::Group {
            let members: Vec<Value> = state
                .memberships
                .get(id)
                .map(|members| {
                    members
                        .iter()
                        .map(|member_id| {
                            json!({
                                "id": member_id,
                                "@odata.type": state.object_type(member_id),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            object.insert("members".to_string(), Value::Array(members));
        }
        Ok(Some(Value::Object(object)))
    }

    async fn delete_resource(&self, kind: ResourceKind, id: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.objects_mut(kind).remove(id).is_none() {
            return Ok(false);
        }
        match kind {
            ResourceKind::Group => {
                state.memberships.remove(id);
                state.owners.remove(id);
            }
            ResourceKind::User => {
                state.role_assignments.remove(id);
                for owners in state.owners.values_mut() {
                    owners.retain(|o| o != id);
                }
            }
        }
        for members in state.memberships.values_mut() {
            members.retain(|m| m != id);
        }
        Ok(true)
    }

    async fn create_resource(&self, kind: ResourceKind, fields: &Value) -> AppResult<String> {
        let fields = fields
            .as_object()
            .ok_or_else(|| AppError::BadRequest("Create body must be a JSON object".to_string()))?;
        if fields.contains_key(MEMBERS_BIND) {
            return Err(AppError::BadRequest(format!(
                "{} is not accepted on create",
                MEMBERS_BIND
            )));
        }

        let mut state = self.state.write().await;
        let mut owners = Vec::new();
        if let Some(references) = fields.get(OWNERS_BIND) {
            if kind != ResourceKind::Group {
                return Err(AppError::BadRequest(format!(
                    "{} is only valid for groups",
                    OWNERS_BIND
                )));
            }
            let references = references.as_array().ok_or_else(|| {
                AppError::BadRequest(format!("{} must be an array", OWNERS_BIND))
            })?;
            for reference in references {
                let owner_id = bound_member_id(reference)?;
                if !state.users.contains_key(&owner_id) {
                    return Err(AppError::Directory(format!(
                        "Resource '{}' does not exist",
                        owner_id
                    )));
                }
                if !owners.contains(&owner_id) {
                    owners.push(owner_id);
                }
            }
        }

        let id = Uuid::new_v4().to_string();
        let mut object: Map<String, Value> = fields
            .iter()
            .filter(|(key, value)| key.as_str() != OWNERS_BIND && !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        object.insert("id".to_string(), Value::String(id.clone()));
        object.insert(
            "createdDateTime".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );

        if kind == ResourceKind::Group {
            state.memberships.insert(id.clone(), Vec::new());
            state.owners.insert(id.clone(), owners);
        }
        state.objects_mut(kind).insert(id.clone(), object);
        debug!(kind = %kind, id = %id, "created directory object");
        Ok(id)
    }

    async fn find_by_attribute(
        &self,
        kind: ResourceKind,
        attribute: &str,
        value: &str,
    ) -> AppResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state
            .objects(kind)
            .iter()
            .find(|(_, object)| object.get(attribute).and_then(Value::as_str) == Some(value))
            .map(|(id, _)| id.clone()))
    }

    async fn fetch_role_assignments(&self, user_id: &str) -> AppResult<Vec<Value>> {
        let state = self.state.read().await;
        if !state.users.contains_key(user_id) {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(state
            .role_assignments
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
