use std::sync::Arc;

use scim_v2::models::group::Member;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::{GroupReadOps, UserReadOps};
use crate::backend::{DirectoryClient, ResourceKind};
use crate::error::{AppError, AppResult};
use crate::models::User;

const OWNER_MEMBER_TYPE: &str = "owner";

/// SCIM group create body. The scim_v2 group model requires an `id`, which a
/// create request must not carry, so the request is read on its own.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreateRequest {
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

/// Processor for user create business logic
pub struct UserCreateProcessor;

impl UserCreateProcessor {
    /// Build the Graph user body for a SCIM create request. Pure.
    pub fn prepare_user_for_create(user: &User) -> AppResult<Value> {
        if user.base.id.is_some() {
            return Err(AppError::BadRequest(
                "id must not be set when creating a user".to_string(),
            ));
        }
        let user_name = user.base.user_name.trim();
        if user_name.is_empty() {
            return Err(AppError::BadRequest("userName is required".to_string()));
        }
        if !user.additional_fields.is_empty() {
            debug!(
                attributes = ?user.additional_fields.keys().collect::<Vec<_>>(),
                "ignoring attributes with no directory mapping"
            );
        }

        let mail_nickname = user_name.split('@').next().unwrap_or(user_name);
        let mut fields = Map::new();
        fields.insert("accountEnabled".to_string(), json!(true));
        fields.insert("userPrincipalName".to_string(), json!(user_name));
        fields.insert("mailNickname".to_string(), json!(mail_nickname));
        fields.insert(
            "passwordProfile".to_string(),
            json!({
                "forceChangePasswordNextSignIn": true,
                "password": Uuid::new_v4().to_string(),
            }),
        );

        if let Some(display_name) = &user.base.display_name {
            fields.insert("displayName".to_string(), json!(display_name));
            let mut names = display_name.split_whitespace();
            if let Some(first) = names.next() {
                let last = names.last().unwrap_or(first);
                fields.insert("givenName".to_string(), json!(first));
                fields.insert("surname".to_string(), json!(last));
            }
        }
        if let Some(title) = &user.base.title {
            fields.insert("jobTitle".to_string(), json!(title));
        }

        let mut other_mails = Vec::new();
        for email in user.base.emails.iter().flatten() {
            let Some(value) = &email.value else {
                continue;
            };
            if email.primary == Some(true) {
                fields.insert("mail".to_string(), json!(value));
            } else {
                other_mails.push(value.clone());
            }
        }
        if !other_mails.is_empty() {
            fields.insert("otherMails".to_string(), json!(other_mails));
        }

        // Any non-mobile number replaces the business phones; the last one wins
        for phone in user.base.phone_numbers.iter().flatten() {
            let Some(value) = &phone.value else {
                continue;
            };
            let is_mobile = phone
                .type_
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("mobile"));
            if is_mobile {
                fields.insert("mobilePhone".to_string(), json!(value));
            } else {
                fields.insert("businessPhones".to_string(), json!([value]));
            }
        }

        Ok(Value::Object(fields))
    }
}

/// Processor for group create business logic
pub struct GroupCreateProcessor;

impl GroupCreateProcessor {
    /// Owner IDs among the requested members
    pub fn owners(request: &GroupCreateRequest) -> Vec<&str> {
        request
            .members
            .iter()
            .filter(|m| {
                m.type_
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(OWNER_MEMBER_TYPE))
            })
            .filter_map(|m| m.value.as_deref())
            .filter(|value| !value.trim().is_empty())
            .collect()
    }

    /// Build the Graph group body for a SCIM create request. Pure.
    ///
    /// Owners are bound under `{bind_base}/users/`; other members are not
    /// part of the create.
    pub fn prepare_group_for_create(
        request: &GroupCreateRequest,
        bind_base: &str,
    ) -> AppResult<Value> {
        if request.id.is_some() {
            return Err(AppError::BadRequest(
                "id must not be set when creating a group".to_string(),
            ));
        }
        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::BadRequest("displayName is required".to_string()))?;

        let owners = Self::owners(request);
        if owners.is_empty() {
            return Err(AppError::BadRequest(
                "At least one owner (member type: 'owner') must be sent to create a group"
                    .to_string(),
            ));
        }

        let base = bind_base.trim_end_matches('/');
        let owner_refs: Vec<String> = owners
            .iter()
            .map(|owner| format!("{}/users/{}", base, owner))
            .collect();

        Ok(json!({
            "displayName": display_name,
            "mailNickname": display_name,
            "mailEnabled": false,
            "securityEnabled": true,
            "groupTypes": [],
            "owners@odata.bind": owner_refs,
        }))
    }
}

/// Create operations for users and groups
pub struct ResourceCreateOps {
    directory: Arc<dyn DirectoryClient>,
    base_path: String,
    bind_base: String,
}

impl ResourceCreateOps {
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        base_path: impl Into<String>,
        bind_base: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            base_path: base_path.into(),
            bind_base: bind_base.into(),
        }
    }

    /// Create a user and return its SCIM representation
    pub async fn create_user(&self, user: &User) -> AppResult<Value> {
        let fields = UserCreateProcessor::prepare_user_for_create(user)?;
        let user_name = user.base.user_name.trim();

        let existing = self
            .directory
            .find_by_attribute(ResourceKind::User, "userPrincipalName", user_name)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "User {} already exists",
                user_name
            )));
        }

        let id = self
            .directory
            .create_resource(ResourceKind::User, &fields)
            .await?;
        info!(user = %id, user_name = user_name, "user created");

        UserReadOps::new(self.directory.clone(), self.base_path.clone())
            .get_user(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Created user {} could not be read", id)))
    }

    /// Create a group owned by the requested owners and return its SCIM
    /// representation
    pub async fn create_group(&self, request: &GroupCreateRequest) -> AppResult<Value> {
        let fields = GroupCreateProcessor::prepare_group_for_create(request, &self.bind_base)?;
        let display_name = fields["displayName"].as_str().unwrap_or_default();

        let existing = self
            .directory
            .find_by_attribute(ResourceKind::Group, "displayName", display_name)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "Group {} already exists",
                display_name
            )));
        }

        let id = self
            .directory
            .create_resource(ResourceKind::Group, &fields)
            .await?;
        info!(group = %id, display_name = display_name, "group created");

        GroupReadOps::new(self.directory.clone(), self.base_path.clone())
            .get_group(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Created group {} could not be read", id)))
    }
}
