use std::sync::Arc;

use scim_v2::models::enterprise_user::EnterpriseUser;
use scim_v2::models::scim_schema::Meta;
use scim_v2::models::user::{Address, Email, Name, PhoneNumber, Role};
use serde_json::{Map, Value};

use super::validate_resource_id;
use crate::backend::{DirectoryClient, ResourceKind};
use crate::error::AppResult;
use crate::models::{User, ENTERPRISE_USER_SCHEMA, USER_SCHEMA};
use crate::utils::{normalize_directory_datetime, remove_null_fields};

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(String::from)
}

fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn graph_emails(graph: &Map<String, Value>) -> Vec<Email> {
    let mut emails = Vec::new();
    if let Some(mail) = text(graph, "mail") {
        emails.push(Email {
            value: Some(mail),
            type_: Some("work".to_string()),
            primary: Some(true),
            ..Default::default()
        });
    }
    for other in string_list(graph, "otherMails") {
        emails.push(Email {
            value: Some(other),
            type_: Some("other".to_string()),
            primary: Some(false),
            ..Default::default()
        });
    }
    emails
}

fn graph_phone_numbers(graph: &Map<String, Value>) -> Vec<PhoneNumber> {
    let mobile = text(graph, "mobilePhone");
    let mut phones: Vec<PhoneNumber> = string_list(graph, "businessPhones")
        .into_iter()
        .map(|phone| PhoneNumber {
            value: Some(phone),
            type_: Some("work".to_string()),
            primary: Some(mobile.is_none()),
            ..Default::default()
        })
        .collect();
    if let Some(mobile) = mobile {
        phones.push(PhoneNumber {
            value: Some(mobile),
            type_: Some("mobile".to_string()),
            primary: Some(true),
            ..Default::default()
        });
    }
    phones
}

/// App role assignment → SCIM role
fn assignment_to_role(assignment: &Value) -> Option<Role> {
    let assignment = assignment.as_object()?;
    Some(Role {
        value: text(assignment, "resourceDisplayName"),
        display: text(assignment, "principalDisplayName"),
        type_: text(assignment, "principalType"),
        primary: None,
    })
}

/// Map a Graph user object and its app role assignments to SCIM
pub fn graph_user_to_scim(
    graph: &Map<String, Value>,
    role_assignments: &[Value],
    base_path: &str,
) -> User {
    let mut user = User::default();
    let id = text(graph, "id").unwrap_or_default();

    user.base.id = Some(id.clone());
    user.base.user_name = text(graph, "userPrincipalName").unwrap_or_default();
    user.base.active = Some(
        graph
            .get("accountEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    );
    user.base.display_name = text(graph, "displayName");
    user.base.title = text(graph, "jobTitle");
    user.base.preferred_language = text(graph, "preferredLanguage");

    let given_name = text(graph, "givenName");
    let family_name = text(graph, "surname");
    if given_name.is_some() || family_name.is_some() {
        user.base.name = Some(Name {
            given_name,
            family_name,
            ..Default::default()
        });
    }

    user.base.emails = non_empty(graph_emails(graph));
    user.base.phone_numbers = non_empty(graph_phone_numbers(graph));
    user.base.addresses = text(graph, "streetAddress").map(|street| {
        vec![Address {
            street_address: Some(street),
            type_: Some("home".to_string()),
            ..Default::default()
        }]
    });
    user.base.roles = non_empty(
        role_assignments
            .iter()
            .filter_map(assignment_to_role)
            .collect(),
    );

    user.base.schemas = vec![USER_SCHEMA.to_string()];
    if let Some(department) = text(graph, "department") {
        user.base.enterprise_user = Some(EnterpriseUser {
            department: Some(department),
            ..Default::default()
        });
        user.base.schemas.push(ENTERPRISE_USER_SCHEMA.to_string());
    }

    *user.meta_mut() = Some(Meta {
        resource_type: Some("User".to_string()),
        created: text(graph, "createdDateTime").map(|c| normalize_directory_datetime(&c)),
        last_modified: None,
        location: Some(format!("{}/Users/{}", base_path, id)),
        version: None,
    });
    user
}

/// SCIM JSON body for a user
pub fn user_response(user: &User) -> AppResult<Value> {
    let body = serde_json::to_value(user)?;
    Ok(remove_null_fields(&body))
}

/// User read operations handler
pub struct UserReadOps {
    directory: Arc<dyn DirectoryClient>,
    base_path: String,
}

impl UserReadOps {
    pub fn new(directory: Arc<dyn DirectoryClient>, base_path: impl Into<String>) -> Self {
        Self {
            directory,
            base_path: base_path.into(),
        }
    }

    /// Fetch a user as SCIM JSON, `None` when the directory has no such user
    pub async fn get_user(&self, id: &str) -> AppResult<Option<Value>> {
        validate_resource_id(id)?;
        let Some(graph) = self.directory.fetch_resource(ResourceKind::User, id).await? else {
            return Ok(None);
        };
        let Some(graph) = graph.as_object() else {
            return Ok(None);
        };
        let roles = self.directory.fetch_role_assignments(id).await?;
        let user = graph_user_to_scim(graph, &roles, &self.base_path);
        user_response(&user).map(Some)
    }
}
