use std::sync::Arc;

use scim_v2::models::group::Member;
use serde_json::{json, Map, Value};

use super::validate_resource_id;
use crate::backend::{DirectoryClient, ResourceKind};
use crate::error::AppResult;
use crate::models::{Group, GROUP_SCHEMA};
use crate::utils::{normalize_directory_datetime, remove_null_fields};

/// SCIM member type for a Graph `@odata.type`
fn member_type(odata_type: Option<&str>) -> &'static str {
    match odata_type {
        Some(t) if t.eq_ignore_ascii_case("#microsoft.graph.group") => "Group",
        _ => "User",
    }
}

/// Map a Graph group object (with expanded `members`) to SCIM
pub fn graph_group_to_scim(graph: &Map<String, Value>, base_path: &str) -> Group {
    let mut group = Group::default();
    let id = graph
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    group.base.display_name = graph
        .get("displayName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let members: Vec<Member> = graph
        .get("members")
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter_map(|member| {
                    let member_id = member.get("id").and_then(Value::as_str)?;
                    let type_ = member_type(member.get("@odata.type").and_then(Value::as_str));
                    Some(Member {
                        value: Some(member_id.to_string()),
                        ref_: Some(format!("{}/{}s/{}", base_path, type_, member_id)),
                        display: member
                            .get("displayName")
                            .and_then(Value::as_str)
                            .map(String::from),
                        type_: Some(type_.to_string()),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    if !members.is_empty() {
        group.base.members = Some(members);
    }

    *group.meta_mut() = Some(scim_v2::models::scim_schema::Meta {
        resource_type: Some("Group".to_string()),
        created: graph
            .get("createdDateTime")
            .and_then(Value::as_str)
            .map(normalize_directory_datetime),
        last_modified: None,
        location: Some(format!("{}/Groups/{}", base_path, id)),
        version: None,
    });
    group.base.id = id;
    group
}

/// SCIM JSON body for a group
pub fn group_response(group: &Group) -> AppResult<Value> {
    let mut body = serde_json::to_value(group)?;
    body["schemas"] = json!([GROUP_SCHEMA]);
    Ok(remove_null_fields(&body))
}

/// Group read operations handler
pub struct GroupReadOps {
    directory: Arc<dyn DirectoryClient>,
    base_path: String,
}

impl GroupReadOps {
    pub fn new(directory: Arc<dyn DirectoryClient>, base_path: impl Into<String>) -> Self {
        Self {
            directory,
            base_path: base_path.into(),
        }
    }

    pub async fn get_group(&self, id: &str) -> AppResult<Option<Value>> {
        validate_resource_id(id)?;
        let Some(graph) = self.directory.fetch_resource(ResourceKind::Group, id).await? else {
            return Ok(None);
        };
        let Some(graph) = graph.as_object() else {
            return Ok(None);
        };
        let group = graph_group_to_scim(graph, &self.base_path);
        group_response(&group).map(Some)
    }
}
