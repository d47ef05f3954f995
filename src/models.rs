use scim_v2::models::{group::Group as ScimGroup, user::User as ScimUser};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";
pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const ENTERPRISE_USER_SCHEMA: &str =
    "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
pub const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

/// SCIM-compliant PatchOperation struct that matches RFC 7644 specification
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScimPatchOperation {
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// SCIM-compliant PatchOp struct that matches RFC 7644 specification
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScimPatchOp {
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(rename = "Operations", default)]
    pub operations: Vec<ScimPatchOperation>,
}

impl ScimPatchOp {
    pub fn is_patch_op(&self) -> bool {
        self.schemas.iter().any(|s| s == PATCH_OP_SCHEMA)
    }
}

/// SCIM User exchanged with clients. Attributes outside the scim_v2 model,
/// such as custom extension schemas, land in `additional_fields` and are not
/// mapped to the directory.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct User {
    #[serde(flatten)]
    pub base: ScimUser,
    #[serde(flatten)]
    pub additional_fields: std::collections::HashMap<String, Value>,
}

impl User {
    pub fn meta_mut(&mut self) -> &mut Option<scim_v2::models::scim_schema::Meta> {
        &mut self.base.meta
    }
}

/// SCIM Group returned by retrieve
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Group {
    #[serde(flatten)]
    pub base: ScimGroup,
}

impl Group {
    pub fn members(&self) -> &Option<Vec<scim_v2::models::group::Member>> {
        &self.base.members
    }

    pub fn meta_mut(&mut self) -> &mut Option<scim_v2::models::scim_schema::Meta> {
        &mut self.base.meta
    }
}
