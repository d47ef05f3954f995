//! In-memory projections of directory objects that patch operations mutate.
//!
//! A target only records what the patch touched; [`TargetUser::to_fields`]
//! and [`TargetGroup::to_fields`] turn that into the Graph-shaped update
//! body sent to the directory.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppResult;

/// Pending change to one field of a target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    Unchanged,
    Set(T),
    Cleared,
}

impl<T> FieldUpdate<T> {
    /// Value the field holds after the operations applied so far.
    pub fn current(&self) -> Option<&T> {
        match self {
            FieldUpdate::Set(value) => Some(value),
            FieldUpdate::Unchanged | FieldUpdate::Cleared => None,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldUpdate::Unchanged)
    }

    pub fn set(&mut self, value: T) {
        *self = FieldUpdate::Set(value);
    }

    pub fn clear(&mut self) {
        *self = FieldUpdate::Cleared;
    }

    /// Set from an optional value, clearing on `None`.
    pub fn set_or_clear(&mut self, value: Option<T>) {
        match value {
            Some(value) => self.set(value),
            None => self.clear(),
        }
    }
}

impl<T: Serialize> FieldUpdate<T> {
    fn write_to(&self, fields: &mut Map<String, Value>, key: &str) -> AppResult<()> {
        match self {
            FieldUpdate::Unchanged => {}
            FieldUpdate::Set(value) => {
                fields.insert(key.to_string(), serde_json::to_value(value)?);
            }
            FieldUpdate::Cleared => {
                fields.insert(key.to_string(), Value::Null);
            }
        }
        Ok(())
    }
}

/// Mutable projection of a directory user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetUser {
    pub account_enabled: FieldUpdate<bool>,
    pub display_name: FieldUpdate<String>,
    pub given_name: FieldUpdate<String>,
    pub surname: FieldUpdate<String>,
    pub mail: FieldUpdate<String>,
    pub other_mails: FieldUpdate<Vec<String>>,
    pub job_title: FieldUpdate<String>,
    pub department: FieldUpdate<String>,
    pub preferred_language: FieldUpdate<String>,
    pub user_principal_name: FieldUpdate<String>,
    pub street_address: FieldUpdate<String>,
    pub business_phones: FieldUpdate<Vec<String>>,
    pub mobile_phone: FieldUpdate<String>,
}

impl TargetUser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }

    /// Graph user update body containing only touched fields.
    pub fn to_fields(&self) -> AppResult<Value> {
        let mut fields = Map::new();
        self.account_enabled.write_to(&mut fields, "accountEnabled")?;
        self.display_name.write_to(&mut fields, "displayName")?;
        self.given_name.write_to(&mut fields, "givenName")?;
        self.surname.write_to(&mut fields, "surname")?;
        self.mail.write_to(&mut fields, "mail")?;
        self.other_mails.write_to(&mut fields, "otherMails")?;
        self.job_title.write_to(&mut fields, "jobTitle")?;
        self.department.write_to(&mut fields, "department")?;
        self.preferred_language.write_to(&mut fields, "preferredLanguage")?;
        self.user_principal_name.write_to(&mut fields, "userPrincipalName")?;
        self.street_address.write_to(&mut fields, "streetAddress")?;
        self.business_phones.write_to(&mut fields, "businessPhones")?;
        self.mobile_phone.write_to(&mut fields, "mobilePhone")?;
        Ok(Value::Object(fields))
    }
}

/// Mutable projection of a directory group plus its pending membership delta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetGroup {
    pub id: String,
    pub display_name: FieldUpdate<String>,
    pub members_to_add: Vec<String>,
    pub members_to_remove: Vec<String>,
    /// Membership before the patch; used for diffing only, never persisted.
    pub current_members: Option<HashSet<String>>,
}

impl TargetGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_members<I, S>(id: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            current_members: Some(members.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn is_current_member(&self, member_id: &str) -> bool {
        self.current_members
            .as_ref()
            .is_some_and(|members| members.contains(member_id))
    }

    pub fn is_staged_for_add(&self, member_id: &str) -> bool {
        self.members_to_add.iter().any(|m| m == member_id)
    }

    /// Graph group update body. Membership additions are expressed as
    /// `members@odata.bind` references under `bind_base`.
    pub fn to_fields(&self, bind_base: &str) -> AppResult<Value> {
        let mut fields = Map::new();
        self.display_name.write_to(&mut fields, "displayName")?;
        if !self.members_to_add.is_empty() {
            let base = bind_base.trim_end_matches('/');
            let references: Vec<Value> = self
                .members_to_add
                .iter()
                .map(|id| Value::String(format!("{}/directoryObjects/{}", base, id)))
                .collect();
            fields.insert("members@odata.bind".to_string(), Value::Array(references));
        }
        Ok(Value::Object(fields))
    }
}

/// Side effect that cannot be expressed as a field update and runs after
/// the update has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredCall {
    RemoveGroupMember { group_id: String, member_id: String },
}

impl fmt::Display for DeferredCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferredCall::RemoveGroupMember {
                group_id,
                member_id,
            } => write!(f, "remove member {} from group {}", member_id, group_id),
        }
    }
}
