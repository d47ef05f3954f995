//! Attribute table for user targets.

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::debug;

use crate::error::AppResult;
use crate::patch::dispatch::{DispatchContext, Handler, PatchTarget};
use crate::patch::operation::{OperationName, PatchOperation};
use crate::patch::target::{FieldUpdate, TargetUser};

const PHONE_MOBILE: &str = "mobile";
const PHONE_WORK: &str = "work";
const EMAIL_OTHER: &str = "other";

lazy_static! {
    static ref USER_HANDLERS: HashMap<&'static str, Handler<TargetUser>> = {
        let mut handlers: HashMap<&'static str, Handler<TargetUser>> = HashMap::new();
        handlers.insert("active", patch_active);
        handlers.insert("addresses", patch_street_address);
        handlers.insert("displayname", patch_display_name);
        handlers.insert("emails", patch_emails);
        handlers.insert("name", patch_name);
        handlers.insert("phonenumbers", patch_phone_numbers);
        handlers.insert("preferredlanguage", patch_preferred_language);
        handlers.insert("title", patch_title);
        handlers.insert("department", patch_department);
        handlers.insert("username", patch_user_name);
        handlers
    };
}

impl PatchTarget for TargetUser {
    const KIND: &'static str = "User";

    fn handler(attribute: &str) -> Option<Handler<Self>> {
        USER_HANDLERS
            .get(attribute.to_ascii_lowercase().as_str())
            .copied()
    }
}

fn single_string(operation: &PatchOperation) -> AppResult<Option<String>> {
    Ok(operation.single_value()?.and_then(|v| v.value.clone()))
}

fn patch_active(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    if op.is_remove() {
        return Ok(());
    }
    let parsed = single_string(op)?
        .and_then(|v| v.trim().to_ascii_lowercase().parse::<bool>().ok());
    match parsed {
        Some(active) => user.account_enabled.set(active),
        None => debug!("ignoring non-boolean value for active"),
    }
    Ok(())
}

fn patch_street_address(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    if op.is_remove() {
        return Ok(());
    }
    if let Some(value) = op.single_value()? {
        user.street_address.set_or_clear(value.value.clone());
    }
    Ok(())
}

fn patch_display_name(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    // Display name is required downstream and cannot be cleared
    if op.is_remove() {
        return Ok(());
    }
    if let Some(display_name) = single_string(op)? {
        user.display_name.set(display_name);
    }
    Ok(())
}

fn patch_emails(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    let other = op
        .filter()
        .is_some_and(|f| {
            f.attribute.eq_ignore_ascii_case("type") && f.comparison_value == EMAIL_OTHER
        });

    if other {
        if op.is_remove() {
            user.other_mails.clear();
        } else {
            let mails: Vec<String> = op.values.iter().filter_map(|v| v.value.clone()).collect();
            user.other_mails.set(mails);
        }
        return Ok(());
    }

    // Remove leaves mail untouched; the primary mail is only ever replaced
    if op.is_remove() {
        return Ok(());
    }
    if let Some(first) = op.first_value() {
        user.mail.set_or_clear(first.value.clone());
    }
    Ok(())
}

fn patch_name(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    if op.name != OperationName::Replace {
        return Ok(());
    }
    let field = match op.value_path() {
        Some(sub) if sub.eq_ignore_ascii_case("givenName") => &mut user.given_name,
        Some(sub) if sub.eq_ignore_ascii_case("familyName") => &mut user.surname,
        _ => return Ok(()),
    };
    if let Some(value) = op.single_value()? {
        field.set_or_clear(value.value.clone());
    }
    Ok(())
}

fn patch_phone_numbers(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    let phone_type = match op.filter() {
        Some(filter) if filter.attribute.eq_ignore_ascii_case("type") => {
            filter.comparison_value.as_str()
        }
        _ => return Ok(()),
    };

    if op.is_remove() {
        if phone_type == PHONE_MOBILE {
            debug!("rejecting removal of mobile phone");
        } else {
            user.business_phones.set(Vec::new());
        }
        return Ok(());
    }

    match phone_type {
        PHONE_MOBILE => {
            let value = op.single_value()?;
            user.mobile_phone.set_or_clear(value.and_then(|v| v.value.clone()));
        }
        PHONE_WORK => {
            let phones = single_string(op)?.into_iter().collect();
            user.business_phones.set(phones);
        }
        _ => {}
    }
    Ok(())
}

/// Add/Replace sets the field. Remove clears it only when no value is given
/// or the given value matches the current one ignoring case; a mismatch
/// leaves the field untouched.
fn patch_conditionally_removable(
    field: &mut FieldUpdate<String>,
    op: &PatchOperation,
) -> AppResult<()> {
    let value = op.single_value()?;

    if op.is_remove() {
        let matches = match value {
            None => true,
            Some(supplied) => match (field.current(), supplied.as_str()) {
                (Some(current), Some(supplied)) => {
                    current.to_lowercase() == supplied.to_lowercase()
                }
                (None, None) => true,
                _ => false,
            },
        };
        if matches {
            field.clear();
        } else {
            debug!(attribute = op.attribute(), "remove value does not match current value");
        }
        return Ok(());
    }

    field.set_or_clear(value.and_then(|v| v.value.clone()));
    Ok(())
}

fn patch_preferred_language(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    patch_conditionally_removable(&mut user.preferred_language, op)
}

fn patch_title(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    patch_conditionally_removable(&mut user.job_title, op)
}

fn patch_department(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    patch_conditionally_removable(&mut user.department, op)
}

fn patch_user_name(
    user: &mut TargetUser,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    if op.is_remove() {
        return Ok(());
    }
    if let Some(user_name) = single_string(op)? {
        user.user_principal_name.set(user_name);
    }
    Ok(())
}
