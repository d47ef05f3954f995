//! Attribute table for group targets.

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::debug;

use crate::error::AppResult;
use crate::patch::dispatch::{DispatchContext, Handler, PatchTarget};
use crate::patch::operation::{OperationName, PatchOperation};
use crate::patch::target::{DeferredCall, TargetGroup};

lazy_static! {
    static ref GROUP_HANDLERS: HashMap<&'static str, Handler<TargetGroup>> = {
        let mut handlers: HashMap<&'static str, Handler<TargetGroup>> = HashMap::new();
        handlers.insert("displayname", patch_display_name);
        handlers.insert("members", patch_members);
        handlers
    };
}

impl PatchTarget for TargetGroup {
    const KIND: &'static str = "Group";

    fn handler(attribute: &str) -> Option<Handler<Self>> {
        GROUP_HANDLERS
            .get(attribute.to_ascii_lowercase().as_str())
            .copied()
    }
}

fn patch_display_name(
    group: &mut TargetGroup,
    op: &PatchOperation,
    _: &mut DispatchContext,
) -> AppResult<()> {
    if op.is_remove() {
        return Ok(());
    }
    if let Some(display_name) = op.single_value()?.and_then(|v| v.value.clone()) {
        group.display_name.set(display_name);
    }
    Ok(())
}

/// Member identifiers addressed by the operation: the supplied values, or
/// the filter value for `members[value eq "id"]`.
fn member_ids(op: &PatchOperation) -> Vec<String> {
    let mut ids: Vec<String> = op.values.iter().filter_map(|v| v.value.clone()).collect();
    if ids.is_empty() {
        if let Some(filter) = op.filter() {
            if filter.attribute.eq_ignore_ascii_case("value") {
                ids.push(filter.comparison_value.clone());
            }
        }
    }
    ids
}

fn patch_members(
    group: &mut TargetGroup,
    op: &PatchOperation,
    context: &mut DispatchContext,
) -> AppResult<()> {
    match op.name {
        OperationName::Add => {
            for member_id in member_ids(op) {
                // An earlier remove in this request is superseded by the add
                let cancelled = context.cancel(|call| match call {
                    DeferredCall::RemoveGroupMember {
                        group_id,
                        member_id: pending,
                    } => *group_id == group.id && *pending == member_id,
                });
                if cancelled > 0 {
                    group.members_to_remove.retain(|m| *m != member_id);
                }

                if group.is_current_member(&member_id) || group.is_staged_for_add(&member_id) {
                    debug!(group = %group.id, member = %member_id, "member already present");
                    continue;
                }
                group.members_to_add.push(member_id);
            }
        }
        OperationName::Remove => {
            if group.current_members.is_none() {
                return Ok(());
            }
            let ids = member_ids(op);
            if ids.is_empty() {
                return Ok(());
            }
            for member_id in ids {
                // Never bound, so there is no reference to delete
                if group.is_staged_for_add(&member_id) {
                    group.members_to_add.retain(|m| *m != member_id);
                    continue;
                }
                if !group.members_to_remove.contains(&member_id) {
                    group.members_to_remove.push(member_id.clone());
                }
                context.defer(DeferredCall::RemoveGroupMember {
                    group_id: group.id.clone(),
                    member_id,
                });
            }
        }
        OperationName::Replace => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::dispatch::apply_all;
    use crate::patch::target::FieldUpdate;
    use serde_json::{json, Value};

    fn op(name: &str, path: &str, value: Value) -> PatchOperation {
        let value = if value.is_null() { None } else { Some(value) };
        PatchOperation::parse(name, path, value.as_ref()).unwrap()
    }

    fn run(group: &mut TargetGroup, operations: &[PatchOperation]) -> Vec<DeferredCall> {
        let mut context = DispatchContext::new();
        apply_all(operations, group, &mut context).unwrap();
        context.into_deferred()
    }

    fn removal(group_id: &str, member_id: &str) -> DeferredCall {
        DeferredCall::RemoveGroupMember {
            group_id: group_id.to_string(),
            member_id: member_id.to_string(),
        }
    }

    #[test]
    fn test_display_name_set_and_remove_noop() {
        let mut group = TargetGroup::with_members("g1", Vec::<String>::new());
        let deferred = run(
            &mut group,
            &[
                op("replace", "displayName", json!("Engineering")),
                op("remove", "displayName", Value::Null),
            ],
        );
        assert!(deferred.is_empty());
        assert_eq!(group.display_name, FieldUpdate::Set("Engineering".to_string()));
    }

    #[test]
    fn test_add_skips_existing_members() {
        let mut group = TargetGroup::with_members("g1", ["A", "B"]);
        let deferred = run(
            &mut group,
            &[op("add", "members", json!([{"value": "A"}, {"value": "C"}]))],
        );
        assert!(deferred.is_empty());
        assert_eq!(group.members_to_add, vec!["C".to_string()]);
    }

    #[test]
    fn test_repeated_adds_accumulate_without_duplicates() {
        let mut group = TargetGroup::with_members("g1", ["A"]);
        run(
            &mut group,
            &[
                op("add", "members", json!([{"value": "C"}])),
                op("add", "members", json!([{"value": "D"}, {"value": "C"}])),
            ],
        );
        assert_eq!(group.members_to_add, vec!["C".to_string(), "D".to_string()]);
    }

    #[test]
    fn test_remove_defers_one_call_per_member() {
        let mut group = TargetGroup::with_members("g1", ["A", "B"]);
        let deferred = run(
            &mut group,
            &[op("remove", "members", json!([{"value": "A"}, {"value": "Z"}]))],
        );
        assert_eq!(deferred, vec![removal("g1", "A"), removal("g1", "Z")]);
        assert_eq!(group.members_to_remove, vec!["A".to_string(), "Z".to_string()]);
        assert!(group.members_to_add.is_empty());
    }

    #[test]
    fn test_remove_by_value_filter() {
        let mut group = TargetGroup::with_members("g1", ["A", "B"]);
        let deferred = run(&mut group, &[op("remove", r#"members[value eq "B"]"#, Value::Null)]);
        assert_eq!(deferred, vec![removal("g1", "B")]);
    }

    #[test]
    fn test_remove_without_snapshot_is_noop() {
        let mut group = TargetGroup::new("g1");
        let deferred = run(&mut group, &[op("remove", "members", json!([{"value": "A"}]))]);
        assert!(deferred.is_empty());
        assert!(group.members_to_remove.is_empty());
    }

    #[test]
    fn test_remove_without_identifiers_is_noop() {
        let mut group = TargetGroup::with_members("g1", ["A"]);
        let deferred = run(&mut group, &[op("remove", "members", Value::Null)]);
        assert!(deferred.is_empty());
    }

    #[test]
    fn test_remove_after_add_unstages_instead_of_deferring() {
        let mut group = TargetGroup::with_members("g1", ["A"]);
        let deferred = run(
            &mut group,
            &[
                op("add", "members", json!([{"value": "C"}])),
                op("remove", "members", json!([{"value": "C"}])),
            ],
        );
        assert!(deferred.is_empty());
        assert!(group.members_to_add.is_empty());
    }

    #[test]
    fn test_add_after_remove_cancels_pending_removal() {
        let mut group = TargetGroup::with_members("g1", ["A", "B"]);
        let deferred = run(
            &mut group,
            &[
                op("remove", "members", json!([{"value": "A"}, {"value": "B"}])),
                op("add", "members", json!([{"value": "A"}])),
            ],
        );
        assert_eq!(deferred, vec![removal("g1", "B")]);
        assert_eq!(group.members_to_remove, vec!["B".to_string()]);
        assert!(group.members_to_add.is_empty());
    }

    #[test]
    fn test_replace_members_is_noop() {
        let mut group = TargetGroup::with_members("g1", ["A"]);
        let deferred = run(&mut group, &[op("replace", "members", json!([{"value": "B"}]))]);
        assert!(deferred.is_empty());
        assert!(group.members_to_add.is_empty());
    }

    #[test]
    fn test_unknown_attribute_is_noop() {
        let mut group = TargetGroup::with_members("g1", ["A"]);
        let before = group.clone();
        let deferred = run(&mut group, &[op("add", "externalId", json!("ext-1"))]);
        assert!(deferred.is_empty());
        assert_eq!(group, before);
    }
}
