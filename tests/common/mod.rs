#![allow(dead_code)]

use axum::Router;
use scim_graph_bridge::backend::{DirectoryClient, InMemoryDirectory};
use scim_graph_bridge::config::AppConfig;
use scim_graph_bridge::models::PATCH_OP_SCHEMA;
use serde_json::{json, Value};
use std::sync::Arc;

pub const BASE: &str = "/scim/v2";

/// Directory preloaded with three users and two groups:
/// `staff` = [alice, bob], `empty` = []
pub async fn seeded_directory() -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .insert_user(json!({
            "id": "alice",
            "userPrincipalName": "alice@example.com",
            "accountEnabled": true,
            "displayName": "Alice Example",
            "givenName": "Alice",
            "surname": "Example",
            "mail": "alice@example.com",
            "department": "Engineering",
            "jobTitle": "Engineer",
            "mobilePhone": "+1 555 0100",
            "businessPhones": ["+1 555 0101"],
            "createdDateTime": "2024-01-01T00:00:00Z",
            "appRoleAssignments": [{
                "principalDisplayName": "Alice Example",
                "principalType": "User",
                "resourceDisplayName": "Payroll"
            }]
        }))
        .await
        .unwrap();
    directory
        .insert_user(json!({
            "id": "bob",
            "userPrincipalName": "bob@example.com",
            "accountEnabled": true,
            "displayName": "Bob Example"
        }))
        .await
        .unwrap();
    directory
        .insert_user(json!({
            "id": "carol",
            "userPrincipalName": "carol@example.com",
            "accountEnabled": false,
            "displayName": "Carol Example"
        }))
        .await
        .unwrap();
    directory
        .insert_group(json!({"id": "staff", "displayName": "Staff"}), &["alice", "bob"])
        .await
        .unwrap();
    directory
        .insert_group(json!({"id": "empty", "displayName": "Empty"}), &[])
        .await
        .unwrap();
    directory
}

/// Router over the seeded directory; the directory is returned for assertions
pub async fn setup_test_app() -> (Router, Arc<InMemoryDirectory>) {
    let directory = seeded_directory().await;
    let app_config = Arc::new(AppConfig::default_config());
    let client: Arc<dyn DirectoryClient> = directory.clone();
    let app = scim_graph_bridge::build_router(client, app_config);
    (app, directory)
}

/// Wire PatchOp body for the given operations
pub fn patch_body(operations: Value) -> Value {
    json!({
        "schemas": [PATCH_OP_SCHEMA],
        "Operations": operations
    })
}

pub fn user_url(id: &str) -> String {
    format!("{}/Users/{}", BASE, id)
}

pub fn group_url(id: &str) -> String {
    format!("{}/Groups/{}", BASE, id)
}
