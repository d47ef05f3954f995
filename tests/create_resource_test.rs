use axum_test::TestServer;
use http::StatusCode;
use scim_graph_bridge::backend::{DirectoryClient, ResourceKind};
use serde_json::{json, Value};

mod common;

const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

#[tokio::test]
async fn test_create_user_returns_created_resource() {
    let (app, directory) = common::setup_test_app().await;
    let server = TestServer::new(app).unwrap();

    let response = server
        .post(&format!("{}/Users", common::BASE))
        .json(&json!({
            "schemas": [USER_SCHEMA],
            "userName": "dave@example.com",
            "displayName": "Dave Example",
            "title": "Analyst",
            "emails": [{"value": "dave@example.com", "type": "work", "primary": true}],
            "phoneNumbers": [{"value": "+1 555 0200", "type": "mobile"}]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let location = response.header("location");
    let user: Value = response.json();
    let id = user["id"].as_str().unwrap();
    assert_eq!(location.to_str().unwrap(), common::user_url(id));
    assert_eq!(user["userName"], "dave@example.com");
    assert_eq!(user["title"], "Analyst");
    assert_eq!(user["name"]["givenName"], "Dave");
    assert_eq!(user["phoneNumbers"][0]["type"], "mobile");

    let graph = directory
        .fetch_resource(ResourceKind::User, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(graph["mailNickname"], "dave");
    assert_eq!(graph["accountEnabled"], true);

    server
        .get(&common::user_url(id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_create_user_with_existing_user_name_conflicts() {
    let (app, _) = common::setup_test_app().await;
    let server = TestServer::new(app).unwrap();

    let response = server
        .post(&format!("{}/Users", common::BASE))
        .json(&json!({"schemas": [USER_SCHEMA], "userName": "alice@example.com"}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let error: Value = response.json();
    assert_eq!(error["scimType"], "uniqueness");
}

#[tokio::test]
async fn test_create_user_user_name_match_is_case_sensitive() {
    let (app, _) = common::setup_test_app().await;
    let server = TestServer::new(app).unwrap();

    server
        .post(&format!("{}/Users", common::BASE))
        .json(&json!({"schemas": [USER_SCHEMA], "userName": "Alice@example.com"}))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_user_rejects_client_id_and_missing_user_name() {
    let (app, _) = common::setup_test_app().await;
    let server = TestServer::new(app).unwrap();

    server
        .post(&format!("{}/Users", common::BASE))
        .json(&json!({"schemas": [USER_SCHEMA], "id": "x1", "userName": "x@example.com"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post(&format!("{}/Users", common::BASE))
        .json(&json!({"schemas": [USER_SCHEMA], "displayName": "No Name"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["scimType"], "invalidValue");
}

#[tokio::test]
async fn test_create_group_binds_owner() {
    let (app, directory) = common::setup_test_app().await;
    let server = TestServer::new(app).unwrap();

    let response = server
        .post(&format!("{}/Groups", common::BASE))
        .json(&json!({
            "schemas": [GROUP_SCHEMA],
            "displayName": "Operations",
            "members": [
                {"value": "alice", "type": "owner"},
                {"value": "bob", "type": "User"}
            ]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let group: Value = response.json();
    let id = group["id"].as_str().unwrap();
    assert_eq!(group["displayName"], "Operations");
    assert_eq!(group["meta"]["location"], common::group_url(id));
    assert_eq!(directory.owners(id).await, vec!["alice"]);
    assert!(directory.members(id).await.is_empty());
}

#[tokio::test]
async fn test_create_group_without_owner_is_rejected() {
    let (app, _) = common::setup_test_app().await;
    let server = TestServer::new(app).unwrap();

    let response = server
        .post(&format!("{}/Groups", common::BASE))
        .json(&json!({
            "schemas": [GROUP_SCHEMA],
            "displayName": "Operations",
            "members": [{"value": "bob", "type": "User"}]
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert!(error["detail"].as_str().unwrap().contains("owner"));
}

#[tokio::test]
async fn test_create_group_with_existing_name_conflicts() {
    let (app, _) = common::setup_test_app().await;
    let server = TestServer::new(app).unwrap();

    server
        .post(&format!("{}/Groups", common::BASE))
        .json(&json!({
            "schemas": [GROUP_SCHEMA],
            "displayName": "Staff",
            "members": [{"value": "alice", "type": "owner"}]
        }))
        .await
        .assert_status(StatusCode::CONFLICT);
}
