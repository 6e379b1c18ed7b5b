//! Tests for login, logout and session persistence.

use axum::http::StatusCode;
use dashboard_core::{FileStorage, SessionStorage, SessionStore, TOKEN_KEY, USER_KEY};
use integration_tests::{fixtures, setup::TestContext};
use serde_json::{json, Value};
use std::sync::Arc;

/// Valid analyst credentials store a session and point at the analyst landing
#[tokio::test]
async fn test_login_stores_session() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/login")
        .json(&json!({ "email": fixtures::ANALYST_EMAIL, "password": fixtures::PASSWORD }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["landing"], "/dashboard");
    assert_eq!(body["user"]["role"], "user");
    assert!(
        !response.text().contains(fixtures::ANALYST_TOKEN),
        "Token must stay inside the host"
    );

    let session = ctx.store.load().expect("session stored");
    assert_eq!(session.token(), fixtures::ANALYST_TOKEN);
}

/// Admins land on the admin console
#[tokio::test]
async fn test_admin_login_landing() {
    let ctx = TestContext::new();

    let body: Value = ctx
        .server()
        .post("/login")
        .json(&json!({ "email": fixtures::ADMIN_EMAIL, "password": fixtures::PASSWORD }))
        .await
        .json();
    assert_eq!(body["landing"], "/admindashboard");
}

/// Rejected credentials surface the API's message and store nothing
#[tokio::test]
async fn test_wrong_password_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/login")
        .json(&json!({ "email": fixtures::ANALYST_EMAIL, "password": "nope" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid credentials");
    assert_eq!(body["code"], "AUTH_003");
    assert!(!ctx.is_signed_in());
}

/// Malformed credentials never reach the API
#[tokio::test]
async fn test_malformed_email_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .post("/login")
        .json(&json!({ "email": "not-an-email", "password": "pw" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

/// An unreachable API fails login with a gateway error
#[tokio::test]
async fn test_login_with_api_down() {
    let ctx = TestContext::new();
    ctx.source.set_should_fail(true);

    let response = ctx
        .server()
        .post("/login")
        .json(&json!({ "email": fixtures::ANALYST_EMAIL, "password": fixtures::PASSWORD }))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let body: Value = response.json();
    assert_eq!(body["code"], "FETCH_003");
}

/// Session endpoint reflects the stored session
#[tokio::test]
async fn test_session_endpoint() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body: Value = server.get("/session").await.json();
    assert_eq!(body["authenticated"], false);
    assert!(body.get("user").is_none());

    ctx.sign_in_admin();
    let body: Value = server.get("/session").await.json();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["role"], "admin");
}

/// Logout clears the session and is idempotent
#[tokio::test]
async fn test_logout() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    let server = ctx.server();

    let response = server.post("/logout").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["redirect"], "/");
    assert!(!ctx.is_signed_in());
    assert!(ctx.storage.is_empty());

    server.post("/logout").await.assert_status_ok();
}

/// A half-written or corrupt stored session is treated as signed out and wiped
#[tokio::test]
async fn test_corrupt_session_self_heals() {
    let ctx = TestContext::new();
    ctx.storage.insert_raw(TOKEN_KEY, "tok");
    ctx.storage.insert_raw(USER_KEY, "{not json");
    let server = ctx.server();

    let body: Value = server.get("/session").await.json();
    assert_eq!(body["authenticated"], false);
    assert!(ctx.storage.is_empty());

    ctx.storage.insert_raw(TOKEN_KEY, "tok");
    server
        .get("/views/dashboard")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert!(ctx.storage.is_empty());
}

/// A stored role the host does not know counts as corruption
#[tokio::test]
async fn test_unknown_role_is_signed_out() {
    let ctx = TestContext::new();
    ctx.storage.insert_raw(TOKEN_KEY, "tok");
    ctx.storage
        .insert_raw(USER_KEY, r#"{"id": 3, "role": "superuser"}"#);

    let body: Value = ctx.server().get("/session").await.json();
    assert_eq!(body["authenticated"], false);
    assert!(ctx.storage.is_empty());
}

/// Login through the host, then render a protected view with the new token
#[tokio::test]
async fn test_login_then_view() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .post("/login")
        .json(&json!({ "email": fixtures::ANALYST_EMAIL, "password": fixtures::PASSWORD }))
        .await
        .assert_status_ok();

    server.get("/views/siem").await.assert_status_ok();
    assert!(ctx
        .source
        .tokens_seen()
        .iter()
        .all(|t| t.as_deref() == Some(fixtures::ANALYST_TOKEN)));
}

/// A session persisted to disk is picked up by a fresh store
#[tokio::test]
async fn test_file_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let first = SessionStore::new(Arc::new(FileStorage::new(&path)));
    first
        .save(fixtures::ADMIN_TOKEN, &fixtures::admin_profile())
        .unwrap();

    let storage = Arc::new(FileStorage::new(&path));
    assert!(storage.get(TOKEN_KEY).unwrap().is_some());
    let second = SessionStore::new(storage);
    let session = second.load().expect("session restored");
    assert_eq!(session.token(), fixtures::ADMIN_TOKEN);
    assert_eq!(session.user(), &fixtures::admin_profile());
}
