//! End-to-end tests for view rendering.
//!
//! GET /views/<path> → AccessGate → ViewMount → MockSource → bound view-model.

use axum::http::StatusCode;
use dashboard_core::{Resource, ViewKind};
use fetcher::FetchError;
use integration_tests::{fixtures, mocks::MockSource, setup::TestContext};
use serde_json::{json, Value};

fn stat(body: &Value, label: &str) -> Value {
    body["model"]["stats"]
        .as_array()
        .and_then(|stats| stats.iter().find(|s| s["label"] == label))
        .map(|s| s["value"].clone())
        .unwrap_or(Value::Null)
}

fn table<'a>(body: &'a Value, id: &str) -> &'a Value {
    body["model"]["tables"]
        .as_array()
        .and_then(|tables| tables.iter().find(|t| t["id"] == id))
        .expect("table present")
}

/// Protected view without a session redirects and never calls the API
#[tokio::test]
async fn test_unauthenticated_view_redirects() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/views/dashboard").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["redirect"], "/");
    assert_eq!(body["code"], "AUTH_001");
    assert_eq!(body["state"], "unauthenticated");
    assert_eq!(ctx.source.fetch_count(), 0);
}

/// Analyst overview fetches every overview resource with the bearer token
#[tokio::test]
async fn test_analyst_overview() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    let server = ctx.server();

    let response = server.get("/views/dashboard").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["view"], "overview");
    assert_eq!(body["path"], "/dashboard");
    assert_eq!(stat(&body, "Total Alerts"), json!(12));
    assert_eq!(stat(&body, "Incidents"), json!(4));

    assert_eq!(ctx.source.fetch_count(), 18);
    assert!(ctx
        .source
        .tokens_seen()
        .iter()
        .all(|t| t.as_deref() == Some(fixtures::ANALYST_TOKEN)));
}

/// The overview map only carries markers with usable coordinates
#[tokio::test]
async fn test_overview_map_skips_bad_coordinates() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();

    let body: Value = ctx.server().get("/views/dashboard").await.json();
    let markers = body["model"]["maps"][0]["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 4);
}

/// Analyst hitting an admin route is denied and signed out
#[tokio::test]
async fn test_role_denial_clears_session() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    let server = ctx.server();

    let response = server.get("/views/admindashboard").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["code"], "AUTH_002");
    assert_eq!(body["state"], "authenticated_unauthorized");
    assert!(!ctx.is_signed_in());
    assert_eq!(ctx.source.fetch_count(), 0);
}

/// Admin directory paginates and clamps out-of-range pages
#[tokio::test]
async fn test_admin_directory_pagination() {
    let ctx = TestContext::new();
    ctx.sign_in_admin();
    let server = ctx.server();

    let body: Value = server
        .get("/views/admindashboard")
        .add_query_param("page", 2)
        .await
        .json();
    assert_eq!(body["view"], "user_directory");
    let users = table(&body, "users");
    assert_eq!(users["rows"].as_array().unwrap().len(), 5);
    assert_eq!(users["page"]["total_pages"], 2);

    let body: Value = server
        .get("/views/admindashboard")
        .add_query_param("page", 99)
        .await
        .json();
    assert_eq!(table(&body, "users")["page"]["current_page"], 2);
}

/// Search and sort reach the directory table
#[tokio::test]
async fn test_admin_directory_search() {
    let ctx = TestContext::new();
    ctx.sign_in_admin();

    let body: Value = ctx
        .server()
        .get("/views/admindashboard")
        .add_query_param("search", "user1")
        .add_query_param("sort", "name")
        .add_query_param("order", "desc")
        .await
        .json();

    let rows = table(&body, "users")["rows"].as_array().unwrap().clone();
    // user1, user10..user15
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["name"], "User 15");
}

/// Per-user overview narrows activity to the path's user
#[tokio::test]
async fn test_user_overview_path_param() {
    let ctx = TestContext::new();
    ctx.sign_in_admin();

    let response = ctx.server().get("/views/dashboard/user/7").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["view"], "user_overview");
    assert_eq!(stat(&body, "User"), json!("7"));
    assert_eq!(stat(&body, "User Activity"), json!(2));
}

/// The account view fetches the signed-in user's own record
#[tokio::test]
async fn test_account_view_reads_own_user() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();

    let response = ctx.server().get("/views/account").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["view"], "account");
    assert_eq!(stat(&body, "Found"), json!(true));
    assert_eq!(stat(&body, "Email"), json!("user7@soc.io"));
    assert_eq!(stat(&body, "Name"), json!("User 07"));
    assert_eq!(ctx.source.fetched(), vec![Resource::Account]);
}

/// The admin account route is admin-only and an unknown user id fails the view
#[tokio::test]
async fn test_admin_account_route() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    let response = ctx.server().get("/views/adminaccount").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "AUTH_002");

    let ctx = TestContext::with_source(MockSource::new(), Default::default());
    ctx.sign_in_admin();
    let response = ctx.server().get("/views/adminaccount").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["code"], "FETCH_002");
    assert!(ctx.is_signed_in());
}

/// USB log pages hold ten rows
#[tokio::test]
async fn test_usb_log_last_page() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();

    let body: Value = ctx
        .server()
        .get("/views/usb1")
        .add_query_param("page", 3)
        .await
        .json();

    let logs = table(&body, "usb_logs");
    assert_eq!(logs["rows"].as_array().unwrap().len(), 5);
    assert_eq!(logs["page"]["total_items"], 25);
}

/// Unknown paths are 404 and leave the session alone
#[tokio::test]
async fn test_unknown_path_not_found() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();

    let response = ctx.server().get("/views/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["code"], "ROUTE_001");
    assert!(ctx.is_signed_in());
}

/// Sub-paths fall back to the nearest ancestor route
#[tokio::test]
async fn test_ancestor_route() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();

    let body: Value = ctx.server().get("/views/siem/alerts").await.json();
    assert_eq!(body["view"], "siem");
}

/// The public entry view needs no session and fetches nothing
#[tokio::test]
async fn test_login_view_is_public() {
    let ctx = TestContext::new();

    let response = ctx.server().get("/views").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["view"], "login");
    assert_eq!(ctx.source.fetch_count(), 0);
}

/// One failing resource fails the whole view with a retryable error
#[tokio::test]
async fn test_partial_failure_fails_view() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    ctx.source.fail_resource(
        Resource::Incidents,
        FetchError::Status {
            resource: "incident".into(),
            status: 500,
        },
    );

    let response = ctx.server().get("/views/siem").await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let body: Value = response.json();
    assert_eq!(body["code"], "FETCH_002");
    assert_eq!(body["retryable"], true);
    assert!(body.get("model").is_none());
    assert!(ctx.is_signed_in());
}

/// Manual retry after a failure re-fetches and succeeds
#[tokio::test]
async fn test_retry_after_failure() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    ctx.source.set_should_fail(true);
    let server = ctx.server();

    server
        .get("/views/siem")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);

    ctx.source.set_should_fail(false);
    let body: Value = server.get("/views/siem").await.json();
    assert_eq!(body["view"], "siem");
    assert_eq!(stat(&body, "Total Alerts"), json!(12));
}

/// A token the API rejects forces re-authentication
#[tokio::test]
async fn test_rejected_token_signs_out() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    ctx.source.set_reject_tokens(true);

    let response = ctx.server().get("/views/reports").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["redirect"], "/");
    assert_eq!(body["code"], "AUTH_004");
    assert!(!ctx.is_signed_in());
}

/// Views render with zero records instead of failing
#[tokio::test]
async fn test_empty_api_renders_every_view() {
    let ctx = TestContext::with_source(MockSource::new(), Default::default());
    ctx.sign_in_admin();
    let server = ctx.server();

    for path in [
        "/views/dashboard",
        "/views/adminsiem",
        "/views/adminanalytics",
        "/views/adminreports",
        "/views/admincustomers",
        "/views/adminverified-customers",
        "/views/adminnew-customer",
        "/views/adminnew-product",
        "/views/admininventory",
        "/views/adminnotification",
        "/views/adminpcperformance",
        "/views/usb",
        "/views/admindashboard",
    ] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["model"]["title"].is_string(), "{} has no title", path);
    }
}

/// The response view kind deserializes back into the core enum
#[tokio::test]
async fn test_view_kind_round_trips() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();

    let body: Value = ctx.server().get("/views/pcperformance").await.json();
    let kind: ViewKind = serde_json::from_value(body["view"].clone()).unwrap();
    assert_eq!(kind, ViewKind::PcPerformance);
}
