//! Tests for the notifications feed and mark-all-read action.
//!
//! The stream tests run the router on a real socket so the SSE body can be
//! read incrementally.

use std::time::Duration;

use api::HostConfig;
use axum::http::StatusCode;
use fetcher::Action;
use integration_tests::setup::TestContext;
use serde_json::Value;

fn fast_feed() -> HostConfig {
    HostConfig {
        poll_interval: Duration::from_millis(50),
        ..Default::default()
    }
}

async fn serve(ctx: &TestContext) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = ctx.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Reads SSE chunks until `needle` shows up or two seconds pass.
async fn read_until(response: &mut reqwest::Response, needle: &str) -> String {
    let mut seen = String::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !seen.contains(needle) {
        let chunk = tokio::time::timeout_at(deadline, response.chunk())
            .await
            .expect("timed out waiting for stream event")
            .expect("stream read failed");
        match chunk {
            Some(bytes) => seen.push_str(&String::from_utf8_lossy(&bytes)),
            None => break,
        }
    }
    seen
}

/// Mark-all-read posts the action and returns the refreshed feed
#[tokio::test]
async fn test_mark_all_read_refreshes_feed() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    let server = ctx.server();

    let before: Value = server.get("/views/notification").await.json();
    let unread = |body: &Value| {
        body["model"]["stats"]
            .as_array()
            .and_then(|s| s.iter().find(|s| s["label"] == "Unread"))
            .map(|s| s["value"].clone())
    };
    assert_eq!(unread(&before), Some(Value::from(3)));

    let response = server.post("/notifications/mark-all-read").await;
    response.assert_status_ok();
    let after: Value = response.json();
    assert_eq!(after["view"], "notifications");
    assert_eq!(unread(&after), Some(Value::from(0)));
    assert_eq!(ctx.source.actions(), vec![Action::MarkAllNotificationsRead]);
}

/// Mark-all-read without a session redirects and sends nothing
#[tokio::test]
async fn test_mark_all_read_requires_session() {
    let ctx = TestContext::new();

    let response = ctx.server().post("/notifications/mark-all-read").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["redirect"], "/");
    assert!(ctx.source.actions().is_empty());
}

/// Rejected token on the action signs the user out
#[tokio::test]
async fn test_mark_all_read_rejected_token() {
    let ctx = TestContext::new();
    ctx.sign_in_analyst();
    ctx.source.set_reject_tokens(true);

    let response = ctx.server().post("/notifications/mark-all-read").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "AUTH_004");
    assert!(!ctx.is_signed_in());
}

/// Opening the stream without a session is refused up front
#[tokio::test]
async fn test_stream_requires_session() {
    let ctx = TestContext::new();

    let response = ctx.server().get("/notifications/stream").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// The stream pushes bound views and stops polling once the client leaves
#[tokio::test]
async fn test_stream_polls_until_disconnect() {
    let ctx = TestContext::with_config(fast_feed());
    ctx.sign_in_analyst();
    let base = serve(&ctx).await;

    let mut response = reqwest::get(format!("{}/notifications/stream", base))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let first = read_until(&mut response, "event: notifications").await;
    assert!(first.contains("Unread"));

    // A few more polls land while the client listens
    let _ = read_until(&mut response, "Notice 5").await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(ctx.source.fetch_count() >= 2);

    drop(response);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let settled = ctx.source.fetch_count();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ctx.source.fetch_count(), settled, "feed kept polling after disconnect");
}

/// A failed refresh is reported on the stream and polling continues
#[tokio::test]
async fn test_stream_reports_errors() {
    let ctx = TestContext::with_config(fast_feed());
    ctx.sign_in_analyst();
    ctx.source.set_should_fail(true);
    let base = serve(&ctx).await;

    let mut response = reqwest::get(format!("{}/notifications/stream", base))
        .await
        .unwrap();
    let seen = read_until(&mut response, "FETCH_003").await;
    assert!(seen.contains("event: error"));

    ctx.source.set_should_fail(false);
    let seen = read_until(&mut response, "event: notifications").await;
    assert!(seen.contains("Unread"));
}

/// A rejected token ends the stream with a redirect and signs out
#[tokio::test]
async fn test_stream_rejected_token_redirects() {
    let ctx = TestContext::with_config(fast_feed());
    ctx.sign_in_analyst();
    ctx.source.set_reject_tokens(true);
    let base = serve(&ctx).await;

    let mut response = reqwest::get(format!("{}/notifications/stream", base))
        .await
        .unwrap();
    let seen = read_until(&mut response, "AUTH_004").await;
    assert!(seen.contains("event: redirect"));
    assert!(!ctx.is_signed_in());
}

/// Logging out ends an open stream with a redirect and stops its polling
#[tokio::test]
async fn test_logout_ends_stream() {
    let ctx = TestContext::with_config(fast_feed());
    ctx.sign_in_analyst();
    let base = serve(&ctx).await;

    let mut response = reqwest::get(format!("{}/notifications/stream", base))
        .await
        .unwrap();
    let seen = read_until(&mut response, "event: notifications").await;
    assert!(seen.contains("Unread"));

    let logout = reqwest::Client::new()
        .post(format!("{}/logout", base))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status().as_u16(), 200);

    let seen = read_until(&mut response, "AUTH_001").await;
    assert!(seen.contains("event: redirect"));

    // The feed is over: no more API calls, and the body ends
    let settled = ctx.source.fetch_count();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ctx.source.fetch_count(), settled, "feed kept polling after logout");
    let rest = tokio::time::timeout(Duration::from_secs(2), response.chunk())
        .await
        .expect("stream did not end");
    assert!(matches!(rest, Ok(None)));
}
