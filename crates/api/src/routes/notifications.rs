//! Notifications feed and actions.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use dashboard_core::{ViewKind, ViewParams};
use fetcher::Action;
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{debug, info, warn};
use worker::{LoadOutcome, Poller, ViewMount};

use crate::extractors::{Authenticated, ViewQuery};
use crate::response::{ApiError, ErrorResponse, ViewResponse};
use crate::routes::views::{admit, render};
use crate::state::AppState;

/// Dashboard path whose access rules the feed follows.
const FEED_PATH: &str = "/notification";

/// GET /notifications/stream - Server-sent notification view updates.
///
/// Events: `notifications` (a bound view), `error` (failed refresh, the feed
/// keeps polling) and `redirect` (session gone or rejected, the feed ends).
/// Every refresh re-checks the stored session, so logout ends the feed. The
/// feed stops polling when the client disconnects.
pub async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let (_, path_params, _) = admit(&state, FEED_PATH)?;
    let params = query.into_params(state.config.default_page_size, path_params);

    let (tx, rx) = mpsc::channel::<Event>(8);
    let mount = Arc::new(ViewMount::new(ViewKind::Notifications));
    let guard = mount.token().drop_guard();

    let feed = Arc::clone(&mount);
    Poller::every(state.config.poll_interval)
        .named("notifications")
        .spawn(mount.token(), move |tick| {
            let mount = Arc::clone(&feed);
            let state = state.clone();
            let params = params.clone();
            let tx = tx.clone();
            async move {
                let session = match admit(&state, FEED_PATH) {
                    Ok((_, _, session)) => session,
                    Err(denied) => {
                        info!(code = denied.code(), "Session ended, closing notification feed");
                        let name = if denied.is_redirect() { "redirect" } else { "error" };
                        let _ = tx.send(json_event(name, &denied.body)).await;
                        mount.unmount();
                        return;
                    }
                };

                let outcome = mount.load(state.source.as_ref(), session.as_ref()).await;
                let event = match outcome {
                    LoadOutcome::Loaded(_) => match mount.bind(&params) {
                        Some(model) => json_event("notifications", &model),
                        None => return,
                    },
                    LoadOutcome::Failed(e) if e.is_auth() => {
                        warn!(code = e.code(), "Notification feed rejected by API");
                        if let Some(session) = &session {
                            state.gate.force_reauthentication(session.token());
                        }
                        let _ = tx.send(redirect_event()).await;
                        mount.unmount();
                        return;
                    }
                    LoadOutcome::Failed(e) => {
                        let body = ErrorResponse::new(e.to_string(), e.code())
                            .retryable(e.is_retryable());
                        json_event("error", &body)
                    }
                    LoadOutcome::Discarded => return,
                };

                debug!(tick, "Notification feed refreshed");
                if tx.send(event).await.is_err() {
                    mount.unmount();
                }
            }
        });
    info!("Notification stream opened");

    let stream = ReceiverStream::new(rx).map(move |event| {
        // Dropping the stream drops the guard, which unmounts the feed
        let _mounted = &guard;
        Ok::<_, Infallible>(event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// POST /notifications/mark-all-read - Marks every notification read, then
/// returns the refreshed notifications view.
pub async fn mark_all_read_handler(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<ViewResponse>, ApiError> {
    state
        .source
        .post_action(Action::MarkAllNotificationsRead, Some(&session))
        .await
        .map_err(|e| state.fetch_failed(e, Some(&session)))?;
    info!(user_id = %session.user().id, "Marked all notifications read");

    let params = ViewParams {
        page_size: state.config.default_page_size,
        ..Default::default()
    };
    let view = ViewKind::Notifications;
    let model = render(&state, view, Some(&session), &params).await?;
    Ok(Json(ViewResponse::new(view, FEED_PATH, model)))
}

fn json_event<T: Serialize>(name: &'static str, data: &T) -> Event {
    Event::default().event(name).json_data(data).unwrap_or_else(|e| {
        warn!(error = %e, event = name, "Failed to encode stream event");
        Event::default().event("error").data(e.to_string())
    })
}

fn redirect_event() -> Event {
    json_event("redirect", &ApiError::token_rejected().body)
}
