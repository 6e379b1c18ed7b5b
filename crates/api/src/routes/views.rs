//! View rendering.
//!
//! `GET /views/<dashboard path>` runs one full view cycle: gate check, mount,
//! batch fetch, bind, unmount.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use dashboard_core::{GateDecision, Session, ViewKind, ViewModel, ViewParams, LOGIN_PATH};
use telemetry::metrics;
use tracing::{debug, info};
use worker::{LoadOutcome, ViewMount};

use crate::extractors::ViewQuery;
use crate::response::{ApiError, ViewResponse};
use crate::state::AppState;

/// GET /views - The public entry view.
pub async fn entry_view_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ViewResponse>, ApiError> {
    render_path(&state, LOGIN_PATH.to_string(), query).await
}

/// GET /views/*path - Any dashboard view.
pub async fn view_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ViewResponse>, ApiError> {
    let path = format!("/{}", path.trim_start_matches('/'));
    render_path(&state, path, query).await
}

async fn render_path(
    state: &AppState,
    path: String,
    query: ViewQuery,
) -> Result<Json<ViewResponse>, ApiError> {
    let (view, path_params, session) = admit(state, &path)?;
    let params = query.into_params(state.config.default_page_size, path_params);
    let model = render(state, view, session.as_ref(), &params).await?;

    info!(path = %path, view = ?view, "View rendered");
    Ok(Json(ViewResponse::new(view, path, model)))
}

/// Runs the gate for a path.
pub(crate) fn admit(
    state: &AppState,
    path: &str,
) -> Result<(ViewKind, HashMap<String, String>, Option<Session>), ApiError> {
    match state.gate.check(path)? {
        GateDecision::Render {
            view,
            params,
            session,
        } => Ok((view, params, session)),
        GateDecision::RedirectToLogin { state: access } => {
            metrics().gate_denials.inc();
            Err(ApiError::redirect(access))
        }
    }
}

/// Mounts a view, fetches its resources and binds it once.
pub(crate) async fn render(
    state: &AppState,
    view: ViewKind,
    session: Option<&Session>,
    params: &ViewParams,
) -> Result<ViewModel, ApiError> {
    let mount = ViewMount::new(view);

    match mount.load(state.source.as_ref(), session).await {
        LoadOutcome::Loaded(data) => {
            debug!(view = ?view, resources = data.len(), "View data loaded");
        }
        LoadOutcome::Failed(e) => return Err(state.fetch_failed(e, session)),
        LoadOutcome::Discarded => return Err(ApiError::unavailable("view was unmounted")),
    }

    mount
        .bind(params)
        .ok_or_else(|| ApiError::internal("view data missing after load"))
}
