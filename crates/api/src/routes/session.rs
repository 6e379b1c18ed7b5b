//! Login, logout and session endpoints.

use axum::{extract::State, Json};
use dashboard_core::{LoginRequest, LOGIN_PATH};
use fetcher::FetchError;
use telemetry::{health, metrics};
use tracing::{error, info, warn};

use crate::response::{ApiError, LogoutResponse, SessionResponse};
use crate::state::AppState;

/// POST /login - Exchanges credentials with the API and stores the session.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    request.check()?;

    let login = match state.source.login(&request).await {
        Ok(login) => login,
        Err(e) => {
            metrics().login_failures.inc();
            if let FetchError::LoginRejected { status, .. } = &e {
                warn!(status = *status, "Login rejected");
            }
            return Err(ApiError::from(e));
        }
    };

    let session = state.store().save(&login.token, &login.user).map_err(|e| {
        error!(error = %e, "Failed to persist session");
        health().session_storage.set_unhealthy(e.to_string());
        ApiError::from(e)
    })?;
    health().session_storage.set_healthy();
    metrics().logins.inc();

    info!(
        user_id = %session.user().id,
        role = %session.role(),
        "User logged in"
    );
    Ok(Json(SessionResponse::for_user(session.user().clone())))
}

/// POST /logout - Clears the stored session. Succeeds without a session.
pub async fn logout_handler(
    State(state): State<AppState>,
) -> Result<Json<LogoutResponse>, ApiError> {
    state.store().clear().map_err(|e| {
        error!(error = %e, "Failed to clear session");
        health().session_storage.set_unhealthy(e.to_string());
        ApiError::from(e)
    })?;
    info!("User logged out");

    Ok(Json(LogoutResponse {
        redirect: LOGIN_PATH.to_string(),
    }))
}

/// GET /session - Who is logged in, if anyone.
pub async fn session_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    match state.store().load() {
        Some(session) => Json(SessionResponse::for_user(session.user().clone())),
        None => Json(SessionResponse::anonymous()),
    }
}
