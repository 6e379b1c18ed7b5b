//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dashboard_core::error::AuthErrorCode;
use dashboard_core::{AccessState, UserProfile, ViewKind, ViewModel, LOGIN_PATH};
use fetcher::FetchError;
use serde::{Deserialize, Serialize};

/// A bound view, ready for the widgets.
#[derive(Debug, Serialize, Deserialize)]
pub struct ViewResponse {
    pub view: ViewKind,
    pub path: String,
    pub model: ViewModel,
    pub timestamp: i64,
}

impl ViewResponse {
    pub fn new(view: ViewKind, path: impl Into<String>, model: ViewModel) -> Self {
        Self {
            view,
            path: path.into(),
            model,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Current session as seen by the widgets. The token never leaves the host.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    /// Where the user lands after login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing: Option<String>,
}

impl SessionResponse {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            user: None,
            landing: None,
        }
    }

    pub fn for_user(user: UserProfile) -> Self {
        let landing = Some(user.role.landing_path().to_string());
        Self {
            authenticated: true,
            user: Some(user),
            landing,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub redirect: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub remote_api_connected: bool,
    pub session_storage_ok: bool,
    pub active_mounts: u64,
    pub fetch_failures: u64,
}

/// Redirect instruction for the widgets.
#[derive(Debug, Serialize, Deserialize)]
pub struct RedirectResponse {
    pub redirect: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AccessState>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            retryable: None,
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Error(ErrorResponse),
    Redirect(RedirectResponse),
}

/// API error type with stable error codes.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::Error(ErrorResponse::new(msg, code)),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_001", msg)
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::SERVICE_UNAVAILABLE, "INTERNAL_002", msg)
    }

    /// 401 telling the widgets to go back to the login entry point.
    pub fn redirect(state: AccessState) -> Self {
        let code = match state {
            AccessState::AuthenticatedUnauthorized => AuthErrorCode::RoleNotAllowed,
            _ => AuthErrorCode::MissingSession,
        };
        Self::redirect_with(code, Some(state))
    }

    /// Redirect after the API rejected the session token.
    pub fn token_rejected() -> Self {
        Self::redirect_with(AuthErrorCode::TokenRejected, None)
    }

    fn redirect_with(code: AuthErrorCode, state: Option<AccessState>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorBody::Redirect(RedirectResponse {
                redirect: LOGIN_PATH.to_string(),
                code: code.code().to_string(),
                state,
            }),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.body, ErrorBody::Redirect(_))
    }

    pub fn code(&self) -> &str {
        match &self.body {
            ErrorBody::Error(e) => &e.code,
            ErrorBody::Redirect(r) => &r.code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<dashboard_core::Error> for ApiError {
    fn from(err: dashboard_core::Error) -> Self {
        use dashboard_core::Error;

        match &err {
            Error::Auth {
                code,
                message,
                http_status,
            }
            | Error::Session {
                code,
                message,
                http_status,
            }
            | Error::Route {
                code,
                message,
                http_status,
            } => {
                let status =
                    StatusCode::from_u16(*http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                ApiError::with_code(status, *code, message)
            }
            Error::Validation(msg) => ApiError::bad_request(msg),
            Error::Serialization(e) => ApiError::bad_request(e.to_string()),
            _ => ApiError::internal(err.to_string()),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let status = match &err {
            FetchError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            FetchError::LoginRejected { .. } => StatusCode::UNAUTHORIZED,
            FetchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            FetchError::InvalidBase(_) | FetchError::Setup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FetchError::Status { .. } | FetchError::Network { .. } | FetchError::Decode { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };

        let body = match &err {
            // Show the API's own wording on the login form
            FetchError::LoginRejected { message, .. } => {
                ErrorResponse::new(message.clone(), AuthErrorCode::LoginRejected.code())
            }
            _ => ErrorResponse::new(err.to_string(), err.code()).retryable(err.is_retryable()),
        };

        Self {
            status,
            body: ErrorBody::Error(body),
        }
    }
}
