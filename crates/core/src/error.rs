//! Unified error types for the dashboard core.
//!
//! Error codes:
//! - AUTH_001-004: Authentication and authorization errors
//! - SESSION_001-002: Session storage errors
//! - ROUTE_001-002: Route table errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// AUTH_001: No session is present
    MissingSession,
    /// AUTH_002: Session role is not allowed on this route
    RoleNotAllowed,
    /// AUTH_003: Credentials were rejected at login
    LoginRejected,
    /// AUTH_004: The API rejected the session token
    TokenRejected,
}

impl AuthErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSession => "AUTH_001",
            Self::RoleNotAllowed => "AUTH_002",
            Self::LoginRejected => "AUTH_003",
            Self::TokenRejected => "AUTH_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingSession => 401,
            Self::RoleNotAllowed => 403,
            Self::LoginRejected => 401,
            Self::TokenRejected => 401,
        }
    }
}

/// Session storage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorCode {
    /// SESSION_001: Persistent storage could not be read or written
    StorageFailed,
    /// SESSION_002: Persisted session payload is corrupt
    Corrupt,
}

impl SessionErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StorageFailed => "SESSION_001",
            Self::Corrupt => "SESSION_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        500
    }
}

/// Route table error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteErrorCode {
    /// ROUTE_001: No route matches the requested path
    NotFound,
    /// ROUTE_002: A protected route declares no allowed roles
    EmptyAllowList,
}

impl RouteErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "ROUTE_001",
            Self::EmptyAllowList => "ROUTE_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::EmptyAllowList => 500,
        }
    }
}

/// Unified error type for the dashboard core.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication error with code.
    #[error("[{code}] {message}")]
    Auth {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Session storage error with code.
    #[error("[{code}] {message}")]
    Session {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Route table error with code.
    #[error("[{code}] {message}")]
    Route {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an authentication error.
    pub fn auth(code: AuthErrorCode, msg: impl Into<String>) -> Self {
        Self::Auth {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a session storage error.
    pub fn session(code: SessionErrorCode, msg: impl Into<String>) -> Self {
        Self::Session {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a route table error.
    pub fn route(code: RouteErrorCode, msg: impl Into<String>) -> Self {
        Self::Route {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Auth { http_status, .. } => *http_status,
            Self::Session { http_status, .. } => *http_status,
            Self::Route { http_status, .. } => *http_status,
            Self::Validation(_) => 400,
            Self::Serialization(_) => 400,
            Self::Io(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Auth { code, .. } => Some(code),
            Self::Session { code, .. } => Some(code),
            Self::Route { code, .. } => Some(code),
            _ => None,
        }
    }
}
