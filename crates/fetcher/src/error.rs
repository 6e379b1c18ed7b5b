//! Fetch error kinds.

use thiserror::Error;

/// Result type for remote API calls.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Why a remote API call failed.
///
/// `Unauthorized` is kept apart from the other kinds: it is the only one that
/// ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{resource}: session rejected by API (HTTP {status})")]
    Unauthorized { resource: String, status: u16 },

    #[error("{resource}: API returned HTTP {status}")]
    Status { resource: String, status: u16 },

    #[error("{resource}: network error: {message}")]
    Network { resource: String, message: String },

    #[error("{resource}: request timed out")]
    Timeout { resource: String },

    #[error("{resource}: unexpected response body: {message}")]
    Decode { resource: String, message: String },

    #[error("login rejected: {message}")]
    LoginRejected { status: u16, message: String },

    #[error("invalid API base address: {0}")]
    InvalidBase(String),

    #[error("failed to build HTTP client: {0}")]
    Setup(String),
}

impl FetchError {
    /// True for 401/403 responses.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Stable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "FETCH_001",
            Self::Status { .. } => "FETCH_002",
            Self::Network { .. } => "FETCH_003",
            Self::Timeout { .. } => "FETCH_004",
            Self::Decode { .. } => "FETCH_005",
            Self::LoginRejected { .. } => "FETCH_006",
            Self::InvalidBase(_) => "FETCH_007",
            Self::Setup(_) => "FETCH_008",
        }
    }

    /// Whether a manual retry may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Unauthorized { .. }
                | Self::LoginRejected { .. }
                | Self::InvalidBase(_)
                | Self::Setup(_)
        )
    }

    /// The resource the failed call targeted, if any.
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { resource, .. }
            | Self::Status { resource, .. }
            | Self::Network { resource, .. }
            | Self::Timeout { resource }
            | Self::Decode { resource, .. } => Some(resource),
            Self::LoginRejected { .. } | Self::InvalidBase(_) | Self::Setup(_) => None,
        }
    }
}
