//! Source abstraction over the remote API.

use async_trait::async_trait;
use dashboard_core::{LoginRequest, LoginResponse, Record, Resource, Session};

use crate::error::FetchResult;

/// Write actions the dashboard issues against the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MarkAllNotificationsRead,
}

impl Action {
    /// Path relative to the API base address.
    pub fn path(&self) -> &'static str {
        match self {
            Self::MarkAllNotificationsRead => "notifications/mark_all_read",
        }
    }
}

/// Anything that can serve API resources.
///
/// Implemented by [`crate::ApiClient`] in production and by in-memory mocks
/// in tests.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Fetches all records of a resource. A present session is sent as a
    /// bearer token.
    async fn fetch(&self, resource: Resource, session: Option<&Session>)
        -> FetchResult<Vec<Record>>;

    /// Exchanges credentials for a token and user profile.
    async fn login(&self, request: &LoginRequest) -> FetchResult<LoginResponse>;

    /// Performs a write action.
    async fn post_action(&self, action: Action, session: Option<&Session>) -> FetchResult<()>;

    /// Whether the last contact with the API succeeded.
    fn is_healthy(&self) -> bool {
        true
    }
}
