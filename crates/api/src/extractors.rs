//! Request extractors.

use std::collections::HashMap;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use dashboard_core::{AccessState, Session, SortOrder, ViewParams};
use serde::Deserialize;
use telemetry::metrics;
use tracing::debug;

use crate::response::ApiError;
use crate::state::AppState;

/// Query string of a view request.
///
/// Every field is optional; missing ones fall back to the host defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

impl ViewQuery {
    /// Render parameters for one request. A zero page size is replaced by
    /// the default.
    pub fn into_params(
        self,
        default_page_size: usize,
        path_params: HashMap<String, String>,
    ) -> ViewParams {
        let page_size = self
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(default_page_size);

        ViewParams {
            page: self.page.unwrap_or(1),
            page_size,
            search: self.search,
            sort: self.sort,
            order: self.order.unwrap_or_default(),
            path_params,
        }
    }
}

/// The current session, required.
///
/// Rejects with a redirect to the login entry point when no valid session is
/// stored.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.store().load() {
            Some(session) => Ok(Authenticated(session)),
            None => {
                debug!(path = %parts.uri.path(), "No session for authenticated request");
                metrics().gate_denials.inc();
                Err(ApiError::redirect(AccessState::Unauthenticated))
            }
        }
    }
}
