//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use dashboard_core::{AccessGate, RouteTable, Session, SessionStore, DEFAULT_PAGE_SIZE};
use fetcher::{FetchError, ResourceSource};
use tracing::warn;
use worker::DEFAULT_POLL_INTERVAL;

use crate::response::ApiError;

/// Host behaviour knobs.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Table page size when a request does not name one.
    pub default_page_size: usize,
    /// Refresh period of the notifications stream.
    pub poll_interval: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Route guard; owns the session store
    pub gate: AccessGate,
    /// Remote API (HTTP client in production, mock in tests)
    pub source: Arc<dyn ResourceSource>,
    pub config: HostConfig,
}

impl AppState {
    /// State over the standard dashboard route table.
    pub fn new(store: SessionStore, source: Arc<dyn ResourceSource>) -> Self {
        Self::with_config(store, source, HostConfig::default())
    }

    pub fn with_config(
        store: SessionStore,
        source: Arc<dyn ResourceSource>,
        config: HostConfig,
    ) -> Self {
        Self {
            gate: AccessGate::new(Arc::new(RouteTable::standard()), store),
            source,
            config,
        }
    }

    pub fn store(&self) -> &SessionStore {
        self.gate.store()
    }

    /// Converts a failed API call into a response.
    ///
    /// A rejected token clears the session it came from through the gate
    /// and becomes a redirect; everything else is reported as is.
    pub fn fetch_failed(&self, error: FetchError, session: Option<&Session>) -> ApiError {
        if error.is_auth() {
            warn!(resource = ?error.resource(), "API rejected session token");
            if let Some(session) = session {
                self.gate.force_reauthentication(session.token());
            }
            return ApiError::token_rejected();
        }
        ApiError::from(error)
    }
}
