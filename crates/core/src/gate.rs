//! Access gate.
//!
//! Decides per request whether a view renders or the visitor goes back to
//! the login entry point. Denial is fail-closed: whatever session was
//! present is wiped before redirecting.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{Error, Result, RouteErrorCode};
use crate::routes::{RouteTable, ViewKind, LOGIN_PATH};
use crate::session::{Session, SessionStore};

/// Access state of a request. Computed per decision, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    Unauthenticated,
    AuthenticatedUnauthorized,
    AuthenticatedAuthorized,
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the view. `session` is `None` only on public routes.
    Render {
        view: ViewKind,
        params: HashMap<String, String>,
        session: Option<Session>,
    },
    /// Redirect to [`LOGIN_PATH`]. The session has already been cleared.
    RedirectToLogin { state: AccessState },
}

impl GateDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render { .. })
    }

    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Self::RedirectToLogin { .. } => Some(LOGIN_PATH),
            Self::Render { .. } => None,
        }
    }
}

/// Route guard over a [`RouteTable`] and a [`SessionStore`].
#[derive(Clone)]
pub struct AccessGate {
    routes: Arc<RouteTable>,
    store: SessionStore,
}

impl AccessGate {
    pub fn new(routes: Arc<RouteTable>, store: SessionStore) -> Self {
        Self { routes, store }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Checks a request path against the route table and the current
    /// session.
    ///
    /// Returns an error only when no route matches.
    pub fn check(&self, path: &str) -> Result<GateDecision> {
        let found = self.routes.resolve(path).ok_or_else(|| {
            Error::route(RouteErrorCode::NotFound, format!("no route for {}", path))
        })?;

        if found.route.is_public() {
            return Ok(GateDecision::Render {
                view: found.route.view(),
                params: found.params,
                session: self.store.load(),
            });
        }

        let session = self.store.load();
        let state = match &session {
            None => AccessState::Unauthenticated,
            Some(s) if !found.route.allows(s.role()) => AccessState::AuthenticatedUnauthorized,
            Some(_) => AccessState::AuthenticatedAuthorized,
        };

        if state != AccessState::AuthenticatedAuthorized {
            info!(
                path = path,
                route = found.route.pattern(),
                state = ?state,
                "Access denied, redirecting to login"
            );
            self.clear_session();
            return Ok(GateDecision::RedirectToLogin { state });
        }

        Ok(GateDecision::Render {
            view: found.route.view(),
            params: found.params,
            session,
        })
    }

    /// Forces re-authentication after the API rejected `rejected_token`.
    ///
    /// The stored session is cleared only while it still holds that token;
    /// a session saved by a later login stays.
    pub fn force_reauthentication(&self, rejected_token: &str) -> GateDecision {
        match self.store.clear_if_token(rejected_token) {
            Ok(true) => info!("Session token rejected by API, forcing re-authentication"),
            Ok(false) => debug!("Rejected token no longer stored, keeping current session"),
            Err(e) => error!(error = %e, "Failed to clear session on token rejection"),
        }
        GateDecision::RedirectToLogin {
            state: AccessState::Unauthenticated,
        }
    }

    fn clear_session(&self) {
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear session on denial");
        }
    }
}
