//! View mount lifecycle.
//!
//! A [`ViewMount`] is one live instance of a view. It fetches the view's
//! resources, keeps them for rebinding, and stops accepting results once it
//! is unmounted.

use std::sync::Arc;

use dashboard_core::views::{build, resources_for};
use dashboard_core::{ResourceSet, Session, ViewKind, ViewModel, ViewParams};
use fetcher::{fetch_batch, FetchError, ResourceSource};
use parking_lot::RwLock;
use telemetry::metrics;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Data state of a mounted view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Ready(Arc<ResourceSet>),
    Failed {
        message: String,
        code: &'static str,
        retryable: bool,
    },
    /// The API rejected the session. The caller owns the redirect.
    Unauthorized,
}

impl ViewState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Result of one [`ViewMount::load`].
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Arc<ResourceSet>),
    Failed(FetchError),
    /// The view was unmounted before the batch finished.
    Discarded,
}

/// A live view instance.
///
/// Dropping the mount unmounts it.
#[derive(Debug)]
pub struct ViewMount {
    view: ViewKind,
    token: CancellationToken,
    state: RwLock<ViewState>,
}

impl ViewMount {
    pub fn new(view: ViewKind) -> Self {
        metrics().active_mounts.inc();
        debug!(view = ?view, "View mounted");
        Self {
            view,
            token: CancellationToken::new(),
            state: RwLock::new(ViewState::Loading),
        }
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ViewState {
        self.state.read().clone()
    }

    /// Token cancelled on unmount. Tasks bound to this view select on it.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Unmounts the view. Idempotent.
    pub fn unmount(&self) {
        // Taken so a commit in progress finishes before the token flips
        let _state = self.state.write();
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();
        metrics().active_mounts.dec();
        debug!(view = ?self.view, "View unmounted");
    }

    /// Fetches every resource the view needs as one batch.
    ///
    /// Also used for manual retry and for poll refreshes: the state goes back
    /// to `Loading` until the new batch settles.
    pub async fn load(
        &self,
        source: &dyn ResourceSource,
        session: Option<&Session>,
    ) -> LoadOutcome {
        if !self.set_loading() {
            return self.discard();
        }

        let resources = resources_for(self.view);
        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            result = fetch_batch(source, resources, session) => Some(result),
        };

        match result {
            None => self.discard(),
            Some(result) => self.commit(result),
        }
    }

    /// Binds the fetched records with new parameters, without refetching.
    ///
    /// Returns `None` unless the view is `Ready`.
    pub fn bind(&self, params: &ViewParams) -> Option<ViewModel> {
        let data = match &*self.state.read() {
            ViewState::Ready(data) => Arc::clone(data),
            _ => return None,
        };
        metrics().views_rendered.inc();
        Some(build(self.view, &data, params))
    }

    fn set_loading(&self) -> bool {
        let mut state = self.state.write();
        if self.token.is_cancelled() {
            return false;
        }
        *state = ViewState::Loading;
        true
    }

    fn commit(&self, result: Result<ResourceSet, FetchError>) -> LoadOutcome {
        let mut state = self.state.write();
        if self.token.is_cancelled() {
            drop(state);
            return self.discard();
        }

        match result {
            Ok(set) => {
                let data = Arc::new(set);
                *state = ViewState::Ready(Arc::clone(&data));
                LoadOutcome::Loaded(data)
            }
            Err(e) => {
                *state = if e.is_auth() {
                    ViewState::Unauthorized
                } else {
                    ViewState::Failed {
                        message: e.to_string(),
                        code: e.code(),
                        retryable: e.is_retryable(),
                    }
                };
                warn!(view = ?self.view, code = e.code(), "View load failed");
                LoadOutcome::Failed(e)
            }
        }
    }

    fn discard(&self) -> LoadOutcome {
        metrics().stale_results_discarded.inc();
        debug!(view = ?self.view, "Discarded result for unmounted view");
        LoadOutcome::Discarded
    }
}

impl Drop for ViewMount {
    fn drop(&mut self) {
        self.unmount();
    }
}
