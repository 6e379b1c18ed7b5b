//! Common test setup functions.

use api::{router, AppState, HostConfig};
use axum::Router;
use axum_test::TestServer;
use dashboard_core::{MemoryStorage, Session, SessionStore, UserProfile};
use fetcher::ResourceSource;
use std::sync::Arc;
use telemetry::health;

use crate::fixtures;
use crate::mocks::MockSource;

/// Test context around the real router.
///
/// - The production Axum router with all layers
/// - `MockSource` in place of the HTTP client, implementing the same trait
/// - In-memory session storage shared with the router
pub struct TestContext {
    pub source: MockSource,
    pub storage: Arc<MemoryStorage>,
    pub store: SessionStore,
    pub router: Router,
}

impl TestContext {
    /// Context over a populated mock API with default host settings.
    pub fn new() -> Self {
        Self::with_source(fixtures::populated_source(), HostConfig::default())
    }

    pub fn with_config(config: HostConfig) -> Self {
        Self::with_source(fixtures::populated_source(), config)
    }

    pub fn with_source(source: MockSource, config: HostConfig) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        health().session_storage.set_healthy();

        let state = AppState::with_config(
            store.clone(),
            Arc::new(source.clone()) as Arc<dyn ResourceSource>,
            config,
        );

        Self {
            source,
            storage,
            store,
            router: router(state),
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Stores a session directly, bypassing the login endpoint.
    pub fn sign_in(&self, token: &str, profile: UserProfile) -> Session {
        self.store
            .save(token, &profile)
            .expect("Failed to store session")
    }

    pub fn sign_in_analyst(&self) -> Session {
        self.sign_in(fixtures::ANALYST_TOKEN, fixtures::analyst_profile())
    }

    pub fn sign_in_admin(&self) -> Session {
        self.sign_in(fixtures::ADMIN_TOKEN, fixtures::admin_profile())
    }

    pub fn is_signed_in(&self) -> bool {
        self.store.is_authenticated()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
