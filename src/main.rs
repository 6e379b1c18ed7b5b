//! SOC Dashboard Host
//!
//! Local process behind the security dashboard widgets:
//! - Session persistence and route gating by role
//! - Concurrent, all-or-nothing fetching from the SOC REST API
//! - Aggregation of raw records into chart, table and map bindings
//! - Polled notifications feed bound to the view's lifetime

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState, HostConfig};
use dashboard_core::{FileStorage, SessionStorage, SessionStore, TOKEN_KEY};
use fetcher::{ApiClient, ClientConfig};
use telemetry::{health, init_tracing_from_env, metrics};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Base address of the SOC REST API
    #[serde(default = "default_api_base")]
    api_base: String,

    /// Where the session token and user profile are persisted
    #[serde(default = "default_session_file")]
    session_file: String,

    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    #[serde(default = "default_notification_poll_secs")]
    notification_poll_secs: u64,

    #[serde(default = "default_page_size")]
    default_page_size: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_base() -> String {
    "http://localhost:3000".to_string()
}

fn default_session_file() -> String {
    "data/session.json".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_notification_poll_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    dashboard_core::DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_base: default_api_base(),
            session_file: default_session_file(),
            request_timeout_secs: default_request_timeout_secs(),
            notification_poll_secs: default_notification_poll_secs(),
            default_page_size: default_page_size(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting SOC Dashboard Host v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        api_base = %config.api_base,
        session_file = %config.session_file,
        timeout_secs = config.request_timeout_secs,
        "Loaded configuration"
    );

    let storage = Arc::new(FileStorage::new(&config.session_file));
    check_storage(storage.as_ref());
    let store = SessionStore::new(storage);
    if store.is_authenticated() {
        info!("Restored persisted session");
    }

    let client = ApiClient::new(
        ClientConfig::new(config.api_base.clone())
            .with_timeout(Duration::from_secs(config.request_timeout_secs.max(1))),
    )
    .context("Failed to create API client")?;

    let host = HostConfig {
        default_page_size: config.default_page_size.max(1),
        poll_interval: Duration::from_secs(config.notification_poll_secs.max(1)),
    };
    let state = AppState::with_config(store, Arc::new(client), host);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let snapshot = metrics().snapshot();
    info!(
        views_rendered = snapshot.views_rendered,
        fetch_requests = snapshot.fetch_requests,
        fetch_failures = snapshot.fetch_failures,
        "Shutdown complete"
    );
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("SOC_DASHBOARD")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Probes session storage once so `/health/ready` reflects it from the start.
fn check_storage(storage: &dyn SessionStorage) {
    match storage.get(TOKEN_KEY) {
        Ok(_) => {
            health().session_storage.set_healthy();
            info!("Session storage: healthy");
        }
        Err(e) => {
            health().session_storage.set_unhealthy(e.to_string());
            error!(error = %e, "Session storage: unhealthy");
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
