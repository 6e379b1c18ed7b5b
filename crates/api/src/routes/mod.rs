//! API routes.

pub mod health;
pub mod notifications;
pub mod session;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the host router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/login", post(session::login_handler))
        .route("/logout", post(session::logout_handler))
        .route("/session", get(session::session_handler))
        .route("/views", get(views::entry_view_handler))
        .route("/views/*path", get(views::view_handler))
        .route("/notifications/stream", get(notifications::stream_handler))
        .route(
            "/notifications/mark-all-read",
            post(notifications::mark_all_read_handler),
        )
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}
