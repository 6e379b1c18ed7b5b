//! HTTP surface of the SOC dashboard host.
//!
//! Serves bound view-models to the presentation widgets and owns the login
//! flow. Every view request passes the access gate first.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, HostConfig};
