//! Internal telemetry for the SOC dashboard host.
//!
//! In-process metrics and component health, plus tracing setup. Nothing is
//! exported to an external metrics system; the health endpoint serves a
//! snapshot.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
