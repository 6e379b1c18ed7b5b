//! View lifecycle for the SOC dashboard host.
//!
//! - [`ViewMount`]: one live view, its fetched data and its cancellation token
//! - [`Poller`]: repeating refresh bound to a mount's token

pub mod mount;
pub mod poller;

pub use mount::{LoadOutcome, ViewMount, ViewState};
pub use poller::{Poller, PollerConfig, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
