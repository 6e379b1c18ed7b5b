//! Remote API access for the SOC dashboard host.
//!
//! [`ApiClient`] talks to the API over HTTP. [`fetch_batch`] pulls the set of
//! resources a view needs as one unit.

pub mod batch;
pub mod client;
pub mod error;
pub mod source;

pub use batch::fetch_batch;
pub use client::{ApiClient, ClientConfig, DEFAULT_TIMEOUT};
pub use error::{FetchError, FetchResult};
pub use source::{Action, ResourceSource};
