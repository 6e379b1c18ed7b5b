//! Core types and pure logic for the SOC dashboard host: session state,
//! access control, record aggregation and view binding.

pub mod aggregate;
pub mod binding;
pub mod error;
pub mod gate;
pub mod pagination;
pub mod record;
pub mod routes;
pub mod session;
pub mod storage;
pub mod views;

pub use binding::ViewModel;
pub use error::{Error, Result};
pub use gate::{AccessGate, AccessState, GateDecision};
pub use pagination::{PageInfo, Paginator, DEFAULT_PAGE_SIZE};
pub use record::Record;
pub use routes::{RouteTable, ViewKind, LOGIN_PATH};
pub use session::*;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use views::{Resource, ResourceSet, SortOrder, ViewParams};
