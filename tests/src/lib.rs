//! Shared harness for the dashboard host integration tests.

pub mod fixtures;
pub mod mocks;
pub mod setup;
