//! Common test utilities for build3d-dock E2E tests

#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod server;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use server::*;
