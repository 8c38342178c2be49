//! Shared test utilities for gcp-janitor
//!
//! ## Modules
//!
//! - [`fake`]: in-memory [`CloudOperations`](gcp_janitor::cloud::CloudOperations) implementation
//! - [`fixtures`]: listing records and run contexts

pub mod fake;
pub mod fixtures;

pub use fake::{Call, FakeCloud};
