//! gcp-janitor - stale cloud resource sweeper
//!
//! This crate provides the sweep engine (catalog-driven listing, filtering,
//! grouping and bounded-concurrency batch deletion) and the `gcp-janitor`
//! binary that drives it through the `gcloud` CLI.

pub mod cloud;
pub mod config;
pub mod report;
pub mod sweep;

pub use config::{AgeCutoff, ConfigError, RunContext};
pub use report::SweepReport;
pub use sweep::Janitor;
