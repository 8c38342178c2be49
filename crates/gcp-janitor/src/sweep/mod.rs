//! The resource sweep engine
//!
//! - `filter`: per-item scope decision
//! - `grouper`: raw listing to deletion groups
//! - `batch`: chunked deletion on a bounded worker pool
//! - `clusters`: cluster sweep across endpoints
//! - `subnets`: secondary range cleanup
//! - `driver`: the top-level loop tying them together

pub mod batch;
pub mod clusters;
pub mod driver;
pub mod error;
pub mod filter;
pub mod grouper;
pub mod subnets;

pub use batch::{BatchDeleter, DeletionFailure, DeletionOutcome, ErrorSink};
pub use clusters::{ClusterSweepOutcome, ClusterSweeper};
pub use driver::Janitor;
pub use error::SweepError;
pub use filter::{CleanupCandidate, is_in_scope};
pub use grouper::{DeletionGroups, group_items, parse_timestamp};
pub use subnets::{SubnetCleanupOutcome, SubnetRangeCleaner};
