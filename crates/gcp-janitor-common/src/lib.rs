//! gcp-janitor-common - Shared resource catalog and defaults
//!
//! This crate holds the static data the sweep engine runs over, without any
//! async or process dependencies.
//!
//! ## Modules
//!
//! - [`resource_kind`]: Resource kind descriptions (`ResourceSpec`)
//! - [`catalog`]: Ordered catalog of APIs and their resource kinds
//! - [`defaults`]: Default configuration values, zones and cluster endpoints

pub mod catalog;
pub mod defaults;
pub mod resource_kind;

pub use catalog::{ApiResources, Catalog, CatalogError, EndpointOverride};
pub use defaults::{ClusterEndpoint, merge_zones};
pub use resource_kind::{ManagedFilter, ResourceSpec, ScopeKind};
