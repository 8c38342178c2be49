//! Cloud client abstraction and the `gcloud`-backed implementation

mod command;
pub mod error;
pub mod gcloud;
mod operations;
mod types;

pub use error::{CloudError, CloudResult};
pub use gcloud::{GcloudClient, GcloudConfig};
pub use operations::CloudOperations;
pub use types::{
    ClusterLocation, ClusterRecord, ClusterTarget, DeleteRequest, DeleteScope, ListRequest,
    ListedItem, SecondaryRange, Subnet, SubnetRanges, SubnetRecord,
};
