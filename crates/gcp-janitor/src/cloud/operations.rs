//! Cloud operations trait for testing

use super::error::CloudResult;
use super::gcloud::GcloudClient;
use super::types::{
    ClusterRecord, ClusterTarget, DeleteRequest, ListRequest, ListedItem, Subnet, SubnetRanges,
    SubnetRecord,
};
use gcp_janitor_common::EndpointOverride;
use std::future::Future;

/// Listing and deletion calls the sweep needs from a cloud project.
///
/// Abstracted so the sweep logic can be tested against an in-memory fake
/// instead of a real project.
pub trait CloudOperations: Send + Sync {
    /// List items of one resource kind
    fn list_resources(
        &self,
        request: &ListRequest<'_>,
    ) -> impl Future<Output = CloudResult<Vec<ListedItem>>> + Send;

    /// Delete one chunk of same-scope items
    fn delete_resources(
        &self,
        request: &DeleteRequest,
    ) -> impl Future<Output = CloudResult<()>> + Send;

    fn is_api_enabled(
        &self,
        project: &str,
        api: &str,
    ) -> impl Future<Output = CloudResult<bool>> + Send;

    fn list_subnets(
        &self,
        project: &str,
        filter: &str,
    ) -> impl Future<Output = CloudResult<Vec<SubnetRecord>>> + Send;

    fn describe_subnet_ranges(
        &self,
        project: &str,
        subnet: &Subnet,
    ) -> impl Future<Output = CloudResult<SubnetRanges>> + Send;

    /// Remove the named secondary ranges from a subnet
    fn update_subnet_ranges(
        &self,
        project: &str,
        subnet: &Subnet,
        ranges: &[String],
    ) -> impl Future<Output = CloudResult<()>> + Send;

    /// List clusters served by `endpoint`
    fn list_clusters(
        &self,
        endpoint: &EndpointOverride,
        project: &str,
        filter: &str,
    ) -> impl Future<Output = CloudResult<Vec<ClusterRecord>>> + Send;

    fn delete_cluster(
        &self,
        endpoint: &EndpointOverride,
        project: &str,
        cluster: &ClusterTarget,
    ) -> impl Future<Output = CloudResult<()>> + Send;
}

impl CloudOperations for GcloudClient {
    async fn list_resources(&self, request: &ListRequest<'_>) -> CloudResult<Vec<ListedItem>> {
        GcloudClient::list_resources(self, request).await
    }

    async fn delete_resources(&self, request: &DeleteRequest) -> CloudResult<()> {
        GcloudClient::delete_resources(self, request).await
    }

    async fn is_api_enabled(&self, project: &str, api: &str) -> CloudResult<bool> {
        GcloudClient::is_api_enabled(self, project, api).await
    }

    async fn list_subnets(&self, project: &str, filter: &str) -> CloudResult<Vec<SubnetRecord>> {
        GcloudClient::list_subnets(self, project, filter).await
    }

    async fn describe_subnet_ranges(
        &self,
        project: &str,
        subnet: &Subnet,
    ) -> CloudResult<SubnetRanges> {
        GcloudClient::describe_subnet_ranges(self, project, subnet).await
    }

    async fn update_subnet_ranges(
        &self,
        project: &str,
        subnet: &Subnet,
        ranges: &[String],
    ) -> CloudResult<()> {
        GcloudClient::update_subnet_ranges(self, project, subnet, ranges).await
    }

    async fn list_clusters(
        &self,
        endpoint: &EndpointOverride,
        project: &str,
        filter: &str,
    ) -> CloudResult<Vec<ClusterRecord>> {
        GcloudClient::list_clusters(self, endpoint, project, filter).await
    }

    async fn delete_cluster(
        &self,
        endpoint: &EndpointOverride,
        project: &str,
        cluster: &ClusterTarget,
    ) -> CloudResult<()> {
        GcloudClient::delete_cluster(self, endpoint, project, cluster).await
    }
}
