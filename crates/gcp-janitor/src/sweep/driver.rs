//! Top-level sweep loop
//!
//! Order: subnet secondary ranges, then clusters, then every catalog API in
//! declared order. No failure stops the loop; everything is folded into a
//! [`SweepReport`].

use super::batch::{BatchDeleter, DeletionOutcome};
use super::clusters::ClusterSweeper;
use super::error::SweepError;
use super::grouper::{DeletionGroups, group_items, list_request};
use super::subnets::SubnetRangeCleaner;
use crate::cloud::CloudOperations;
use crate::config::RunContext;
use crate::report::SweepReport;
use gcp_janitor_common::defaults::CLUSTER_ENDPOINTS;
use gcp_janitor_common::{ApiResources, Catalog, ClusterEndpoint, ResourceSpec};
use tracing::{debug, error, info, warn};

pub struct Janitor<'a, C> {
    client: &'a C,
    ctx: &'a RunContext,
    catalog: &'a Catalog,
    cluster_endpoints: &'a [ClusterEndpoint],
}

impl<'a, C: CloudOperations> Janitor<'a, C> {
    pub fn new(client: &'a C, ctx: &'a RunContext, catalog: &'a Catalog) -> Self {
        Self {
            client,
            ctx,
            catalog,
            cluster_endpoints: CLUSTER_ENDPOINTS,
        }
    }

    pub fn with_cluster_endpoints(mut self, endpoints: &'a [ClusterEndpoint]) -> Self {
        self.cluster_endpoints = endpoints;
        self
    }

    /// Run the whole sweep
    pub async fn run(&self) -> SweepReport {
        let mut report = SweepReport::default();
        info!(
            project = %self.ctx.project,
            cutoff = ?self.ctx.cutoff,
            dry_run = self.ctx.dry_run,
            "Starting sweep"
        );

        match SubnetRangeCleaner::new(self.client, self.ctx).clean().await {
            Ok(outcome) => debug!(?outcome, "Subnet cleanup finished"),
            Err(e) => {
                warn!(project = %self.ctx.project, error = %e, "Subnet cleanup failed, continuing");
                report.subnet_cleanup_failed = true;
            }
        }

        report.clusters = ClusterSweeper::new(self.client, self.ctx)
            .with_endpoints(self.cluster_endpoints)
            .sweep()
            .await;

        self.sweep_catalog(&mut report).await;
        report
    }

    /// Sweep every enabled API of the catalog in order
    pub async fn sweep_catalog(&self, report: &mut SweepReport) {
        for api in self.catalog.apis() {
            match self.client.is_api_enabled(&self.ctx.project, api.api).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(api = api.api, "API not enabled, skipping");
                    report.disabled_apis.push(api.api.to_string());
                    continue;
                }
                Err(e) => {
                    error!(
                        api = api.api,
                        project = %self.ctx.project,
                        error = %e,
                        "Failed to check whether API is enabled"
                    );
                    report.failed_apis.push(api.api.to_string());
                    continue;
                }
            }

            for spec in &api.specs {
                match self.sweep_spec(api, spec).await {
                    Ok(outcome) => report.record_deletions(spec.to_string(), &outcome),
                    Err(e) => {
                        error!(
                            kind = %spec,
                            project = %self.ctx.project,
                            error = %e,
                            "Failed to sweep resource kind"
                        );
                        report.specs_swept += 1;
                        report.failed_specs.push(spec.to_string());
                    }
                }
            }
        }
    }

    /// List, group and delete one resource kind
    pub async fn sweep_spec(
        &self,
        api: &ApiResources,
        spec: &ResourceSpec,
    ) -> Result<DeletionOutcome, SweepError> {
        if spec.needs_clear_all && !self.ctx.cutoff.is_clear_all() {
            debug!(kind = %spec, "Kind has no creation time, only swept in clear-all mode");
            return Ok(DeletionOutcome::default());
        }

        let groups = self.collect(api, spec).await?;
        if groups.is_empty() {
            debug!(kind = %spec, "Nothing to delete");
            return Ok(DeletionOutcome::default());
        }

        Ok(BatchDeleter::new(self.client, self.ctx)
            .delete(spec, &groups, &self.ctx.project, api.endpoint)
            .await)
    }

    async fn collect(
        &self,
        api: &ApiResources,
        spec: &ResourceSpec,
    ) -> Result<DeletionGroups, SweepError> {
        let request = list_request(spec, api.endpoint, self.ctx);
        let items = match self.client.list_resources(&request).await {
            Ok(items) => items,
            Err(e) if spec.tolerate => {
                warn!(kind = %spec, project = %self.ctx.project, error = %e, "Listing failed, tolerated");
                return Ok(DeletionGroups::new());
            }
            Err(e) => return Err(SweepError::listing(spec.label(), e)),
        };
        debug!(kind = %spec, count = items.len(), "Listed items");
        group_items(&items, spec, &self.ctx.cutoff)
    }
}
