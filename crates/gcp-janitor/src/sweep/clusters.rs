//! Stale cluster sweep across the fixed list of cluster endpoints
//!
//! Endpoints are visited one at a time. Within an endpoint, deletions run on
//! the bounded pool and all of them finish before the next endpoint starts.

use super::batch::ErrorSink;
use super::error::SweepError;
use super::grouper::parse_timestamp;
use crate::cloud::{ClusterLocation, ClusterRecord, ClusterTarget, CloudOperations};
use crate::config::{AgeCutoff, RunContext};
use futures::stream::{self, StreamExt};
use gcp_janitor_common::defaults::CLUSTER_ENDPOINTS;
use gcp_janitor_common::{ClusterEndpoint, EndpointOverride, ResourceSpec};
use tracing::{error, info, warn};

const CLUSTER_KIND: ResourceSpec = ResourceSpec::new("container", "clusters");

#[derive(Debug, Default)]
pub struct ClusterSweepOutcome {
    pub endpoints_visited: usize,
    pub unreachable: Vec<&'static str>,
    /// Endpoints whose listing contained a malformed record
    pub malformed: Vec<&'static str>,
    pub deleted: usize,
    pub failed_deletions: usize,
}

impl ClusterSweepOutcome {
    pub fn is_failed(&self) -> bool {
        !self.malformed.is_empty() || self.failed_deletions > 0
    }
}

/// Validate every record and select the stale ones.
///
/// All-or-nothing: one malformed record rejects the whole listing.
pub fn select_stale(
    records: &[ClusterRecord],
    cutoff: &AgeCutoff,
) -> Result<Vec<ClusterTarget>, SweepError> {
    let mut stale = Vec::new();
    for record in records {
        let name = record
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SweepError::malformed(&CLUSTER_KIND, "cluster has no name"))?;
        let raw_time = record.create_time.as_deref().ok_or_else(|| {
            SweepError::malformed(&CLUSTER_KIND, format!("'{}' has no createTime", name))
        })?;
        let location = match (&record.zone, &record.region) {
            (Some(zone), _) => ClusterLocation::Zone(zone.clone()),
            (None, Some(region)) => ClusterLocation::Region(region.clone()),
            (None, None) => {
                return Err(SweepError::malformed(
                    &CLUSTER_KIND,
                    format!("'{}' has neither zone nor region", name),
                ));
            }
        };
        let created = parse_timestamp(raw_time).ok_or_else(|| {
            SweepError::malformed(
                &CLUSTER_KIND,
                format!("'{}' has unparseable createTime '{}'", name, raw_time),
            )
        })?;

        if cutoff.includes(created) {
            stale.push(ClusterTarget {
                name: name.to_string(),
                location,
            });
        }
    }
    Ok(stale)
}

pub struct ClusterSweeper<'a, C> {
    client: &'a C,
    ctx: &'a RunContext,
    endpoints: &'a [ClusterEndpoint],
}

impl<'a, C: CloudOperations> ClusterSweeper<'a, C> {
    pub fn new(client: &'a C, ctx: &'a RunContext) -> Self {
        Self {
            client,
            ctx,
            endpoints: CLUSTER_ENDPOINTS,
        }
    }

    pub fn with_endpoints(mut self, endpoints: &'a [ClusterEndpoint]) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub async fn sweep(&self) -> ClusterSweepOutcome {
        let mut outcome = ClusterSweepOutcome::default();
        for endpoint in self.endpoints {
            outcome.endpoints_visited += 1;
            self.sweep_endpoint(endpoint, &mut outcome).await;
        }
        outcome
    }

    async fn sweep_endpoint(&self, endpoint: &ClusterEndpoint, outcome: &mut ClusterSweepOutcome) {
        let project = self.ctx.project.as_str();
        let target = endpoint.as_override();
        info!(endpoint = endpoint.name, url = endpoint.url, "Checking cluster endpoint");

        let records = match self
            .client
            .list_clusters(&target, project, &self.ctx.filter)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    endpoint = endpoint.name,
                    project = %project,
                    error = %e,
                    "Endpoint unreachable, continuing"
                );
                outcome.unreachable.push(endpoint.name);
                return;
            }
        };

        let stale = match select_stale(&records, &self.ctx.cutoff) {
            Ok(stale) => stale,
            Err(e) => {
                error!(
                    endpoint = endpoint.name,
                    project = %project,
                    error = %e,
                    "Invalid cluster listing, skipping endpoint"
                );
                outcome.malformed.push(endpoint.name);
                return;
            }
        };

        if stale.is_empty() {
            return;
        }
        for cluster in &stale {
            info!(endpoint = endpoint.name, cluster = %cluster, "Found stale cluster");
        }
        if self.ctx.dry_run {
            info!(
                endpoint = endpoint.name,
                count = stale.len(),
                "[dry run] Would delete clusters"
            );
            return;
        }

        let sink = ErrorSink::default();
        stream::iter(&stale)
            .map(|cluster| self.delete_one(&target, cluster, &sink))
            .buffer_unordered(self.ctx.workers.max(1))
            .collect::<Vec<()>>()
            .await;

        let failures = sink.len();
        outcome.failed_deletions += failures;
        outcome.deleted += stale.len() - failures;
    }

    async fn delete_one(&self, endpoint: &EndpointOverride, cluster: &ClusterTarget, sink: &ErrorSink) {
        let project = self.ctx.project.as_str();
        if let Err(e) = self.client.delete_cluster(endpoint, project, cluster).await {
            error!(
                kind = "container clusters",
                project = %project,
                cluster = %cluster,
                error = %e,
                "Failed to delete cluster"
            );
            sink.record(cluster.to_string(), e);
        } else {
            info!(cluster = %cluster, "Deleted cluster");
        }
    }
}
