//! Removal of leaked secondary IP ranges from subnets
//!
//! Networks cannot be deleted while a subnet still carries secondary ranges
//! left behind by deleted clusters, so this runs before the catalog sweep.

use super::error::SweepError;
use crate::cloud::{CloudOperations, Subnet, SubnetRecord};
use crate::config::RunContext;
use gcp_janitor_common::{ResourceSpec, ScopeKind};
use tracing::{debug, info, warn};

const SUBNET_KIND: ResourceSpec =
    ResourceSpec::new("compute", "networks").subgroup("subnets").scoped(ScopeKind::Region);

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SubnetCleanupOutcome {
    pub subnets: usize,
    /// Subnets whose ranges were removed (or would be, in dry run)
    pub updated: usize,
    /// Subnets skipped because describe or update failed or a range was unnamed
    pub skipped: usize,
}

/// Validate subnet listing records
pub fn parse_subnets(records: &[SubnetRecord]) -> Result<Vec<Subnet>, SweepError> {
    records
        .iter()
        .map(|record| {
            let region = record
                .region
                .as_deref()
                .and_then(|url| url.rsplit('/').next());
            match (record.name.as_deref(), region) {
                (Some(name), Some(region)) if !name.is_empty() && !region.is_empty() => {
                    Ok(Subnet {
                        name: name.to_string(),
                        region: region.to_string(),
                    })
                }
                _ => Err(SweepError::malformed(
                    &SUBNET_KIND,
                    format!("subnet record {:?} lacks name or region", record),
                )),
            }
        })
        .collect()
}

pub struct SubnetRangeCleaner<'a, C> {
    client: &'a C,
    ctx: &'a RunContext,
}

impl<'a, C: CloudOperations> SubnetRangeCleaner<'a, C> {
    pub fn new(client: &'a C, ctx: &'a RunContext) -> Self {
        Self { client, ctx }
    }

    pub async fn clean(&self) -> Result<SubnetCleanupOutcome, SweepError> {
        let project = self.ctx.project.as_str();
        let records = self
            .client
            .list_subnets(project, &self.ctx.filter)
            .await
            .map_err(|e| SweepError::listing(SUBNET_KIND.label(), e))?;
        let subnets = parse_subnets(&records)?;

        let mut outcome = SubnetCleanupOutcome {
            subnets: subnets.len(),
            ..SubnetCleanupOutcome::default()
        };
        for subnet in &subnets {
            match self.clean_subnet(subnet).await {
                Some(true) => outcome.updated += 1,
                Some(false) => {}
                None => outcome.skipped += 1,
            }
        }
        Ok(outcome)
    }

    /// `Some(true)` if ranges were removed, `Some(false)` if there were none,
    /// `None` if the subnet had to be skipped
    async fn clean_subnet(&self, subnet: &Subnet) -> Option<bool> {
        let project = self.ctx.project.as_str();
        let ranges = match self.client.describe_subnet_ranges(project, subnet).await {
            Ok(ranges) => ranges,
            Err(e) => {
                warn!(subnet = %subnet, project = %project, error = %e, "Failed to describe subnet");
                return None;
            }
        };

        if ranges.secondary_ip_ranges.is_empty() {
            debug!(subnet = %subnet, "No secondary ranges");
            return Some(false);
        }

        let mut names = Vec::with_capacity(ranges.secondary_ip_ranges.len());
        for range in &ranges.secondary_ip_ranges {
            match range.range_name.as_deref() {
                Some(name) if !name.is_empty() => names.push(name.to_string()),
                _ => {
                    warn!(subnet = %subnet, range = ?range, "Secondary range without rangeName, skipping subnet");
                    return None;
                }
            }
        }

        if self.ctx.dry_run {
            info!(subnet = %subnet, ranges = ?names, "[dry run] Would remove secondary ranges");
            return Some(true);
        }

        info!(subnet = %subnet, ranges = ?names, "Removing secondary ranges");
        match self
            .client
            .update_subnet_ranges(project, subnet, &names)
            .await
        {
            Ok(()) => Some(true),
            Err(e) => {
                warn!(subnet = %subnet, project = %project, error = %e, "Failed to remove secondary ranges");
                None
            }
        }
    }
}
