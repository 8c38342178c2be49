//! Run-level summary of a sweep

use crate::sweep::{ClusterSweepOutcome, DeletionOutcome};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct SweepReport {
    pub specs_swept: usize,
    /// APIs skipped because they are not enabled on the project
    pub disabled_apis: Vec<String>,
    /// APIs whose enablement could not be determined
    pub failed_apis: Vec<String>,
    /// Specs whose listing or deletion failed
    pub failed_specs: Vec<String>,
    pub deletion_calls: usize,
    pub deleted: usize,
    pub failed_deletions: usize,
    /// Failed deletions of tolerant kinds; diagnostic only
    pub tolerated_failures: usize,
    pub clusters: ClusterSweepOutcome,
    /// Best effort; never affects the exit status
    pub subnet_cleanup_failed: bool,
}

impl SweepReport {
    pub fn record_deletions(&mut self, label: String, outcome: &DeletionOutcome) {
        self.specs_swept += 1;
        self.deletion_calls += outcome.calls;
        self.deleted += outcome.deleted;
        self.failed_deletions += outcome.failures.len();
        self.tolerated_failures += outcome.tolerated;
        if outcome.is_failed() {
            self.failed_specs.push(label);
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed_specs.is_empty() && self.failed_apis.is_empty() && !self.clusters.is_failed()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn log_summary(&self) {
        info!(
            specs = self.specs_swept,
            calls = self.deletion_calls,
            deleted = self.deleted,
            clusters_deleted = self.clusters.deleted,
            disabled_apis = self.disabled_apis.len(),
            tolerated_failures = self.tolerated_failures,
            "Sweep finished"
        );
        if !self.is_success() {
            warn!(
                failed_specs = ?self.failed_specs,
                failed_apis = ?self.failed_apis,
                failed_deletions = self.failed_deletions,
                cluster_failures = self.clusters.failed_deletions,
                malformed_cluster_endpoints = ?self.clusters.malformed,
                "Sweep finished with failures"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::CloudError;
    use crate::sweep::DeletionFailure;

    #[test]
    fn test_empty_report_succeeds() {
        let report = SweepReport::default();
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_tolerated_failures_do_not_fail() {
        let mut report = SweepReport::default();
        let outcome = DeletionOutcome {
            calls: 2,
            tolerated: 2,
            ..DeletionOutcome::default()
        };
        report.record_deletions("compute networks subnets".to_string(), &outcome);
        assert_eq!(report.tolerated_failures, 2);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_failure_sources() {
        let mut report = SweepReport::default();
        let outcome = DeletionOutcome {
            calls: 1,
            failures: vec![DeletionFailure {
                target: "compute disks [a]".to_string(),
                error: CloudError::failed("gcloud", Some(1), ""),
            }],
            ..DeletionOutcome::default()
        };
        report.record_deletions("compute disks".to_string(), &outcome);
        assert_eq!(report.failed_specs, vec!["compute disks"]);
        assert_eq!(report.exit_code(), 1);

        let report = SweepReport {
            failed_apis: vec!["file.googleapis.com".to_string()],
            ..SweepReport::default()
        };
        assert!(!report.is_success());

        let mut report = SweepReport::default();
        report.clusters.failed_deletions = 1;
        assert!(!report.is_success());

        let report = SweepReport {
            subnet_cleanup_failed: true,
            ..SweepReport::default()
        };
        assert!(report.is_success());
    }
}
