//! Errors raised while sweeping one resource kind

use crate::cloud::CloudError;
use gcp_janitor_common::ResourceSpec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    /// A listed record violates the contract for its kind
    #[error("Malformed {kind} item: {reason}")]
    MalformedItem { kind: String, reason: String },

    /// Listing a non-tolerant kind failed
    #[error("Failed to list {kind}: {source}")]
    Listing {
        kind: String,
        #[source]
        source: CloudError,
    },
}

impl SweepError {
    pub fn malformed(spec: &ResourceSpec, reason: impl Into<String>) -> Self {
        SweepError::MalformedItem {
            kind: spec.label(),
            reason: reason.into(),
        }
    }

    pub fn listing(kind: impl Into<String>, source: CloudError) -> Self {
        SweepError::Listing {
            kind: kind.into(),
            source,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SweepError::MalformedItem { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let spec = ResourceSpec::new("compute", "instance-groups");
        let err = SweepError::malformed(&spec, "missing isManaged on 'ig-1'");
        assert!(err.is_malformed());
        assert_eq!(
            err.to_string(),
            "Malformed compute instance-groups item: missing isManaged on 'ig-1'"
        );
    }

    #[test]
    fn test_listing_keeps_source() {
        let err = SweepError::listing(
            "compute disks",
            CloudError::failed("gcloud compute -q disks list", Some(1), "denied"),
        );
        assert!(!err.is_malformed());
        assert!(err.to_string().starts_with("Failed to list compute disks"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
