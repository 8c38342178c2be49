//! Listing records and run contexts shared by the integration tests

use chrono::{TimeZone, Utc};
use gcp_janitor::cloud::{ClusterRecord, ListedItem, SecondaryRange, SubnetRanges, SubnetRecord};
use gcp_janitor::{AgeCutoff, RunContext};

/// Project id used by every fixture
pub const PROJECT: &str = "janitor-test";

/// Creation time well before [`cutoff`]
pub const OLD: &str = "2023-12-31T23:00:00";

/// Creation time after [`cutoff`]
pub const NEW: &str = "2024-01-01T06:00:00";

/// Cutoff at 2024-01-01T00:00:00Z
pub fn cutoff() -> AgeCutoff {
    AgeCutoff::Before(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

/// Context with the fixed cutoff and a small zone set
pub fn context() -> RunContext {
    RunContext {
        zones: vec!["us-central1-a".to_string(), "us-east1-b".to_string()],
        ..RunContext::new(PROJECT, cutoff())
    }
}

pub fn clear_all_context() -> RunContext {
    RunContext {
        cutoff: AgeCutoff::ClearAll,
        ..context()
    }
}

pub fn old(name: &str) -> ListedItem {
    ListedItem::named(name).created(OLD)
}

pub fn new(name: &str) -> ListedItem {
    ListedItem::named(name).created(NEW)
}

pub fn cluster(name: &str, created: &str, zone: &str) -> ClusterRecord {
    ClusterRecord {
        name: Some(name.to_string()),
        create_time: Some(created.to_string()),
        zone: Some(zone.to_string()),
        region: None,
    }
}

pub fn subnet(name: &str, region: &str) -> SubnetRecord {
    SubnetRecord {
        name: Some(name.to_string()),
        region: Some(region.to_string()),
    }
}

pub fn ranges(names: &[&str]) -> SubnetRanges {
    SubnetRanges {
        secondary_ip_ranges: names
            .iter()
            .map(|n| SecondaryRange {
                range_name: Some(n.to_string()),
                ip_cidr_range: None,
            })
            .collect(),
    }
}
