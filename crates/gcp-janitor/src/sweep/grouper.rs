//! Turning a raw listing into deletion groups keyed by scope

use super::error::SweepError;
use super::filter::{CleanupCandidate, is_in_scope};
use crate::cloud::{ListRequest, ListedItem};
use crate::config::{AgeCutoff, RunContext};
use chrono::{DateTime, NaiveDateTime, Utc};
use gcp_janitor_common::{EndpointOverride, ResourceSpec, ScopeKind};
use std::collections::BTreeMap;
use tracing::debug;

/// Scope value → names to delete, in listing order
pub type DeletionGroups = BTreeMap<String, Vec<String>>;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a creation timestamp: naive `%Y-%m-%dT%H:%M:%S` (UTC) or RFC 3339
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn last_segment(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value)
}

/// Scope value of one item, or `None` if the item is outside the spec's scope
pub fn scope_value(item: &ListedItem, name: &str, spec: &ResourceSpec) -> Option<String> {
    let from_field = |field: Option<&String>| {
        field
            .map(|v| last_segment(v).to_string())
            .filter(|v| !v.is_empty())
    };

    match spec.scope {
        ScopeKind::None => Some(String::new()),
        ScopeKind::Global => {
            if item.zone.is_some() || item.region.is_some() {
                None
            } else {
                Some(String::new())
            }
        }
        ScopeKind::Zone | ScopeKind::Region => {
            let field = match spec.scope {
                ScopeKind::Zone => item.zone.as_ref(),
                _ => item.region.as_ref(),
            };
            if field.is_some() {
                return from_field(field);
            }
            spec.scope_from_name
                .and_then(|idx| name.split('/').nth(idx))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }
    }
}

/// Convert a listed item into a candidate. `Ok(None)` means the item is out
/// of the spec's scope dimension and is skipped silently.
pub fn to_candidate(
    item: &ListedItem,
    spec: &ResourceSpec,
    cutoff: &AgeCutoff,
) -> Result<Option<CleanupCandidate>, SweepError> {
    let name = match item.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => return Err(SweepError::malformed(spec, "item has no name")),
    };

    let Some(scope) = scope_value(item, name, spec) else {
        debug!(kind = %spec, name = %name, "Item outside scope, skipping");
        return Ok(None);
    };

    let created_at = match item.creation_time() {
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => Some(ts),
            // Age is irrelevant in clear-all, so a bad timestamp is too
            None if cutoff.is_clear_all() => None,
            None => {
                return Err(SweepError::malformed(
                    spec,
                    format!("'{}' has unparseable creation time '{}'", name, raw),
                ));
            }
        },
        None => None,
    };

    Ok(Some(CleanupCandidate {
        name: name.to_string(),
        created_at,
        scope_value: Some(scope),
        is_managed: item.is_managed,
    }))
}

/// Filter and group a listing for one spec.
///
/// Any malformed item fails the whole listing pass for the spec.
pub fn group_items(
    items: &[ListedItem],
    spec: &ResourceSpec,
    cutoff: &AgeCutoff,
) -> Result<DeletionGroups, SweepError> {
    let mut groups = DeletionGroups::new();
    for item in items {
        let Some(candidate) = to_candidate(item, spec, cutoff)? else {
            continue;
        };
        if !is_in_scope(&candidate, spec, cutoff)? {
            continue;
        }
        debug!(
            kind = %spec,
            name = %candidate.name,
            created_at = ?candidate.created_at,
            "Found stale item"
        );
        groups
            .entry(candidate.scope_value.unwrap_or_default())
            .or_default()
            .push(candidate.name);
    }
    Ok(groups)
}

/// Listing request for one spec, applying zone pushdown where supported
pub fn list_request<'a>(
    spec: &'a ResourceSpec,
    endpoint: Option<EndpointOverride>,
    ctx: &'a RunContext,
) -> ListRequest<'a> {
    let zones = (spec.scope == ScopeKind::Zone && spec.zone_filter).then_some(ctx.zones.as_slice());
    ListRequest {
        spec,
        project: &ctx.project,
        filter: &ctx.filter,
        zones,
        endpoint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gcp_janitor_common::ManagedFilter;

    fn before_2024() -> AgeCutoff {
        AgeCutoff::Before(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2023-12-31T23:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-12-31T23:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-12-31T15:00:00-08:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_zonal_grouping() {
        let spec = ResourceSpec::new("compute", "disks").scoped(ScopeKind::Zone);
        let items = vec![
            ListedItem::named("a")
                .created("2023-12-31T23:00:00")
                .in_zone("https://x/zones/us-central1-a"),
            ListedItem::named("b")
                .created("2030-01-01T00:00:00")
                .in_zone("https://x/zones/us-central1-a"),
        ];
        let groups = group_items(&items, &spec, &before_2024()).unwrap();
        assert_eq!(
            groups,
            DeletionGroups::from([("us-central1-a".to_string(), vec!["a".to_string()])])
        );
    }

    #[test]
    fn test_young_items_are_dropped() {
        let spec = ResourceSpec::new("compute", "routes");
        let items = vec![
            ListedItem::named("old").created("2023-06-01T00:00:00"),
            ListedItem::named("new").created("2024-06-01T00:00:00"),
        ];
        let groups = group_items(&items, &spec, &before_2024()).unwrap();
        assert_eq!(groups.get(""), Some(&vec!["old".to_string()]));
    }

    #[test]
    fn test_global_excludes_scoped_items() {
        let spec = ResourceSpec::new("compute", "backend-services").scoped(ScopeKind::Global);
        let items = vec![
            ListedItem::named("g"),
            ListedItem::named("z").in_zone("us-central1-a"),
            ListedItem::named("r").in_region("us-central1"),
        ];
        let groups = group_items(&items, &spec, &AgeCutoff::ClearAll).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get(""), Some(&vec!["g".to_string()]));
    }

    #[test]
    fn test_regional_item_without_region_is_skipped() {
        let spec = ResourceSpec::new("compute", "backend-services").scoped(ScopeKind::Region);
        let items = vec![
            ListedItem::named("g"),
            ListedItem::named("r").in_region("regions/us-east1"),
        ];
        let groups = group_items(&items, &spec, &AgeCutoff::ClearAll).unwrap();
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["us-east1"]);
    }

    #[test]
    fn test_filestore_scope_from_name() {
        let spec = ResourceSpec::new("filestore", "instances")
            .scoped(ScopeKind::Zone)
            .without_zone_filter()
            .scope_from_name(3);
        let items = vec![ListedItem::named("projects/p/locations/us-west1-b/instances/fs-1")];
        let groups = group_items(&items, &spec, &AgeCutoff::ClearAll).unwrap();
        assert_eq!(
            groups.get("us-west1-b"),
            Some(&vec!["projects/p/locations/us-west1-b/instances/fs-1".to_string()])
        );
    }

    #[test]
    fn test_listing_order_preserved_within_group() {
        let spec = ResourceSpec::new("compute", "instances").scoped(ScopeKind::Zone);
        let items: Vec<_> = ["c", "a", "b"]
            .iter()
            .map(|n| ListedItem::named(*n).in_zone("us-central1-a"))
            .collect();
        let groups = group_items(&items, &spec, &AgeCutoff::ClearAll).unwrap();
        assert_eq!(groups["us-central1-a"], vec!["c", "a", "b"]);
    }

    #[test]
    fn test_malformed_items() {
        let spec = ResourceSpec::new("compute", "disks");
        let nameless = vec![ListedItem::default()];
        assert!(group_items(&nameless, &spec, &AgeCutoff::ClearAll)
            .unwrap_err()
            .is_malformed());

        let bad_time = vec![ListedItem::named("d").created("not-a-time")];
        assert!(group_items(&bad_time, &spec, &before_2024())
            .unwrap_err()
            .is_malformed());
        assert!(group_items(&bad_time, &spec, &AgeCutoff::ClearAll).is_ok());

        let managed = ResourceSpec::new("compute", "instance-groups")
            .scoped(ScopeKind::Zone)
            .managed(ManagedFilter::Managed);
        let no_flag = vec![ListedItem::named("ig").in_zone("us-central1-a")];
        assert!(group_items(&no_flag, &managed, &AgeCutoff::ClearAll)
            .unwrap_err()
            .is_malformed());
    }

    #[test]
    fn test_list_request_zone_pushdown() {
        let ctx = RunContext::new("p", AgeCutoff::ClearAll);
        let zonal = ResourceSpec::new("compute", "disks").scoped(ScopeKind::Zone);
        assert!(list_request(&zonal, None, &ctx).zones.is_some());

        let neg = zonal.without_zone_filter();
        assert!(list_request(&neg, None, &ctx).zones.is_none());

        let regional = ResourceSpec::new("compute", "routers").scoped(ScopeKind::Region);
        assert!(list_request(&regional, None, &ctx).zones.is_none());
    }
}
