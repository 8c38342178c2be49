//! Request and record types exchanged with the cloud client

use gcp_janitor_common::{EndpointOverride, ResourceSpec};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// One raw item from a resource listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "deserialize_managed")]
    pub is_managed: Option<bool>,
}

impl ListedItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn created(mut self, timestamp: impl Into<String>) -> Self {
        self.creation_timestamp = Some(timestamp.into());
        self
    }

    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_managed(mut self, managed: bool) -> Self {
        self.is_managed = Some(managed);
        self
    }

    /// Creation time, preferring `creationTimestamp` over `createTime`
    pub fn creation_time(&self) -> Option<&str> {
        self.creation_timestamp
            .as_deref()
            .or(self.create_time.as_deref())
    }
}

/// `isManaged` comes back as `"Yes"`/`"No"` from compute listings and as a
/// bool from some other surfaces.
fn deserialize_managed<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Flag(flag)) => Ok(Some(flag)),
        Some(Raw::Text(text)) => match text.to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(Some(true)),
            "no" | "false" => Ok(Some(false)),
            "" => Ok(None),
            other => Err(serde::de::Error::custom(format!(
                "unexpected isManaged value '{}'",
                other
            ))),
        },
    }
}

/// Parameters for listing one resource kind
#[derive(Debug, Clone)]
pub struct ListRequest<'a> {
    pub spec: &'a ResourceSpec,
    pub project: &'a str,
    pub filter: &'a str,
    /// Zone set pushed down into the listing filter, if the kind supports it
    pub zones: Option<&'a [String]>,
    pub endpoint: Option<EndpointOverride>,
}

impl ListRequest<'_> {
    /// Effective `--filter` value including the zone pushdown
    pub fn effective_filter(&self) -> String {
        match self.zones {
            Some(zones) if !zones.is_empty() => {
                format!("{} AND zone:( {} )", self.filter, zones.join(" "))
            }
            _ => self.filter.to_string(),
        }
    }
}

/// Scope qualifier attached to a deletion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteScope {
    None,
    Global,
    Zone(String),
    Region(String),
}

impl DeleteScope {
    pub fn flag(&self) -> Option<String> {
        match self {
            DeleteScope::None => None,
            DeleteScope::Global => Some("--global".to_string()),
            DeleteScope::Zone(zone) => Some(format!("--zone={}", zone)),
            DeleteScope::Region(region) => Some(format!("--region={}", region)),
        }
    }
}

/// One deletion call: a chunk of names of one kind in one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub spec: ResourceSpec,
    pub project: String,
    pub names: Vec<String>,
    pub scope: DeleteScope,
    pub endpoint: Option<EndpointOverride>,
}

impl fmt::Display for DeleteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.spec.label(), self.names.join(", "))?;
        if let Some(flag) = self.scope.flag() {
            write!(f, " {}", flag)?;
        }
        Ok(())
    }
}

/// Raw subnet listing record
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubnetRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// A validated subnet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub name: String,
    pub region: String,
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.region)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryRange {
    #[serde(default)]
    pub range_name: Option<String>,
    #[serde(default)]
    pub ip_cidr_range: Option<String>,
}

/// Secondary ranges attached to one subnet
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetRanges {
    #[serde(default)]
    pub secondary_ip_ranges: Vec<SecondaryRange>,
}

/// Raw cluster listing record
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterLocation {
    Zone(String),
    Region(String),
}

impl ClusterLocation {
    pub fn flag(&self) -> String {
        match self {
            ClusterLocation::Zone(zone) => format!("--zone={}", zone),
            ClusterLocation::Region(region) => format!("--region={}", region),
        }
    }
}

/// A cluster selected for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterTarget {
    pub name: String,
    pub location: ClusterLocation,
}

impl fmt::Display for ClusterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.location.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listed_item_managed_yes_no() {
        let items: Vec<ListedItem> = serde_json::from_str(
            r#"[
                {"name": "a", "isManaged": "Yes"},
                {"name": "b", "isManaged": "No"},
                {"name": "c", "isManaged": true},
                {"name": "d"}
            ]"#,
        )
        .unwrap();
        let flags: Vec<_> = items.iter().map(|i| i.is_managed).collect();
        assert_eq!(flags, vec![Some(true), Some(false), Some(true), None]);
    }

    #[test]
    fn test_listed_item_rejects_unknown_managed_value() {
        let result = serde_json::from_str::<ListedItem>(r#"{"name": "a", "isManaged": "maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_creation_time_fallback() {
        let item: ListedItem =
            serde_json::from_str(r#"{"name": "s", "createTime": "2024-01-01T00:00:00"}"#).unwrap();
        assert_eq!(item.creation_time(), Some("2024-01-01T00:00:00"));

        let item = ListedItem::named("x").created("2023-05-05T00:00:00");
        assert_eq!(item.creation_time(), Some("2023-05-05T00:00:00"));
    }

    #[test]
    fn test_effective_filter_with_zones() {
        let spec = ResourceSpec::new("compute", "disks");
        let zones = vec!["us-central1-a".to_string(), "us-east1-b".to_string()];
        let request = ListRequest {
            spec: &spec,
            project: "p",
            filter: "name !~ ^default",
            zones: Some(&zones),
            endpoint: None,
        };
        assert_eq!(
            request.effective_filter(),
            "name !~ ^default AND zone:( us-central1-a us-east1-b )"
        );

        let request = ListRequest { zones: None, ..request };
        assert_eq!(request.effective_filter(), "name !~ ^default");
    }

    #[test]
    fn test_delete_scope_flags() {
        assert_eq!(DeleteScope::None.flag(), None);
        assert_eq!(DeleteScope::Global.flag().as_deref(), Some("--global"));
        assert_eq!(
            DeleteScope::Zone("us-central1-a".into()).flag().as_deref(),
            Some("--zone=us-central1-a")
        );
        assert_eq!(
            DeleteScope::Region("us-east1".into()).flag().as_deref(),
            Some("--region=us-east1")
        );
    }

    #[test]
    fn test_subnet_ranges_missing_field() {
        let ranges: SubnetRanges = serde_json::from_str("{}").unwrap();
        assert!(ranges.secondary_ip_ranges.is_empty());

        let ranges: SubnetRanges = serde_json::from_str(
            r#"{"secondaryIpRanges": [{"rangeName": "pods", "ipCidrRange": "10.0.0.0/14"}]}"#,
        )
        .unwrap();
        assert_eq!(ranges.secondary_ip_ranges[0].range_name.as_deref(), Some("pods"));
    }
}
