//! Static catalog of resource kinds, grouped by API
//!
//! ORDER MATTERS. Within each API, kinds are listed in deletion dependency
//! order (instances before disks, subnetworks before networks, ...) and the
//! sweep engine processes them exactly in this order.

use crate::resource_kind::{ManagedFilter, ResourceSpec, ScopeKind};
use std::collections::HashSet;
use thiserror::Error;

/// Per-call override of a service's API endpoint
///
/// Passed explicitly with every client call that needs it, rendered by the
/// gcloud client as `CLOUDSDK_API_ENDPOINT_OVERRIDES_<SERVICE>` on that
/// child process only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointOverride {
    /// Service segment of the override variable (`container`, `gkehub`)
    pub service: &'static str,
    pub url: &'static str,
}

impl EndpointOverride {
    pub const fn new(service: &'static str, url: &'static str) -> Self {
        Self { service, url }
    }

    /// Environment variable name understood by gcloud
    pub fn env_var(&self) -> String {
        format!(
            "CLOUDSDK_API_ENDPOINT_OVERRIDES_{}",
            self.service.to_ascii_uppercase()
        )
    }
}

/// All resource kinds swept under one API
#[derive(Debug, Clone)]
pub struct ApiResources {
    /// Service name checked for enablement, e.g. `compute.googleapis.com`
    pub api: &'static str,
    pub endpoint: Option<EndpointOverride>,
    pub specs: Vec<ResourceSpec>,
}

impl ApiResources {
    pub fn new(api: &'static str, specs: Vec<ResourceSpec>) -> Self {
        Self {
            api,
            endpoint: None,
            specs,
        }
    }

    pub fn with_endpoint(mut self, endpoint: EndpointOverride) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

/// Catalog validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("API identifier cannot be empty")]
    EmptyApi,

    #[error("API '{0}' is listed more than once")]
    DuplicateApi(String),

    #[error("API '{api}' lists {spec} more than once")]
    DuplicateSpec { api: String, spec: String },

    #[error("{spec}: scope_from_name requires zone or region scope")]
    NameScopeWithoutField { spec: String },

    #[error("{spec}: zone filter requires zone scope")]
    ZoneFilterWithoutZone { spec: String },

    #[error("{spec}: preserved names cannot be empty strings")]
    EmptyPreservedName { spec: String },
}

/// Ordered registry of APIs and their resource kinds
#[derive(Debug, Clone)]
pub struct Catalog {
    apis: Vec<ApiResources>,
}

impl Catalog {
    pub fn new(apis: Vec<ApiResources>) -> Self {
        Self { apis }
    }

    /// Iterate APIs in declared order
    pub fn apis(&self) -> impl Iterator<Item = &ApiResources> {
        self.apis.iter()
    }

    /// Iterate `(api, spec)` pairs in declared order
    pub fn specs(&self) -> impl Iterator<Item = (&ApiResources, &ResourceSpec)> {
        self.apis
            .iter()
            .flat_map(|api| api.specs.iter().map(move |spec| (api, spec)))
    }

    pub fn len(&self) -> usize {
        self.apis.iter().map(|api| api.specs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check structural consistency of the catalog.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen_apis = HashSet::new();
        for api in &self.apis {
            if api.api.is_empty() {
                return Err(CatalogError::EmptyApi);
            }
            if !seen_apis.insert(api.api) {
                return Err(CatalogError::DuplicateApi(api.api.to_string()));
            }

            let mut seen_specs = HashSet::new();
            for spec in &api.specs {
                let identity = (
                    spec.group,
                    spec.name,
                    spec.subgroup,
                    spec.scope,
                    spec.managed,
                );
                if !seen_specs.insert(identity) {
                    return Err(CatalogError::DuplicateSpec {
                        api: api.api.to_string(),
                        spec: spec.to_string(),
                    });
                }
                if spec.scope_from_name.is_some() && spec.scope.field().is_none() {
                    return Err(CatalogError::NameScopeWithoutField {
                        spec: spec.to_string(),
                    });
                }
                if spec.zone_filter && spec.scope != ScopeKind::Zone {
                    return Err(CatalogError::ZoneFilterWithoutZone {
                        spec: spec.to_string(),
                    });
                }
                if spec.preserved_names.iter().any(|n| n.is_empty()) {
                    return Err(CatalogError::EmptyPreservedName {
                        spec: spec.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// The hand-maintained GCP catalog.
    pub fn gcp() -> Self {
        use ManagedFilter::{Managed, Unmanaged};
        use ScopeKind::{Global, Region, Zone};

        let compute = |name: &'static str| ResourceSpec::new("compute", name);
        let memberships = || {
            ResourceSpec::new("container", "hub")
                .subgroup("memberships")
                .single_delete()
        };

        Self::new(vec![
            ApiResources::new(
                "file.googleapis.com",
                vec![
                    // Instance names look like projects/<p>/locations/<zone>/instances/<name>
                    ResourceSpec::new("filestore", "instances")
                        .scoped(Zone)
                        .without_zone_filter()
                        .scope_from_name(3)
                        .force_delete()
                        .single_delete(),
                ],
            ),
            ApiResources::new(
                "secretmanager.googleapis.com",
                vec![
                    ResourceSpec::new("secretmanager", "secrets").scoped(Zone),
                ],
            ),
            ApiResources::new(
                "compute.googleapis.com",
                vec![
                    compute("instances").scoped(Zone),
                    compute("addresses").scoped(Global),
                    compute("addresses").scoped(Region),
                    compute("disks").scoped(Zone),
                    compute("disks").scoped(Region),
                    compute("firewall-rules"),
                    compute("forwarding-rules").scoped(Global),
                    compute("forwarding-rules").scoped(Region),
                    compute("target-http-proxies").scoped(Global),
                    compute("target-http-proxies").scoped(Region),
                    compute("target-https-proxies").scoped(Global),
                    compute("target-https-proxies").scoped(Region),
                    compute("target-tcp-proxies"),
                    compute("ssl-policies").scoped(Global),
                    compute("ssl-policies").scoped(Region),
                    compute("ssl-certificates").scoped(Global),
                    compute("ssl-certificates").scoped(Region),
                    compute("url-maps").scoped(Global),
                    compute("url-maps").scoped(Region),
                    compute("backend-services").scoped(Global),
                    compute("backend-services").scoped(Region),
                    compute("target-pools").scoped(Region),
                    compute("security-policies").scoped(Global),
                    compute("security-policies").scoped(Region),
                    compute("health-checks").scoped(Global),
                    compute("health-checks").scoped(Region),
                    compute("http-health-checks"),
                    compute("instance-groups").scoped(Region).managed(Managed),
                    compute("instance-groups").scoped(Zone).managed(Managed),
                    compute("instance-groups").scoped(Zone).managed(Unmanaged),
                    compute("instance-templates").scoped(Global),
                    compute("instance-templates").scoped(Region),
                    compute("sole-tenancy")
                        .subgroup("node-groups")
                        .scoped(Zone)
                        .without_zone_filter(),
                    compute("sole-tenancy")
                        .subgroup("node-templates")
                        .scoped(Region),
                    compute("network-endpoint-groups")
                        .scoped(Zone)
                        .without_zone_filter()
                        .single_delete(),
                    compute("routes"),
                    compute("routers").scoped(Region),
                    compute("networks")
                        .subgroup("subnets")
                        .scoped(Region)
                        .tolerate(),
                    compute("networks"),
                ],
            ),
            ApiResources::new(
                "logging.googleapis.com",
                vec![
                    ResourceSpec::new("logging", "sinks")
                        .single_delete()
                        .needs_clear_all()
                        .preserve(&["_Default", "_Required"]),
                ],
            ),
            ApiResources::new(
                "pubsub.googleapis.com",
                vec![
                    ResourceSpec::new("pubsub", "subscriptions"),
                    ResourceSpec::new("pubsub", "topics").preserve(&[
                        "container-analysis-notes-v1",
                        "container-analysis-notes-v1beta1",
                        "container-analysis-occurrences-v1",
                        "container-analysis-occurrences-v1beta1",
                    ]),
                ],
            ),
            ApiResources::new("gkehub.googleapis.com", vec![memberships()]).with_endpoint(
                EndpointOverride::new("gkehub", "https://gkehub.googleapis.com/"),
            ),
            ApiResources::new("staging-gkehub.sandbox.googleapis.com", vec![memberships()])
                .with_endpoint(EndpointOverride::new(
                    "gkehub",
                    "https://staging-gkehub.sandbox.googleapis.com/",
                )),
            ApiResources::new("autopush-gkehub.sandbox.googleapis.com", vec![memberships()])
                .with_endpoint(EndpointOverride::new(
                    "gkehub",
                    "https://autopush-gkehub.sandbox.googleapis.com/",
                )),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(catalog: &Catalog, label: &str, scope: ScopeKind) -> usize {
        catalog
            .specs()
            .position(|(_, s)| s.label() == label && s.scope == scope)
            .unwrap_or_else(|| panic!("{label} ({scope:?}) not in catalog"))
    }

    #[test]
    fn test_gcp_catalog_is_valid() {
        let catalog = Catalog::gcp();
        assert_eq!(catalog.validate(), Ok(()));
        assert_eq!(catalog.apis().count(), 8);
    }

    #[test]
    fn test_subnets_before_networks() {
        let catalog = Catalog::gcp();
        assert!(
            position(&catalog, "compute networks subnets", ScopeKind::Region)
                < position(&catalog, "compute networks", ScopeKind::None),
            "Subnetworks must be deleted before their network"
        );
    }

    #[test]
    fn test_instances_before_disks_and_templates() {
        let catalog = Catalog::gcp();
        let instances = position(&catalog, "compute instances", ScopeKind::Zone);
        assert!(instances < position(&catalog, "compute disks", ScopeKind::Zone));
        assert!(
            position(&catalog, "compute instance-groups", ScopeKind::Zone)
                < position(&catalog, "compute instance-templates", ScopeKind::Global)
        );
    }

    #[test]
    fn test_iteration_preserves_declared_order() {
        let catalog = Catalog::new(vec![
            ApiResources::new(
                "b.googleapis.com",
                vec![ResourceSpec::new("b", "second"), ResourceSpec::new("b", "first")],
            ),
            ApiResources::new("a.googleapis.com", vec![ResourceSpec::new("a", "third")]),
        ]);
        let labels: Vec<_> = catalog.specs().map(|(_, s)| s.label()).collect();
        assert_eq!(labels, vec!["b second", "b first", "a third"]);
    }

    #[test]
    fn test_sinks_preserve_builtin_sinks() {
        let catalog = Catalog::gcp();
        let (_, sinks) = catalog
            .specs()
            .find(|(_, s)| s.name == "sinks")
            .expect("sinks in catalog");
        assert!(sinks.is_preserved("_Default"));
        assert!(sinks.is_preserved("_Required"));
        assert!(sinks.needs_clear_all);
        assert!(!sinks.bulk_delete);
    }

    #[test]
    fn test_hub_apis_carry_endpoint_override() {
        let catalog = Catalog::gcp();
        let hubs: Vec<_> = catalog
            .apis()
            .filter(|api| api.api.contains("gkehub"))
            .collect();
        assert_eq!(hubs.len(), 3);
        for api in hubs {
            let endpoint = api.endpoint.expect("hub endpoint override");
            assert_eq!(endpoint.url, format!("https://{}/", api.api));
            assert_eq!(endpoint.env_var(), "CLOUDSDK_API_ENDPOINT_OVERRIDES_GKEHUB");
        }
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let catalog = Catalog::new(vec![ApiResources::new(
            "compute.googleapis.com",
            vec![
                ResourceSpec::new("compute", "disks").scoped(ScopeKind::Zone),
                ResourceSpec::new("compute", "disks").scoped(ScopeKind::Zone),
            ],
        )]);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DuplicateSpec { .. })
        ));

        let catalog = Catalog::new(vec![
            ApiResources::new("x.googleapis.com", vec![]),
            ApiResources::new("x.googleapis.com", vec![]),
        ]);
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::DuplicateApi("x.googleapis.com".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_inconsistent_quirks() {
        let catalog = Catalog::new(vec![ApiResources::new(
            "x.googleapis.com",
            vec![ResourceSpec::new("x", "things").scope_from_name(1)],
        )]);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::NameScopeWithoutField { .. })
        ));

        let mut spec = ResourceSpec::new("x", "things").scoped(ScopeKind::Region);
        spec.zone_filter = true;
        let catalog = Catalog::new(vec![ApiResources::new("x.googleapis.com", vec![spec])]);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::ZoneFilterWithoutZone { .. })
        ));

        let catalog = Catalog::new(vec![ApiResources::new(
            "x.googleapis.com",
            vec![ResourceSpec::new("x", "things").preserve(&[""])],
        )]);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EmptyPreservedName { .. })
        ));
    }
}
