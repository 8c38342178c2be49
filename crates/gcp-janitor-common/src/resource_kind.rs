//! Resource kind descriptions and their per-kind deletion behaviour
//!
//! Every kind of cloud resource the janitor knows about is described by a
//! [`ResourceSpec`]. All the ways kinds differ from one another (scoping,
//! managed/unmanaged split, bulk delete support, naming quirks) are fields on
//! the spec so the sweep engine never branches on kind names.

use std::fmt;

/// Dimension that segments instances of a resource kind for deletion targeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Project-wide kind, no scope flag on delete
    None,
    /// Zonal kind, deleted with `--zone=<zone>`
    Zone,
    /// Regional kind, deleted with `--region=<region>`
    Region,
    /// Global variant of a kind that also has zonal/regional variants
    Global,
}

impl ScopeKind {
    /// Name of the listed field carrying the scope (`zone` / `region`)
    pub fn field(self) -> Option<&'static str> {
        match self {
            ScopeKind::Zone => Some("zone"),
            ScopeKind::Region => Some("region"),
            ScopeKind::None | ScopeKind::Global => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::None => "none",
            ScopeKind::Zone => "zone",
            ScopeKind::Region => "region",
            ScopeKind::Global => "global",
        }
    }
}

/// Managed/unmanaged constraint for kinds with that split (instance groups)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedFilter {
    Any,
    Managed,
    Unmanaged,
}

impl ManagedFilter {
    /// The `isManaged` value an item must carry to match, if constrained
    pub fn required(self) -> Option<bool> {
        match self {
            ManagedFilter::Any => None,
            ManagedFilter::Managed => Some(true),
            ManagedFilter::Unmanaged => Some(false),
        }
    }

    /// Subcommand inserted before `delete` for constrained kinds
    pub fn delete_subcommand(self) -> Option<&'static str> {
        match self {
            ManagedFilter::Any => None,
            ManagedFilter::Managed => Some("managed"),
            ManagedFilter::Unmanaged => Some("unmanaged"),
        }
    }
}

/// Immutable description of one resource kind in the catalog.
///
/// Built with `const` constructors so the catalog can live in a `static`:
///
/// ```
/// use gcp_janitor_common::{ResourceSpec, ScopeKind};
///
/// const DISKS: ResourceSpec = ResourceSpec::new("compute", "disks").scoped(ScopeKind::Zone);
/// assert_eq!(DISKS.label(), "compute disks");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Release track (`alpha`, `beta`), `None` for the default track
    pub api_version: Option<&'static str>,
    pub group: &'static str,
    pub name: &'static str,
    pub subgroup: Option<&'static str>,
    pub scope: ScopeKind,
    pub managed: ManagedFilter,
    /// Listing failures are swallowed and deletion failures are not counted
    pub tolerate: bool,
    /// The delete command accepts more than one name per call
    pub bulk_delete: bool,
    /// Names never deleted regardless of age or mode
    pub preserved_names: &'static [&'static str],
    /// Zone-scoped listing accepts a `zone:( ... )` filter
    pub zone_filter: bool,
    /// Positional `/`-segment of the item name that carries the scope value
    pub scope_from_name: Option<usize>,
    /// Pass `--force` on delete
    pub force_delete: bool,
    /// Kind has no creation timestamp, only swept in clear-all mode
    pub needs_clear_all: bool,
}

impl ResourceSpec {
    pub const fn new(group: &'static str, name: &'static str) -> Self {
        Self {
            api_version: None,
            group,
            name,
            subgroup: None,
            scope: ScopeKind::None,
            managed: ManagedFilter::Any,
            tolerate: false,
            bulk_delete: true,
            preserved_names: &[],
            zone_filter: false,
            scope_from_name: None,
            force_delete: false,
            needs_clear_all: false,
        }
    }

    pub const fn api_version(mut self, version: &'static str) -> Self {
        self.api_version = Some(version);
        self
    }

    pub const fn subgroup(mut self, subgroup: &'static str) -> Self {
        self.subgroup = Some(subgroup);
        self
    }

    /// Set the scope. Zone scoping enables the zone listing filter by default.
    pub const fn scoped(mut self, scope: ScopeKind) -> Self {
        self.scope = scope;
        self.zone_filter = matches!(scope, ScopeKind::Zone);
        self
    }

    pub const fn managed(mut self, managed: ManagedFilter) -> Self {
        self.managed = managed;
        self
    }

    pub const fn tolerate(mut self) -> Self {
        self.tolerate = true;
        self
    }

    pub const fn single_delete(mut self) -> Self {
        self.bulk_delete = false;
        self
    }

    pub const fn preserve(mut self, names: &'static [&'static str]) -> Self {
        self.preserved_names = names;
        self
    }

    pub const fn without_zone_filter(mut self) -> Self {
        self.zone_filter = false;
        self
    }

    pub const fn scope_from_name(mut self, segment: usize) -> Self {
        self.scope_from_name = Some(segment);
        self
    }

    pub const fn force_delete(mut self) -> Self {
        self.force_delete = true;
        self
    }

    pub const fn needs_clear_all(mut self) -> Self {
        self.needs_clear_all = true;
        self
    }

    /// Human-readable kind label for logs, e.g. `compute sole-tenancy node-groups`
    pub fn label(&self) -> String {
        match self.subgroup {
            Some(sub) => format!("{} {} {}", self.group, self.name, sub),
            None => format!("{} {}", self.group, self.name),
        }
    }

    /// Command words after the binary: `[version] group -q name [subgroup]`
    pub fn command_prefix(&self) -> Vec<String> {
        let mut words = Vec::with_capacity(5);
        if let Some(version) = self.api_version {
            words.push(version.to_string());
        }
        words.push(self.group.to_string());
        words.push("-q".to_string());
        words.push(self.name.to_string());
        if let Some(sub) = self.subgroup {
            words.push(sub.to_string());
        }
        words
    }

    pub fn is_preserved(&self, name: &str) -> bool {
        self.preserved_names.contains(&name)
    }

    /// Batch size actually used for deletion calls of this kind
    pub fn effective_batch_size(&self, configured: usize) -> usize {
        if self.bulk_delete {
            configured.max(1)
        } else {
            1
        }
    }

    /// Extra flags appended to every delete call
    pub fn delete_flags(&self) -> Vec<String> {
        if self.force_delete {
            vec!["--force".to_string()]
        } else {
            Vec::new()
        }
    }
}

impl fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        if self.scope != ScopeKind::None {
            write!(f, " ({})", self.scope.as_str())?;
        }
        if let Some(sub) = self.managed.delete_subcommand() {
            write!(f, " [{}]", sub)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_prefix_with_subgroup() {
        let spec = ResourceSpec::new("compute", "sole-tenancy").subgroup("node-groups");
        assert_eq!(
            spec.command_prefix(),
            vec!["compute", "-q", "sole-tenancy", "node-groups"]
        );
    }

    #[test]
    fn test_command_prefix_with_api_version() {
        let spec = ResourceSpec::new("container", "hub")
            .api_version("alpha")
            .subgroup("memberships");
        assert_eq!(
            spec.command_prefix(),
            vec!["alpha", "container", "-q", "hub", "memberships"]
        );
    }

    #[test]
    fn test_zone_scope_enables_zone_filter() {
        assert!(ResourceSpec::new("compute", "disks").scoped(ScopeKind::Zone).zone_filter);
        assert!(!ResourceSpec::new("compute", "disks").scoped(ScopeKind::Region).zone_filter);
        assert!(
            !ResourceSpec::new("compute", "network-endpoint-groups")
                .scoped(ScopeKind::Zone)
                .without_zone_filter()
                .zone_filter
        );
    }

    #[test]
    fn test_effective_batch_size() {
        let bulk = ResourceSpec::new("compute", "routes");
        assert_eq!(bulk.effective_batch_size(50), 50);
        assert_eq!(bulk.effective_batch_size(0), 1);

        let single = ResourceSpec::new("logging", "sinks").single_delete();
        assert_eq!(single.effective_batch_size(50), 1);
    }

    #[test]
    fn test_managed_filter() {
        assert_eq!(ManagedFilter::Any.required(), None);
        assert_eq!(ManagedFilter::Managed.required(), Some(true));
        assert_eq!(ManagedFilter::Unmanaged.required(), Some(false));
        assert_eq!(ManagedFilter::Unmanaged.delete_subcommand(), Some("unmanaged"));
    }

    #[test]
    fn test_preserved_and_flags() {
        let spec = ResourceSpec::new("filestore", "instances")
            .force_delete()
            .preserve(&["keep-me"]);
        assert!(spec.is_preserved("keep-me"));
        assert!(!spec.is_preserved("other"));
        assert_eq!(spec.delete_flags(), vec!["--force"]);
    }

    #[test]
    fn test_display() {
        let spec = ResourceSpec::new("compute", "instance-groups")
            .scoped(ScopeKind::Zone)
            .managed(ManagedFilter::Managed);
        assert_eq!(spec.to_string(), "compute instance-groups (zone) [managed]");
    }
}
