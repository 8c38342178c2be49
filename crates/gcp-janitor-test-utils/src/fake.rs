//! In-memory cloud for driving the sweep engine in tests
//!
//! Listings are keyed by the spec's display form (`compute disks (zone)`),
//! failures are injected per kind, API, endpoint or cluster, and every call
//! is recorded in order so tests can assert on what was dispatched.

use gcp_janitor::cloud::{
    CloudError, CloudOperations, CloudResult, ClusterRecord, ClusterTarget, DeleteRequest,
    ListRequest, ListedItem, Subnet, SubnetRanges, SubnetRecord,
};
use gcp_janitor_common::{EndpointOverride, ResourceSpec};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One call observed by [`FakeCloud`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List {
        kind: String,
        filter: String,
        endpoint: Option<&'static str>,
    },
    Delete(DeleteRequest),
    /// A resource delete call returned (after the delete delay)
    DeleteDone(DeleteRequest),
    ApiCheck(String),
    ListSubnets,
    DescribeSubnet(String),
    UpdateSubnet { subnet: String, ranges: Vec<String> },
    ListClusters { endpoint: &'static str },
    DeleteCluster {
        endpoint: &'static str,
        cluster: ClusterTarget,
    },
}

#[derive(Default)]
struct State {
    listings: HashMap<String, Vec<ListedItem>>,
    list_failures: HashSet<String>,
    delete_failures: HashSet<String>,
    disabled_apis: HashSet<String>,
    api_check_failures: HashSet<String>,
    subnets: Vec<SubnetRecord>,
    subnet_ranges: HashMap<String, SubnetRanges>,
    subnet_list_fails: bool,
    clusters: HashMap<&'static str, Vec<ClusterRecord>>,
    unreachable: HashSet<&'static str>,
    cluster_delete_failures: HashSet<String>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<State>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delete_delay: Duration,
}

fn injected(command: &str) -> CloudError {
    CloudError::failed(command, Some(1), "injected failure")
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold every delete call open for `delay` so overlapping calls are observable
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = delay;
        self
    }

    pub fn with_items(self, spec: &ResourceSpec, items: Vec<ListedItem>) -> Self {
        self.state().listings.insert(spec.to_string(), items);
        self
    }

    pub fn failing_list(self, spec: &ResourceSpec) -> Self {
        self.state().list_failures.insert(spec.to_string());
        self
    }

    pub fn failing_delete(self, spec: &ResourceSpec) -> Self {
        self.state().delete_failures.insert(spec.to_string());
        self
    }

    pub fn disabled_api(self, api: &str) -> Self {
        self.state().disabled_apis.insert(api.to_string());
        self
    }

    pub fn failing_api_check(self, api: &str) -> Self {
        self.state().api_check_failures.insert(api.to_string());
        self
    }

    pub fn with_subnets(self, subnets: Vec<SubnetRecord>) -> Self {
        self.state().subnets = subnets;
        self
    }

    pub fn with_subnet_ranges(self, subnet: &str, ranges: SubnetRanges) -> Self {
        self.state()
            .subnet_ranges
            .insert(subnet.to_string(), ranges);
        self
    }

    pub fn failing_subnet_list(self) -> Self {
        self.state().subnet_list_fails = true;
        self
    }

    pub fn with_clusters(self, endpoint_url: &'static str, clusters: Vec<ClusterRecord>) -> Self {
        self.state().clusters.insert(endpoint_url, clusters);
        self
    }

    pub fn unreachable_endpoint(self, endpoint_url: &'static str) -> Self {
        self.state().unreachable.insert(endpoint_url);
        self
    }

    pub fn failing_cluster_delete(self, name: &str) -> Self {
        self.state()
            .cluster_delete_failures
            .insert(name.to_string());
        self
    }

    /// Every call, in the order it was made
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn deletes(&self) -> Vec<DeleteRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Kinds listed, in order
    pub fn listed_kinds(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List { kind, .. } => Some(kind),
                _ => None,
            })
            .collect()
    }

    /// Highest number of delete calls (resource or cluster) ever in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }

    async fn hold_slot(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delete_delay.is_zero() {
            tokio::time::sleep(self.delete_delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CloudOperations for FakeCloud {
    async fn list_resources(&self, request: &ListRequest<'_>) -> CloudResult<Vec<ListedItem>> {
        let kind = request.spec.to_string();
        let mut state = self.state();
        state.calls.push(Call::List {
            kind: kind.clone(),
            filter: request.effective_filter(),
            endpoint: request.endpoint.map(|e| e.url),
        });
        if state.list_failures.contains(&kind) {
            return Err(injected(&format!("list {}", kind)));
        }
        Ok(state.listings.get(&kind).cloned().unwrap_or_default())
    }

    async fn delete_resources(&self, request: &DeleteRequest) -> CloudResult<()> {
        self.record(Call::Delete(request.clone()));
        self.hold_slot().await;
        self.record(Call::DeleteDone(request.clone()));
        if self.state().delete_failures.contains(&request.spec.to_string()) {
            return Err(injected(&format!("delete {}", request)));
        }
        Ok(())
    }

    async fn is_api_enabled(&self, _project: &str, api: &str) -> CloudResult<bool> {
        let mut state = self.state();
        state.calls.push(Call::ApiCheck(api.to_string()));
        if state.api_check_failures.contains(api) {
            return Err(injected(&format!("services list {}", api)));
        }
        Ok(!state.disabled_apis.contains(api))
    }

    async fn list_subnets(&self, _project: &str, _filter: &str) -> CloudResult<Vec<SubnetRecord>> {
        let mut state = self.state();
        state.calls.push(Call::ListSubnets);
        if state.subnet_list_fails {
            return Err(injected("subnets list"));
        }
        Ok(state.subnets.clone())
    }

    async fn describe_subnet_ranges(
        &self,
        _project: &str,
        subnet: &Subnet,
    ) -> CloudResult<SubnetRanges> {
        let mut state = self.state();
        state.calls.push(Call::DescribeSubnet(subnet.name.clone()));
        state
            .subnet_ranges
            .get(&subnet.name)
            .cloned()
            .ok_or_else(|| injected(&format!("subnets describe {}", subnet.name)))
    }

    async fn update_subnet_ranges(
        &self,
        _project: &str,
        subnet: &Subnet,
        ranges: &[String],
    ) -> CloudResult<()> {
        self.record(Call::UpdateSubnet {
            subnet: subnet.name.clone(),
            ranges: ranges.to_vec(),
        });
        Ok(())
    }

    async fn list_clusters(
        &self,
        endpoint: &EndpointOverride,
        _project: &str,
        _filter: &str,
    ) -> CloudResult<Vec<ClusterRecord>> {
        let mut state = self.state();
        state.calls.push(Call::ListClusters {
            endpoint: endpoint.url,
        });
        if state.unreachable.contains(endpoint.url) {
            return Err(injected(&format!("clusters list @ {}", endpoint.url)));
        }
        Ok(state.clusters.get(endpoint.url).cloned().unwrap_or_default())
    }

    async fn delete_cluster(
        &self,
        endpoint: &EndpointOverride,
        _project: &str,
        cluster: &ClusterTarget,
    ) -> CloudResult<()> {
        self.record(Call::DeleteCluster {
            endpoint: endpoint.url,
            cluster: cluster.clone(),
        });
        self.hold_slot().await;
        if self.state().cluster_delete_failures.contains(&cluster.name) {
            return Err(injected(&format!("clusters delete {}", cluster)));
        }
        Ok(())
    }
}
