//! Batched, bounded-concurrency deletion
//!
//! Every group of a spec is cut into chunks of at most `batch_size` names.
//! All chunks are dispatched on one bounded pool of `workers` in-flight
//! calls and the deleter returns only after the last one finishes.

use super::grouper::DeletionGroups;
use crate::cloud::{CloudError, CloudOperations, DeleteRequest, DeleteScope};
use crate::config::RunContext;
use futures::stream::{self, StreamExt};
use gcp_janitor_common::{EndpointOverride, ResourceSpec, ScopeKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info};

/// One failed deletion call
#[derive(Debug)]
pub struct DeletionFailure {
    /// What the call was trying to delete
    pub target: String,
    pub error: CloudError,
}

/// Failures collected by concurrently running deletion calls
#[derive(Debug, Default)]
pub struct ErrorSink {
    failures: Mutex<Vec<DeletionFailure>>,
}

impl ErrorSink {
    pub fn record(&self, target: impl Into<String>, error: CloudError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DeletionFailure {
                target: target.into(),
                error,
            });
    }

    pub fn len(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_failures(self) -> Vec<DeletionFailure> {
        self.failures
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of deleting every group of one spec
#[derive(Debug, Default)]
pub struct DeletionOutcome {
    /// Calls issued (or logged, in dry run)
    pub calls: usize,
    /// Names in calls that succeeded (or would have been sent, in dry run)
    pub deleted: usize,
    pub failures: Vec<DeletionFailure>,
    /// Failed calls of a tolerant spec, reported but never counted
    pub tolerated: usize,
}

impl DeletionOutcome {
    pub fn is_failed(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Split `names` into consecutive chunks of `batch_size` (last may be shorter)
pub fn chunk_names(names: &[String], batch_size: usize) -> Vec<Vec<String>> {
    names
        .chunks(batch_size.max(1))
        .map(<[String]>::to_vec)
        .collect()
}

pub fn delete_scope(spec: &ResourceSpec, scope_value: &str) -> DeleteScope {
    match spec.scope {
        ScopeKind::None => DeleteScope::None,
        ScopeKind::Global => DeleteScope::Global,
        ScopeKind::Zone if !scope_value.is_empty() => DeleteScope::Zone(scope_value.to_string()),
        ScopeKind::Region if !scope_value.is_empty() => {
            DeleteScope::Region(scope_value.to_string())
        }
        ScopeKind::Zone | ScopeKind::Region => DeleteScope::None,
    }
}

/// Build every deletion call for a spec's groups, in group then chunk order
pub fn plan_requests(
    spec: &ResourceSpec,
    groups: &DeletionGroups,
    project: &str,
    batch_size: usize,
    endpoint: Option<EndpointOverride>,
) -> Vec<DeleteRequest> {
    let batch_size = spec.effective_batch_size(batch_size);
    groups
        .iter()
        .flat_map(|(scope_value, names)| {
            let scope = delete_scope(spec, scope_value);
            chunk_names(names, batch_size)
                .into_iter()
                .map(move |chunk| DeleteRequest {
                    spec: *spec,
                    project: project.to_string(),
                    names: chunk,
                    scope: scope.clone(),
                    endpoint,
                })
        })
        .collect()
}

pub struct BatchDeleter<'a, C> {
    client: &'a C,
    batch_size: usize,
    workers: usize,
    dry_run: bool,
}

impl<'a, C: CloudOperations> BatchDeleter<'a, C> {
    pub fn new(client: &'a C, ctx: &RunContext) -> Self {
        Self {
            client,
            batch_size: ctx.batch_size,
            workers: ctx.workers.max(1),
            dry_run: ctx.dry_run,
        }
    }

    /// Delete every group of `spec`, returning once all calls have finished
    pub async fn delete(
        &self,
        spec: &ResourceSpec,
        groups: &DeletionGroups,
        project: &str,
        endpoint: Option<EndpointOverride>,
    ) -> DeletionOutcome {
        let requests = plan_requests(spec, groups, project, self.batch_size, endpoint);
        if requests.is_empty() {
            return DeletionOutcome::default();
        }

        info!(
            kind = %spec,
            project = %project,
            names = requests.iter().map(|r| r.names.len()).sum::<usize>(),
            calls = requests.len(),
            "Deleting resources"
        );

        if self.dry_run {
            for request in &requests {
                info!(request = %request, "[dry run] Would delete");
            }
            return DeletionOutcome {
                calls: requests.len(),
                deleted: requests.iter().map(|r| r.names.len()).sum(),
                ..DeletionOutcome::default()
            };
        }

        let sink = ErrorSink::default();
        let deleted = AtomicUsize::new(0);
        let tolerated = AtomicUsize::new(0);

        stream::iter(&requests)
            .map(|request| self.dispatch(request, &sink, &deleted, &tolerated))
            .buffer_unordered(self.workers)
            .collect::<Vec<()>>()
            .await;

        DeletionOutcome {
            calls: requests.len(),
            deleted: deleted.into_inner(),
            failures: sink.into_failures(),
            tolerated: tolerated.into_inner(),
        }
    }

    async fn dispatch(
        &self,
        request: &DeleteRequest,
        sink: &ErrorSink,
        deleted: &AtomicUsize,
        tolerated: &AtomicUsize,
    ) {
        debug!(request = %request, "Dispatching delete");
        match self.client.delete_resources(request).await {
            Ok(()) => {
                deleted.fetch_add(request.names.len(), Ordering::Relaxed);
                debug!(request = %request, "Deleted");
            }
            Err(e) => {
                error!(
                    kind = %request.spec,
                    project = %request.project,
                    names = ?request.names,
                    tolerated = request.spec.tolerate,
                    error = %e,
                    "Failed to delete resources"
                );
                if request.spec.tolerate {
                    tolerated.fetch_add(1, Ordering::Relaxed);
                } else {
                    sink.record(request.to_string(), e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("i{}", i)).collect()
    }

    #[test]
    fn test_five_items_batch_two() {
        let spec = ResourceSpec::new("compute", "instances").scoped(ScopeKind::Zone);
        let groups = DeletionGroups::from([("us-central1-a".to_string(), names(5))]);
        let requests = plan_requests(&spec, &groups, "p", 2, None);
        let chunks: Vec<_> = requests.iter().map(|r| r.names.clone()).collect();
        assert_eq!(
            chunks,
            vec![vec!["i1", "i2"], vec!["i3", "i4"], vec!["i5"]]
        );
        assert!(
            requests
                .iter()
                .all(|r| r.scope == DeleteScope::Zone("us-central1-a".to_string()))
        );
    }

    #[test]
    fn test_non_bulk_chunks_at_one() {
        let spec = ResourceSpec::new("logging", "sinks").single_delete();
        let groups = DeletionGroups::from([(String::new(), names(3))]);
        let requests = plan_requests(&spec, &groups, "p", 50, None);
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.names.len() == 1));
        assert!(requests.iter().all(|r| r.scope == DeleteScope::None));
    }

    #[test]
    fn test_plan_carries_endpoint_and_global_flag() {
        let spec = ResourceSpec::new("compute", "url-maps").scoped(ScopeKind::Global);
        let endpoint = EndpointOverride::new("gkehub", "https://example/");
        let groups = DeletionGroups::from([(String::new(), names(1))]);
        let requests = plan_requests(&spec, &groups, "p", 50, Some(endpoint));
        assert_eq!(requests[0].scope, DeleteScope::Global);
        assert_eq!(requests[0].endpoint, Some(endpoint));
    }

    #[test]
    fn test_empty_groups_plan_nothing() {
        let spec = ResourceSpec::new("compute", "routes");
        assert!(plan_requests(&spec, &DeletionGroups::new(), "p", 50, None).is_empty());
    }

    #[test]
    fn test_error_sink() {
        let sink = ErrorSink::default();
        assert!(sink.is_empty());
        sink.record("compute disks [a]", CloudError::failed("gcloud", Some(1), "x"));
        assert_eq!(sink.len(), 1);
        let failures = sink.into_failures();
        assert_eq!(failures[0].target, "compute disks [a]");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Chunking yields ceil(N/k) chunks of size k (last may be shorter)
            /// that concatenate back to the input
            #[test]
            fn chunking_preserves_names(n in 0usize..300, k in 1usize..60) {
                let input = names(n);
                let chunks = chunk_names(&input, k);
                prop_assert_eq!(chunks.len(), n.div_ceil(k));
                if let Some((last, rest)) = chunks.split_last() {
                    prop_assert!(rest.iter().all(|c| c.len() == k));
                    prop_assert!(!last.is_empty() && last.len() <= k);
                }
                let rejoined: Vec<String> = chunks.into_iter().flatten().collect();
                prop_assert_eq!(rejoined, input);
            }

            /// Non-bulk specs never send more than one name per call
            #[test]
            fn non_bulk_always_single(n in 0usize..100, k in 1usize..100) {
                let spec = ResourceSpec::new("logging", "sinks").single_delete();
                let groups = DeletionGroups::from([(String::new(), names(n))]);
                let requests = plan_requests(&spec, &groups, "p", k, None);
                prop_assert_eq!(requests.len(), n);
                prop_assert!(requests.iter().all(|r| r.names.len() == 1));
            }
        }
    }
}
