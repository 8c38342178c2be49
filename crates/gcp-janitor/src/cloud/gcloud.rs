//! `gcloud` command-line client
//!
//! Each call runs one `gcloud` child process. Per-call environment (endpoint
//! overrides, quota project) is set on that child only, so concurrent calls
//! never see each other's settings.

use super::command::{Invocation, run_command};
use super::error::{CloudError, CloudResult};
use super::types::{
    ClusterRecord, ClusterTarget, DeleteRequest, ListRequest, ListedItem, Subnet, SubnetRanges,
    SubnetRecord,
};
use gcp_janitor_common::EndpointOverride;
use gcp_janitor_common::defaults::{DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_GCLOUD_BINARY};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const LIST_FORMAT: &str = "--format=json(name,creationTimestamp.date(tz=UTC),createTime.date(tz=UTC),zone,region,isManaged)";
const QUOTA_PROJECT_ENV: &str = "CLOUDSDK_BILLING_QUOTA_PROJECT";

#[derive(Debug, Clone)]
pub struct GcloudConfig {
    /// Path or name of the `gcloud` binary
    pub binary: PathBuf,
    /// Billing quota project exported to every child process
    pub quota_project: Option<String>,
    /// Upper bound on a single call
    pub call_timeout: Duration,
}

impl Default for GcloudConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_GCLOUD_BINARY),
            quota_project: None,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

/// Outcome of an API enablement query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiState {
    Enabled,
    Disabled,
    Unexpected(String),
}

impl ApiState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => ApiState::Disabled,
            "ENABLED" => ApiState::Enabled,
            other => ApiState::Unexpected(other.to_string()),
        }
    }
}

pub struct GcloudClient {
    config: GcloudConfig,
}

impl GcloudClient {
    pub fn new(config: GcloudConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GcloudConfig {
        &self.config
    }

    fn invocation(&self, args: Vec<String>, endpoint: Option<&EndpointOverride>) -> Invocation {
        let mut invocation = Invocation::new(args);
        if let Some(project) = &self.config.quota_project {
            invocation = invocation.env(QUOTA_PROJECT_ENV, project.as_str());
        }
        if let Some(endpoint) = endpoint {
            invocation = invocation.env(endpoint.env_var(), endpoint.url);
        }
        invocation
    }

    async fn run(
        &self,
        args: Vec<String>,
        endpoint: Option<&EndpointOverride>,
    ) -> CloudResult<String> {
        let invocation = self.invocation(args, endpoint);
        run_command(&self.config.binary, &invocation, self.config.call_timeout).await
    }

    async fn run_json<T>(
        &self,
        args: Vec<String>,
        endpoint: Option<&EndpointOverride>,
    ) -> CloudResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let command = Invocation::new(args.clone()).display(&self.config.binary);
        let stdout = self.run(args, endpoint).await?;
        parse_json(&command, &stdout)
    }

    pub async fn list_resources(&self, request: &ListRequest<'_>) -> CloudResult<Vec<ListedItem>> {
        self.run_json(list_args(request), request.endpoint.as_ref())
            .await
    }

    pub async fn delete_resources(&self, request: &DeleteRequest) -> CloudResult<()> {
        self.run(delete_args(request), request.endpoint.as_ref())
            .await
            .map(|_| ())
    }

    pub async fn is_api_enabled(&self, project: &str, api: &str) -> CloudResult<bool> {
        debug!(api = %api, "Checking whether API is enabled");
        let stdout = self.run(api_state_args(project, api), None).await?;
        match ApiState::parse(&stdout) {
            ApiState::Enabled => Ok(true),
            ApiState::Disabled => Ok(false),
            ApiState::Unexpected(state) => {
                warn!(api = %api, state = %state, "Unexpected API state, treating as disabled");
                Ok(false)
            }
        }
    }

    pub async fn list_subnets(&self, project: &str, filter: &str) -> CloudResult<Vec<SubnetRecord>> {
        let args = vec![
            "compute".to_string(),
            "networks".to_string(),
            "subnets".to_string(),
            "list".to_string(),
            format!("--project={}", project),
            format!("--filter={}", filter),
            "--format=json(name,region)".to_string(),
        ];
        self.run_json(args, None).await
    }

    pub async fn describe_subnet_ranges(
        &self,
        project: &str,
        subnet: &Subnet,
    ) -> CloudResult<SubnetRanges> {
        let args = vec![
            "compute".to_string(),
            "networks".to_string(),
            "subnets".to_string(),
            "describe".to_string(),
            subnet.name.clone(),
            format!("--project={}", project),
            format!("--region={}", subnet.region),
            "--format=json(secondaryIpRanges)".to_string(),
        ];
        self.run_json(args, None).await
    }

    pub async fn update_subnet_ranges(
        &self,
        project: &str,
        subnet: &Subnet,
        ranges: &[String],
    ) -> CloudResult<()> {
        let args = vec![
            "compute".to_string(),
            "networks".to_string(),
            "subnets".to_string(),
            "update".to_string(),
            subnet.name.clone(),
            format!("--project={}", project),
            format!("--region={}", subnet.region),
            format!("--remove-secondary-ranges={}", ranges.join(",")),
            "--quiet".to_string(),
        ];
        self.run(args, None).await.map(|_| ())
    }

    pub async fn list_clusters(
        &self,
        endpoint: &EndpointOverride,
        project: &str,
        filter: &str,
    ) -> CloudResult<Vec<ClusterRecord>> {
        let args = vec![
            "container".to_string(),
            "-q".to_string(),
            "clusters".to_string(),
            "list".to_string(),
            format!("--project={}", project),
            format!("--filter={}", filter),
            "--format=json(name,createTime,region,zone)".to_string(),
        ];
        self.run_json(args, Some(endpoint)).await
    }

    pub async fn delete_cluster(
        &self,
        endpoint: &EndpointOverride,
        project: &str,
        cluster: &ClusterTarget,
    ) -> CloudResult<()> {
        let args = vec![
            "container".to_string(),
            "-q".to_string(),
            "clusters".to_string(),
            "delete".to_string(),
            cluster.name.clone(),
            format!("--project={}", project),
            cluster.location.flag(),
        ];
        self.run(args, Some(endpoint)).await.map(|_| ())
    }

    /// Activate a service account key for subsequent calls
    pub async fn activate_service_account(&self, key_file: &Path) -> CloudResult<()> {
        info!(key_file = %key_file.display(), "Activating service account");
        let args = vec![
            "auth".to_string(),
            "activate-service-account".to_string(),
            format!("--key-file={}", key_file.display()),
        ];
        self.run(args, None).await.map(|_| ())
    }
}

/// Parse JSON output; `gcloud` prints nothing at all for some empty results
fn parse_json<T>(command: &str, stdout: &str) -> CloudResult<T>
where
    T: DeserializeOwned + Default,
{
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(T::default());
    }
    serde_json::from_str(trimmed).map_err(|source| CloudError::Parse {
        command: command.to_string(),
        source,
    })
}

pub fn list_args(request: &ListRequest<'_>) -> Vec<String> {
    let mut args = request.spec.command_prefix();
    args.push("list".to_string());
    args.push(LIST_FORMAT.to_string());
    args.push(format!("--project={}", request.project));
    args.push(format!("--filter={}", request.effective_filter()));
    args
}

pub fn delete_args(request: &DeleteRequest) -> Vec<String> {
    let mut args = request.spec.command_prefix();
    if let Some(sub) = request.spec.managed.delete_subcommand() {
        args.push(sub.to_string());
    }
    args.push("delete".to_string());
    args.push(format!("--project={}", request.project));
    args.extend(request.names.iter().cloned());
    if let Some(flag) = request.scope.flag() {
        args.push(flag);
    }
    args.extend(request.spec.delete_flags());
    args
}

pub fn api_state_args(project: &str, api: &str) -> Vec<String> {
    vec![
        "services".to_string(),
        "-q".to_string(),
        "list".to_string(),
        format!("--project={}", project),
        format!("--filter=config.name=\"{}\"", api),
        "--format=value(state)".to_string(),
    ]
}
