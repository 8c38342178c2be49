//! gcp-janitor: sweeps stale resources out of a cloud project
//!
//! Lists every resource kind in the catalog, deletes those older than the
//! given age (or everything, with `--days=0 --hours=0`) and exits non-zero
//! if any non-tolerated failure happened.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use gcp_janitor::cloud::{GcloudClient, GcloudConfig};
use gcp_janitor::{AgeCutoff, ConfigError, Janitor, RunContext};
use gcp_janitor_common::Catalog;
use gcp_janitor_common::defaults::{
    DEFAULT_BATCH_SIZE, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_FILTER, DEFAULT_GCLOUD_BINARY,
    DEFAULT_WORKERS, merge_zones,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gcp-janitor")]
#[command(about = "Clean up stale resources from a cloud project")]
#[command(version)]
struct Args {
    /// Project to clean
    #[arg(long)]
    project: String,

    /// Clean items more than --days old (added to --hours)
    #[arg(long)]
    days: Option<u32>,

    /// Clean items more than --hours old (added to --days)
    #[arg(long)]
    hours: Option<f64>,

    /// Filter down to these instances
    #[arg(long, default_value = DEFAULT_FILTER)]
    filter: String,

    /// List but do not delete resources
    #[arg(long, alias = "dry-run")]
    dryrun: bool,

    /// Max number of resources to delete in one call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    ratelimit: usize,

    /// Max deletion calls in flight
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Debug logging
    #[arg(long)]
    verbose: bool,

    /// Service account key file to activate before sweeping
    #[arg(long, alias = "service_account", env = "GOOGLE_APPLICATION_CREDENTIALS")]
    service_account: Option<PathBuf>,

    /// Additional zones to clean up, on top of the built-in list
    #[arg(long, alias = "additional_zones", num_args = 0.., value_delimiter = ',')]
    additional_zones: Vec<String>,

    /// Use the project being cleaned as the billing quota project
    #[arg(long, alias = "set_as_quota_project")]
    set_as_quota_project: bool,

    /// Timeout for a single gcloud call, in seconds
    #[arg(long, default_value_t = DEFAULT_CALL_TIMEOUT_SECS)]
    call_timeout_secs: u64,

    /// gcloud binary to run
    #[arg(long, default_value = DEFAULT_GCLOUD_BINARY)]
    gcloud: PathBuf,
}

impl Args {
    fn run_context(&self, now: DateTime<Utc>) -> Result<RunContext, ConfigError> {
        if self.days.is_none() && self.hours.is_none() {
            return Err(ConfigError::MissingAge);
        }
        let cutoff =
            AgeCutoff::from_max_age(now, self.days.unwrap_or(0), self.hours.unwrap_or(0.0))?;

        let ctx = RunContext {
            filter: self.filter.clone(),
            batch_size: self.ratelimit,
            workers: self.workers,
            zones: merge_zones(&self.additional_zones),
            dry_run: self.dryrun,
            ..RunContext::new(self.project.clone(), cutoff)
        };
        ctx.validate()?;
        Ok(ctx)
    }

    fn gcloud_config(&self) -> GcloudConfig {
        GcloudConfig {
            binary: self.gcloud.clone(),
            quota_project: self.set_as_quota_project.then(|| self.project.clone()),
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;
    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

async fn run() -> Result<i32> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let ctx = args
        .run_context(Utc::now())
        .context("Invalid run configuration")?;
    let catalog = Catalog::gcp();
    catalog.validate().context("Invalid resource catalog")?;

    let client = GcloudClient::new(args.gcloud_config());
    if let Some(key_file) = &args.service_account {
        client
            .activate_service_account(key_file)
            .await
            .with_context(|| {
                format!("Failed to activate service account {}", key_file.display())
            })?;
    }
    if let Some(quota) = &client.config().quota_project {
        info!(project = %quota, "Using quota project");
    }

    info!(project = %ctx.project, "Starting janitor");
    let report = Janitor::new(&client, &ctx, &catalog).run().await;
    report.log_summary();
    info!(
        project = %ctx.project,
        status = report.exit_code(),
        "Finished janitor"
    );
    Ok(report.exit_code())
}
