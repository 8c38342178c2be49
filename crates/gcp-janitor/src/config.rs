//! Configuration types for a sweep run

use chrono::{DateTime, Duration, Utc};
use gcp_janitor_common::defaults::{
    BASE_ZONES, DEFAULT_BATCH_SIZE, DEFAULT_FILTER, DEFAULT_WORKERS,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Project must not be empty")]
    EmptyProject,

    #[error("Either --days or --hours must be set")]
    MissingAge,

    #[error("Invalid --hours value {0}: must be a finite, non-negative number")]
    InvalidHours(f64),

    #[error("Age of {days} days and {hours} hours is out of range")]
    AgeOutOfRange { days: u32, hours: f64 },

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Worker pool size must be at least 1")]
    InvalidWorkers,

    #[error("Zone set must not be empty")]
    NoZones,
}

/// Which resources are old enough to delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeCutoff {
    /// Every resource is in scope regardless of age
    ClearAll,
    /// Resources created strictly before this instant are in scope
    Before(DateTime<Utc>),
}

impl AgeCutoff {
    /// Cutoff for a maximum age of `days` + `hours` measured back from `now`.
    ///
    /// A zero age means clear-all.
    pub fn from_max_age(now: DateTime<Utc>, days: u32, hours: f64) -> Result<Self, ConfigError> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(ConfigError::InvalidHours(hours));
        }
        if days == 0 && hours == 0.0 {
            return Ok(AgeCutoff::ClearAll);
        }

        let out_of_range = || ConfigError::AgeOutOfRange { days, hours };
        let millis = (hours * 3_600_000.0).round();
        if millis > i64::MAX as f64 {
            return Err(out_of_range());
        }
        let age = Duration::try_days(i64::from(days))
            .zip(Duration::try_milliseconds(millis as i64))
            .and_then(|(d, h)| d.checked_add(&h))
            .ok_or_else(out_of_range)?;
        now.checked_sub_signed(age)
            .map(AgeCutoff::Before)
            .ok_or_else(out_of_range)
    }

    pub fn is_clear_all(&self) -> bool {
        matches!(self, AgeCutoff::ClearAll)
    }

    /// Whether a resource created at `created` is old enough
    pub fn includes(&self, created: DateTime<Utc>) -> bool {
        match self {
            AgeCutoff::ClearAll => true,
            AgeCutoff::Before(cutoff) => created < *cutoff,
        }
    }
}

/// Parameters shared by every component of one run. Never mutated once the
/// run starts.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub project: String,
    pub cutoff: AgeCutoff,
    /// Listing filter applied to every list call
    pub filter: String,
    /// Max names per deletion call
    pub batch_size: usize,
    /// Max deletion calls in flight
    pub workers: usize,
    /// Zones pushed into zone-scoped listings
    pub zones: Vec<String>,
    pub dry_run: bool,
}

impl RunContext {
    /// Context with the default filter, batch size, worker count and zone set
    pub fn new(project: impl Into<String>, cutoff: AgeCutoff) -> Self {
        Self {
            project: project.into(),
            cutoff,
            filter: DEFAULT_FILTER.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            zones: BASE_ZONES.iter().map(|z| z.to_string()).collect(),
            dry_run: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.trim().is_empty() {
            return Err(ConfigError::EmptyProject);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        Ok(())
    }
}
