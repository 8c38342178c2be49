//! Per-item scope decision

use super::error::SweepError;
use crate::config::AgeCutoff;
use chrono::{DateTime, Utc};
use gcp_janitor_common::ResourceSpec;

/// A listed item reduced to the fields the scope decision needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupCandidate {
    pub name: String,
    /// Required unless the run is clear-all
    pub created_at: Option<DateTime<Utc>>,
    pub scope_value: Option<String>,
    pub is_managed: Option<bool>,
}

impl CleanupCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: None,
            scope_value: None,
            is_managed: None,
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn managed(mut self, is_managed: bool) -> Self {
        self.is_managed = Some(is_managed);
        self
    }
}

/// Decide whether `candidate` should be deleted.
///
/// Preserved names are out of scope before anything else is looked at, so a
/// preserved item never produces a [`SweepError::MalformedItem`].
pub fn is_in_scope(
    candidate: &CleanupCandidate,
    spec: &ResourceSpec,
    cutoff: &AgeCutoff,
) -> Result<bool, SweepError> {
    if spec.is_preserved(&candidate.name) {
        return Ok(false);
    }

    if let Some(required) = spec.managed.required() {
        match candidate.is_managed {
            None => {
                return Err(SweepError::malformed(
                    spec,
                    format!("'{}' is missing isManaged", candidate.name),
                ));
            }
            Some(flag) if flag != required => return Ok(false),
            Some(_) => {}
        }
    }

    if cutoff.is_clear_all() {
        return Ok(true);
    }

    match candidate.created_at {
        Some(created) => Ok(cutoff.includes(created)),
        None => Err(SweepError::malformed(
            spec,
            format!("'{}' has no creation time", candidate.name),
        )),
    }
}
