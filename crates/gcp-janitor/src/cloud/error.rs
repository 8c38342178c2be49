//! Cloud transport error classification
//!
//! Every client call fails with a [`CloudError`]. The sweep engine never
//! inspects the variant to make decisions; tolerance is a property of the
//! resource kind, not of the error.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    /// The CLI binary could not be started at all
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The call ran and reported failure
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The call exceeded the per-call timeout and was killed
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },

    /// The call succeeded but its output was not what we expected
    #[error("Failed to parse output of `{command}`: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CloudError {
    /// Build a [`CloudError::Failed`] from an exit code (`None` when killed by a signal)
    pub fn failed(command: impl Into<String>, code: Option<i32>, stderr: impl Into<String>) -> Self {
        let status = match code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        CloudError::Failed {
            command: command.into(),
            status,
            stderr: stderr.into().trim().to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CloudError::TimedOut { .. })
    }

    /// The command line that produced this error
    pub fn command(&self) -> &str {
        match self {
            CloudError::Spawn { program, .. } => program,
            CloudError::Failed { command, .. }
            | CloudError::TimedOut { command, .. }
            | CloudError::Parse { command, .. } => command,
        }
    }
}

pub type CloudResult<T> = Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display_with_exit_code() {
        let err = CloudError::failed("gcloud compute -q disks delete a", Some(1), "boom\n");
        assert_eq!(
            err.to_string(),
            "`gcloud compute -q disks delete a` failed (exit code 1): boom"
        );
    }

    #[test]
    fn test_failed_display_without_exit_code() {
        let err = CloudError::failed("gcloud", None, "");
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_timeout() {
        let err = CloudError::TimedOut {
            command: "gcloud services list".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(err.is_timeout());
        assert_eq!(err.command(), "gcloud services list");
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_parse_error_has_source() {
        let source = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let err = CloudError::Parse {
            command: "gcloud".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_timeout());
    }
}
