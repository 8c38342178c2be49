//! Subprocess execution with a hard timeout

use super::error::{CloudError, CloudResult};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// One CLI invocation: arguments plus per-process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            env: Vec::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Command line rendered for logs and error messages
    pub fn display(&self, program: &Path) -> String {
        let mut line = program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Run `program` and return its stdout.
///
/// A non-zero exit becomes [`CloudError::Failed`] carrying stderr. If the
/// process outlives `timeout` it is killed and [`CloudError::TimedOut`] is
/// returned.
pub async fn run_command(
    program: &Path,
    invocation: &Invocation,
    timeout: Duration,
) -> CloudResult<String> {
    let command_line = invocation.display(program);
    debug!(
        command = %command_line,
        timeout_secs = timeout.as_secs(),
        "Running command"
    );

    let mut command = Command::new(program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &invocation.env {
        command.env(key, value);
    }

    let child = command.spawn().map_err(|source| CloudError::Spawn {
        program: program.display().to_string(),
        source,
    })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(CloudError::Spawn {
                program: program.display().to_string(),
                source,
            });
        }
        Err(_) => {
            warn!(
                command = %command_line,
                timeout_secs = timeout.as_secs(),
                "Command timed out, killing process"
            );
            return Err(CloudError::TimedOut {
                command: command_line,
                timeout,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CloudError::failed(
            command_line,
            output.status.code(),
            stderr,
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_invocation_display() {
        let invocation = Invocation::new(vec!["compute".into(), "-q".into(), "disks".into()])
            .env("CLOUDSDK_BILLING_QUOTA_PROJECT", "p");
        assert_eq!(
            invocation.display(Path::new("gcloud")),
            "gcloud compute -q disks"
        );
        assert_eq!(invocation.env.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_captures_stdout() {
        let invocation = Invocation::new(vec!["-c".into(), "echo hello".into()]);
        let out = run_command(&PathBuf::from("sh"), &invocation, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_passes_env() {
        let invocation =
            Invocation::new(vec!["-c".into(), "echo $JANITOR_TEST_VAR".into()])
                .env("JANITOR_TEST_VAR", "abc");
        let out = run_command(&PathBuf::from("sh"), &invocation, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.trim(), "abc");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_failure_keeps_stderr() {
        let invocation = Invocation::new(vec!["-c".into(), "echo nope >&2; exit 3".into()]);
        let err = run_command(&PathBuf::from("sh"), &invocation, Duration::from_secs(10))
            .await
            .unwrap_err();
        match err {
            CloudError::Failed { status, stderr, .. } => {
                assert_eq!(status, "exit code 3");
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_times_out() {
        let invocation = Invocation::new(vec!["-c".into(), "sleep 5".into()]);
        let err = run_command(&PathBuf::from("sh"), &invocation, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_run_command_missing_binary() {
        let invocation = Invocation::default();
        let err = run_command(
            &PathBuf::from("/nonexistent/gcloud-binary"),
            &invocation,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CloudError::Spawn { .. }));
    }
}
