//! Host implementation backed by the real operating system.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::{ExecOutput, Host, HostError, Result, path};

/// Runs commands directly on the machine, without isolation.
#[derive(Debug, Clone, Default)]
pub struct SystemHost {
    search_path: Option<OsString>,
}

impl SystemHost {
    /// Look up executables on the process `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up executables in the given directories instead of `PATH`.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl Host for SystemHost {
    fn which(&self, name: &str) -> Option<PathBuf> {
        match &self.search_path {
            Some(search_path) => path::find_in(search_path, name),
            None => path::find_on_path(name),
        }
    }

    async fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<ExecOutput> {
        let command_line = display_command(program, args);
        debug!(command = %command_line, timeout_ms = timeout.as_millis() as u64, "running command");

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(result) => result.map_err(|source| HostError::Spawn {
                command: command_line.clone(),
                source,
            })?,
            Err(_) => {
                return Err(HostError::Timeout {
                    command: command_line,
                    timeout,
                });
            }
        };

        Ok(ExecOutput {
            // -1 when killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

fn display_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const BOUND: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let host = SystemHost::new();
        let output = host.run("echo", &["hello"], BOUND).await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn reports_nonzero_exit() {
        let host = SystemHost::new();
        let output = host.run("sh", &["-c", "echo oops >&2; exit 3"], BOUND).await.unwrap();

        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn missing_command_is_spawn_error() {
        let host = SystemHost::new();
        let err = host
            .run("nonexistent_command_12345", &[], BOUND)
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::Spawn { .. }));
    }

    #[tokio::test]
    async fn enforces_timeout() {
        let host = SystemHost::new();
        let err = host
            .run("sleep", &["10"], Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }

    #[test]
    fn custom_search_path_is_used() {
        let host = SystemHost::with_search_path("/nonexistent-capbroker-dir");
        assert!(host.which("sh").is_none());
    }
}
