//! Host environment access for capbroker.
//!
//! Discovery and dispatch never touch the operating system directly. They go
//! through the [`Host`] trait, which offers two primitives:
//!
//! - [`Host::which`]: is an executable present on the search path?
//! - [`Host::run`]: run a command, capture its output, enforce a timeout.
//!
//! [`SystemHost`] implements both against the real machine. Tests substitute
//! scripted hosts.

mod error;
mod os;
pub mod path;
mod system;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

pub use error::{HostError, Result};
pub use os::{OsDescriptor, UNAME_TIMEOUT};
pub use system::SystemHost;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// First line of stdout with surrounding whitespace removed.
    pub fn first_line(&self) -> &str {
        self.stdout.trim().lines().next().unwrap_or("").trim()
    }
}

/// Access to executables on the host.
///
/// Every call to [`Host::run`] is attempted exactly once; callers decide what
/// a failure means.
pub trait Host: Send + Sync {
    /// Resolve an executable name on the search path.
    fn which(&self, name: &str) -> Option<PathBuf>;

    /// Run `program` with `args`, killing it if it outlives `timeout`.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = Result<ExecOutput>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_skips_leading_blank_lines() {
        let output = ExecOutput {
            exit_code: 0,
            stdout: "\n  git version 2.43.0  \nsecond\n".into(),
            stderr: String::new(),
        };
        assert_eq!(output.first_line(), "git version 2.43.0");
    }

    #[test]
    fn first_line_of_empty_output() {
        assert_eq!(ExecOutput::default().first_line(), "");
    }
}
