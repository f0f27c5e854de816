//! Host error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum HostError {
    /// The command could not be started (missing binary, permissions, ...).
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command did not finish within its bound and was killed.
    #[error("'{command}' timed out after {}s", timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },
}

impl HostError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, HostError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
