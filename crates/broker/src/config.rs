//! Timeout configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds for external calls, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// `<tool> --version` during discovery.
    pub version_probe_secs: u64,
    /// `git rev-parse` during discovery and `git status` on execution.
    pub repository_probe_secs: u64,
    /// Tool re-invocation on execution.
    pub invoke_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            version_probe_secs: 2,
            repository_probe_secs: 2,
            invoke_secs: 5,
        }
    }
}

impl Timeouts {
    pub fn version_probe(&self) -> Duration {
        Duration::from_secs(self.version_probe_secs)
    }

    pub fn repository_probe(&self) -> Duration {
        Duration::from_secs(self.repository_probe_secs)
    }

    pub fn invoke(&self) -> Duration {
        Duration::from_secs(self.invoke_secs)
    }
}
