//! Operating system descriptor.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Host;

/// Bound for each `uname` query.
pub const UNAME_TIMEOUT: Duration = Duration::from_secs(2);

const UNKNOWN: &str = "unknown";

/// Snapshot of the host operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsDescriptor {
    /// OS family, e.g. `Linux` or `Darwin`.
    pub system: String,
    /// Kernel release, e.g. `6.8.0-45-generic`.
    pub release: String,
    /// Kernel build string.
    pub version: String,
    /// Machine architecture, e.g. `x86_64`.
    pub machine: String,
    pub processor: String,
}

impl OsDescriptor {
    /// Sample the descriptor from the host.
    ///
    /// Each field comes from one `uname` flag. Fields that cannot be read fall
    /// back to compile-time values where there is one, otherwise `unknown`.
    pub async fn sample<H: Host>(host: &H) -> Self {
        let system = uname(host, "-s").await.unwrap_or_else(fallback_system);
        let release = uname(host, "-r").await.unwrap_or_else(|| UNKNOWN.to_string());
        let version = uname(host, "-v").await.unwrap_or_else(|| UNKNOWN.to_string());
        let machine = uname(host, "-m")
            .await
            .unwrap_or_else(|| env::consts::ARCH.to_string());
        // GNU uname prints "unknown" for -p on most Linux systems.
        let processor = uname(host, "-p")
            .await
            .filter(|p| p != UNKNOWN)
            .unwrap_or_else(|| machine.clone());

        Self {
            system,
            release,
            version,
            machine,
            processor,
        }
    }

    /// One-line summary, e.g. `Linux 6.8.0`.
    pub fn summary(&self) -> String {
        format!("{} {}", self.system, self.release)
    }
}

impl std::fmt::Display for OsDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "system: {}", self.system)?;
        writeln!(f, "release: {}", self.release)?;
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "machine: {}", self.machine)?;
        write!(f, "processor: {}", self.processor)
    }
}

async fn uname<H: Host>(host: &H, flag: &str) -> Option<String> {
    let output = host.run("uname", &[flag], UNAME_TIMEOUT).await.ok()?;
    if !output.success() {
        return None;
    }
    let value = output.stdout.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

fn fallback_system() -> String {
    match env::consts::OS {
        "macos" => "Darwin".to_string(),
        "linux" => "Linux".to_string(),
        "windows" => "Windows".to_string(),
        other => other.to_string(),
    }
}
