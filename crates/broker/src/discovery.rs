//! Capability discovery.
//!
//! A discovery pass runs a fixed, ordered list of probes. Each probe either
//! contributes endpoints, reports that its capability is absent, or fails.
//! Failures (including panics) are contained to the probe that raised them
//! and recorded in the [`DiscoveryReport`]; later probes always run.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use host::{Host, OsDescriptor};
use registry::{Endpoint, EndpointKind, Registry};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::panic_message;
use crate::{ProbeError, Timeouts, samples};

/// Version string recorded when `<tool> --version` does not succeed.
pub const UNKNOWN_VERSION: &str = "unknown";

/// The probes of a discovery pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    SampleCatalog,
    CommonTools,
    PythonTools,
    NodeTools,
    GitRepository,
    SystemDescriptor,
}

impl Probe {
    pub const ALL: [Probe; 6] = [
        Probe::SampleCatalog,
        Probe::CommonTools,
        Probe::PythonTools,
        Probe::NodeTools,
        Probe::GitRepository,
        Probe::SystemDescriptor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Probe::SampleCatalog => "sample_catalog",
            Probe::CommonTools => "common_tools",
            Probe::PythonTools => "python_tools",
            Probe::NodeTools => "node_tools",
            Probe::GitRepository => "git_repository",
            Probe::SystemDescriptor => "system_descriptor",
        }
    }
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A well-known executable a tool probe looks for.
#[derive(Debug, Clone, Copy)]
pub struct KnownTool {
    pub command: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Allow-list of executables sharing an id prefix and category.
#[derive(Debug, Clone, Copy)]
pub struct ToolSet {
    pub prefix: &'static str,
    pub category: &'static str,
    /// Whether to record `<tool> --version` as a `version` parameter.
    pub query_version: bool,
    pub tools: &'static [KnownTool],
}

const fn tool(command: &'static str, name: &'static str, description: &'static str) -> KnownTool {
    KnownTool {
        command,
        name,
        description,
    }
}

pub const COMMON_TOOLS: ToolSet = ToolSet {
    prefix: "tool_",
    category: "Tools",
    query_version: true,
    tools: &[
        tool("python", "Python", "Python interpreter"),
        tool("node", "Node.js", "Node.js runtime"),
        tool("npm", "NPM", "Node Package Manager"),
        tool("git", "Git", "Git version control"),
        tool("docker", "Docker", "Docker container platform"),
        tool("kubectl", "Kubernetes", "Kubernetes CLI"),
    ],
};

pub const PYTHON_TOOLS: ToolSet = ToolSet {
    prefix: "python_",
    category: "Python Tools",
    query_version: false,
    tools: &[
        tool("pip", "pip", "Python package installer"),
        tool("pipenv", "Pipenv", "Python dependency management"),
        tool("poetry", "Poetry", "Python dependency and package management"),
        tool("black", "Black", "Python code formatter"),
        tool("flake8", "Flake8", "Python linter"),
        tool("pytest", "pytest", "Python testing framework"),
    ],
};

pub const NODE_TOOLS: ToolSet = ToolSet {
    prefix: "node_",
    category: "Node.js Tools",
    query_version: false,
    tools: &[
        tool("yarn", "Yarn", "Yarn package manager"),
        tool("pnpm", "pnpm", "pnpm package manager"),
        tool("npx", "npx", "Execute npm packages"),
        tool("tsc", "TypeScript Compiler", "TypeScript compiler"),
    ],
};

/// What happened to one probe during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeStatus {
    Registered { endpoints: usize },
    /// The capability is not available on this host.
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub probe: Probe,
    #[serde(flatten)]
    pub status: ProbeStatus,
}

/// Per-probe outcomes of one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<ProbeOutcome>,
    /// Endpoints produced by this pass.
    pub endpoints_registered: usize,
}

impl DiscoveryReport {
    pub fn outcome(&self, probe: Probe) -> Option<&ProbeStatus> {
        self.outcomes
            .iter()
            .find(|o| o.probe == probe)
            .map(|o| &o.status)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ProbeStatus::Failed { .. }))
    }
}

enum Found {
    Endpoints(Vec<Endpoint>),
    Absent(String),
}

/// Runs probes against a host and fills a registry.
pub struct Discovery<H> {
    host: Arc<H>,
    registry: Arc<Registry>,
    timeouts: Timeouts,
}

impl<H: Host> Discovery<H> {
    pub fn new(host: Arc<H>, registry: Arc<Registry>, timeouts: Timeouts) -> Self {
        Self {
            host,
            registry,
            timeouts,
        }
    }

    /// Run every probe and register what they find.
    ///
    /// Existing entries are overwritten by id but otherwise kept.
    pub async fn discover_all(&self) -> DiscoveryReport {
        let (endpoints, report) = self.run_probes().await;
        for endpoint in endpoints {
            self.registry.register(endpoint);
        }
        report
    }

    /// Run every probe and replace the registry content with the result.
    ///
    /// Endpoints whose capability disappeared since the last pass are gone
    /// afterwards. The swap is atomic for concurrent readers.
    pub async fn refresh(&self) -> DiscoveryReport {
        let (endpoints, report) = self.run_probes().await;
        self.registry.replace_all(endpoints);
        report
    }

    async fn run_probes(&self) -> (Vec<Endpoint>, DiscoveryReport) {
        let started_at = Utc::now();
        let mut endpoints = Vec::new();
        let mut outcomes = Vec::with_capacity(Probe::ALL.len());

        for probe in Probe::ALL {
            let result = AssertUnwindSafe(self.run_probe(probe))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(ProbeError::Panic(panic_message(panic.as_ref()))));

            let status = match result {
                Ok(Found::Endpoints(found)) => {
                    debug!(probe = %probe, endpoints = found.len(), "probe registered endpoints");
                    let status = ProbeStatus::Registered {
                        endpoints: found.len(),
                    };
                    endpoints.extend(found);
                    status
                }
                Ok(Found::Absent(reason)) => {
                    debug!(probe = %probe, %reason, "probe skipped");
                    ProbeStatus::Skipped { reason }
                }
                Err(e) => {
                    warn!(probe = %probe, error = %e, "probe failed");
                    ProbeStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(ProbeOutcome { probe, status });
        }

        let report = DiscoveryReport {
            started_at,
            outcomes,
            endpoints_registered: endpoints.len(),
        };
        info!(
            endpoints = report.endpoints_registered,
            failed = report.failures().count(),
            "discovery pass complete"
        );
        (endpoints, report)
    }

    async fn run_probe(&self, probe: Probe) -> Result<Found, ProbeError> {
        match probe {
            Probe::SampleCatalog => Ok(Found::Endpoints(samples::catalog(Utc::now())?)),
            Probe::CommonTools => self.probe_tools(&COMMON_TOOLS).await,
            Probe::PythonTools => self.probe_tools(&PYTHON_TOOLS).await,
            Probe::NodeTools => self.probe_tools(&NODE_TOOLS).await,
            Probe::GitRepository => self.probe_git_repository().await,
            Probe::SystemDescriptor => self.probe_system().await,
        }
    }

    async fn probe_tools(&self, set: &ToolSet) -> Result<Found, ProbeError> {
        let discovered_at = Utc::now();
        let mut endpoints = Vec::new();

        for known in set.tools {
            if self.host.which(known.command).is_none() {
                continue;
            }

            let mut endpoint = Endpoint::new(
                format!("{}{}", set.prefix, known.command),
                known.name,
                known.description,
                set.category,
            )?
            .with_kind(EndpointKind::Tool {
                command: known.command.to_string(),
            })
            .with_parameter("command", known.command)
            .discovered_at(discovered_at);

            if set.query_version {
                endpoint = endpoint.with_parameter("version", self.tool_version(known.command).await);
            }
            endpoints.push(endpoint);
        }

        if endpoints.is_empty() {
            let names: Vec<_> = set.tools.iter().map(|t| t.command).collect();
            return Ok(Found::Absent(format!(
                "none of {} found on search path",
                names.join(", ")
            )));
        }
        Ok(Found::Endpoints(endpoints))
    }

    async fn tool_version(&self, command: &str) -> String {
        match self
            .host
            .run(command, &["--version"], self.timeouts.version_probe())
            .await
        {
            Ok(output) if output.success() => output.first_line().to_string(),
            Ok(output) => {
                debug!(command, exit_code = output.exit_code, "version query failed");
                UNKNOWN_VERSION.to_string()
            }
            Err(e) => {
                debug!(command, error = %e, "version query failed");
                UNKNOWN_VERSION.to_string()
            }
        }
    }

    async fn probe_git_repository(&self) -> Result<Found, ProbeError> {
        if self.host.which("git").is_none() {
            return Ok(Found::Absent("git not found on search path".into()));
        }

        let output = self
            .host
            .run(
                "git",
                &["rev-parse", "--is-inside-work-tree"],
                self.timeouts.repository_probe(),
            )
            .await?;
        if !output.success() {
            return Ok(Found::Absent(
                "current directory is not inside a git work tree".into(),
            ));
        }

        let endpoint = Endpoint::new(
            "git_repo",
            "Git Repository",
            "Current directory is a Git repository",
            "Git",
        )?
        .with_kind(EndpointKind::Repository)
        .with_parameter("is_repo", "true");
        Ok(Found::Endpoints(vec![endpoint]))
    }

    async fn probe_system(&self) -> Result<Found, ProbeError> {
        let descriptor = OsDescriptor::sample(self.host.as_ref()).await;
        Ok(Found::Endpoints(vec![system_endpoint(&descriptor)?]))
    }
}

fn system_endpoint(descriptor: &OsDescriptor) -> registry::Result<Endpoint> {
    Ok(Endpoint::new(
        "system_info",
        "System Information",
        format!("System: {}", descriptor.summary()),
        "System",
    )?
    .with_kind(EndpointKind::SystemInfo)
    .with_parameter("system", descriptor.system.as_str())
    .with_parameter("release", descriptor.release.as_str())
    .with_parameter("version", descriptor.version.as_str())
    .with_parameter("machine", descriptor.machine.as_str())
    .with_parameter("processor", descriptor.processor.as_str()))
}
