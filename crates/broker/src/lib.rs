//! Capability discovery and execution for capbroker.
//!
//! The broker ties three parts together around a shared
//! [`Registry`](registry::Registry):
//!
//! - [`Discovery`] runs an ordered list of probes against a [`Host`](host::Host)
//!   and registers what they find, recording per-probe outcomes in a
//!   [`DiscoveryReport`].
//! - [`Dispatcher`] resolves an endpoint id and runs the strategy for its
//!   kind, normalizing every outcome into an [`ExecutionResult`].
//! - [`Broker`] is the surface transports call: list, health, execute and
//!   refresh.
//!
//! The fourteen built-in [`SampleOp`]s are always available, whatever the
//! host has installed.

mod config;
mod discovery;
mod dispatch;
mod error;
mod samples;
mod service;

#[cfg(test)]
mod testing;

pub use config::Timeouts;
pub use discovery::{
    COMMON_TOOLS, Discovery, DiscoveryReport, KnownTool, NODE_TOOLS, PYTHON_TOOLS, Probe,
    ProbeOutcome, ProbeStatus, ToolSet, UNKNOWN_VERSION,
};
pub use dispatch::{Dispatcher, ExecutionResult};
pub use error::{DispatchError, ExecError, ProbeError, Result};
pub use samples::{SampleOp, catalog};
pub use service::{Broker, Health, RefreshSummary};

/// Caller-supplied named parameters for one execution.
pub type Parameters = serde_json::Map<String, serde_json::Value>;
