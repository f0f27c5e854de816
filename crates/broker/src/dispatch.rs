//! Execution dispatch.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use host::{Host, HostError, OsDescriptor};
use registry::{Endpoint, EndpointKind, Registry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::panic_message;
use crate::samples::SampleOp;
use crate::{DispatchError, ExecError, Parameters, Result, Timeouts};

/// Uniform outcome of one execution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ExecutionResult {
    pub fn ok(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            output: Some(output.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

impl From<ExecError> for ExecutionResult {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Validation(message) => Self::failed(message),
            ExecError::Host(e @ HostError::Timeout { .. }) => {
                Self::failed(format!("Execution timed out: {e}"))
            }
            ExecError::Host(e) => Self::failed(format!("Error executing endpoint: {e}")),
            ExecError::Panic(message) => Self::failed(format!("Error executing endpoint: {message}")),
        }
    }
}

/// Routes execution requests to a strategy chosen by endpoint kind.
pub struct Dispatcher<H> {
    host: Arc<H>,
    registry: Arc<Registry>,
    timeouts: Timeouts,
}

impl<H: Host> Dispatcher<H> {
    pub fn new(host: Arc<H>, registry: Arc<Registry>, timeouts: Timeouts) -> Self {
        Self {
            host,
            registry,
            timeouts,
        }
    }

    /// Execute the endpoint registered under `id`.
    ///
    /// A missing parameter bag is treated as empty. Only an unknown id is
    /// returned as an error; strategy failures and panics become a failed
    /// [`ExecutionResult`].
    pub async fn execute(&self, id: &str, parameters: Option<Parameters>) -> Result<ExecutionResult> {
        let endpoint = self
            .registry
            .get(id)
            .ok_or_else(|| DispatchError::NotFound { id: id.to_string() })?;
        let parameters = parameters.unwrap_or_default();

        debug!(endpoint = %endpoint.id, kind = ?endpoint.kind, "dispatching");
        let result = AssertUnwindSafe(self.run_strategy(&endpoint, &parameters))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ExecError::Panic(panic_message(panic.as_ref()))))
            .unwrap_or_else(ExecutionResult::from);

        if result.success {
            info!(endpoint = %endpoint.id, "execution succeeded");
        } else {
            warn!(endpoint = %endpoint.id, message = %result.message, "execution failed");
        }
        Ok(result)
    }

    async fn run_strategy(
        &self,
        endpoint: &Endpoint,
        parameters: &Parameters,
    ) -> std::result::Result<ExecutionResult, ExecError> {
        match &endpoint.kind {
            EndpointKind::Sample => match SampleOp::from_id(&endpoint.id) {
                Some(op) => op.run(parameters).await,
                None => Ok(ExecutionResult::failed(format!(
                    "Unknown sample operation: {}",
                    endpoint.id
                ))),
            },
            EndpointKind::Tool { command } => self.invoke_tool(endpoint, command).await,
            EndpointKind::SystemInfo => {
                let descriptor = OsDescriptor::sample(self.host.as_ref()).await;
                Ok(ExecutionResult::ok(
                    "System information retrieved",
                    descriptor.to_string(),
                ))
            }
            EndpointKind::Repository => self.repository_status().await,
            EndpointKind::Other => Ok(ExecutionResult::ok(
                format!("Endpoint {} executed", endpoint.name),
                format!("Endpoint ID: {}", endpoint.id),
            )),
        }
    }

    /// Re-invoke a tool with the fixed `--version` argument.
    async fn invoke_tool(
        &self,
        endpoint: &Endpoint,
        command: &str,
    ) -> std::result::Result<ExecutionResult, ExecError> {
        let output = self
            .host
            .run(command, &["--version"], self.timeouts.invoke())
            .await?;
        if output.success() {
            Ok(ExecutionResult::ok(
                format!("Successfully executed {}", endpoint.name),
                output.stdout,
            ))
        } else {
            Ok(ExecutionResult::failed(format!("Execution failed: {}", output.stderr.trim()))
                .with_output(output.stderr))
        }
    }

    async fn repository_status(&self) -> std::result::Result<ExecutionResult, ExecError> {
        let output = self
            .host
            .run("git", &["status", "--short"], self.timeouts.repository_probe())
            .await?;
        if !output.success() {
            return Ok(ExecutionResult::failed(format!(
                "Execution failed: {}",
                output.stderr.trim()
            ))
            .with_output(output.stderr));
        }

        let status = if output.stdout.trim().is_empty() {
            "No changes".to_string()
        } else {
            output.stdout
        };
        Ok(ExecutionResult::ok("Git status retrieved", status))
    }
}
