use std::any::Any;

use thiserror::Error;

/// Errors that escape the dispatcher.
///
/// Only an unknown endpoint is reported this way; every other failure is
/// folded into a failed [`ExecutionResult`](crate::ExecutionResult).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("endpoint '{id}' not found")]
    NotFound { id: String },
}

/// Failures inside an execution strategy.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Caller input could not be used (bad JSON, non-numeric parameter, ...).
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Host(#[from] host::HostError),

    #[error("{0}")]
    Panic(String),
}

/// Failures inside a discovery probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Host(#[from] host::HostError),

    #[error(transparent)]
    Registry(#[from] registry::Error),

    #[error("probe panicked: {0}")]
    Panic(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
