//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No endpoint is registered under the requested id.
    #[error("endpoint '{id}' not found. Run 'capbroker list' to see available endpoints")]
    EndpointNotFound { id: String },

    /// The endpoint ran but reported failure.
    #[error("execution of '{id}' failed: {message}")]
    ExecutionFailed { id: String, message: String },

    /// `--params` or `-p` could not be turned into a parameter bag.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An error occurred in the dispatch layer.
    #[error(transparent)]
    Dispatch(broker::DispatchError),

    /// The RPC server stopped on a transport error.
    #[error(transparent)]
    Rpc(#[from] rpc::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<broker::DispatchError> for Error {
    fn from(err: broker::DispatchError) -> Self {
        match err {
            broker::DispatchError::NotFound { id } => Error::EndpointNotFound { id },
            other => Error::Dispatch(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
