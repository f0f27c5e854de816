//! RPC server error types.

use thiserror::Error;

/// Errors that stop the server loop.
///
/// Per-request problems never surface here; they are answered with a
/// JSON-RPC error object instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("response writer stopped")]
    WriterClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
