//! JSON-RPC 2.0 transport for capbroker.
//!
//! Requests and responses are single-line JSON objects exchanged over a byte
//! stream, normally the process's stdin and stdout.
//!
//! | Method              | Params                  | Result                         |
//! |---------------------|-------------------------|--------------------------------|
//! | `capabilities/list` | `{category?}`           | `{endpoints: [...]}`           |
//! | `health`            |                         | `{status, endpoints_registered}` |
//! | `execute`           | `{id, parameters?}`     | execution result               |
//! | `refresh`           |                         | `{status, endpoints_registered, report}` |
//! | `discovery/report`  |                         | last discovery report or `null` |
//!
//! An unknown endpoint id is answered with error code
//! [`ENDPOINT_NOT_FOUND`]; a failed execution is a normal result with
//! `success: false`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use broker::{Broker, Timeouts};
//! use host::SystemHost;
//!
//! # async fn example() -> rpc::Result<()> {
//! let broker = Arc::new(Broker::new(SystemHost::new(), Timeouts::default()));
//! broker.start().await;
//! rpc::serve(broker, tokio::io::stdin(), tokio::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use protocol::{
    ENDPOINT_NOT_FOUND, ExecuteParams, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListParams, METHOD_NOT_FOUND, PARSE_ERROR,
    RequestId,
};
pub use server::{MAX_REQUEST_SIZE, handle_line, handle_request, serve};
