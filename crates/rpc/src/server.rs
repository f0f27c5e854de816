//! Line-delimited JSON-RPC server loop.

use std::sync::Arc;

use broker::{Broker, DispatchError};
use host::Host;
use registry::Endpoint;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    ENDPOINT_NOT_FOUND, ExecuteParams, INTERNAL_ERROR, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListParams, RequestId,
};

/// Maximum request size (1MB).
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Pending responses waiting for the writer.
const RESPONSE_BUFFER: usize = 64;

/// Serve requests from `reader` until end of input.
///
/// Each request line is handled on its own task so a slow execution does not
/// hold up the others; responses are written by a single writer task in
/// completion order. Returns once every in-flight request has been answered.
pub async fn serve<H, R, W>(broker: Arc<Broker<H>>, reader: R, writer: W) -> Result<()>
where
    H: Host + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(RESPONSE_BUFFER);
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut reader = BufReader::new(reader);
    let mut in_flight = JoinSet::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let limit = MAX_REQUEST_SIZE as u64 + 1;
        if (&mut reader).take(limit).read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') && buf.len() > MAX_REQUEST_SIZE {
            let size = buf.len() + skip_line(&mut reader).await?;
            warn!(size, "rejecting oversized request");
            let encoded = serde_json::to_string(&too_large(size))?;
            tx.send(encoded).await.map_err(|_| Error::WriterClosed)?;
            continue;
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let broker = broker.clone();
        let tx = tx.clone();
        let line = std::mem::take(&mut buf);
        in_flight.spawn(async move {
            let Some(response) = handle_line(&broker, &line).await else {
                return Ok(());
            };
            let encoded = serde_json::to_string(&response)?;
            tx.send(encoded).await.map_err(|_| Error::WriterClosed)
        });

        // Reap finished tasks without blocking the reader.
        while let Some(joined) = in_flight.try_join_next() {
            log_task_result(joined);
        }
    }

    debug!(pending = in_flight.len(), "input closed, draining requests");
    while let Some(joined) = in_flight.join_next().await {
        log_task_result(joined);
    }
    drop(tx);

    writer_task.await.map_err(|e| Error::Io(std::io::Error::other(e)))??;
    info!("rpc server stopped");
    Ok(())
}

/// Discard input up to and including the next newline, returning the number
/// of bytes dropped before it.
async fn skip_line<R>(reader: &mut R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(skipped);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(skipped + end);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

fn too_large(size: usize) -> JsonRpcResponse {
    JsonRpcResponse::failure(
        None,
        JsonRpcError::invalid_request(format!(
            "request too large: {size} bytes (max {MAX_REQUEST_SIZE})"
        )),
    )
}

fn log_task_result(joined: std::result::Result<Result<()>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "failed to deliver response"),
        Err(e) => warn!(error = %e, "request task aborted"),
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::Receiver<String>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await?;
    Ok(())
}

/// Handle one raw request line.
///
/// Returns `None` for notifications, which are processed but not answered.
/// The size limit applies to the line without its terminator.
pub async fn handle_line<H: Host>(broker: &Broker<H>, line: &[u8]) -> Option<JsonRpcResponse> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.len() > MAX_REQUEST_SIZE {
        return Some(too_large(line.len()));
    }

    let value: Value = match serde_json::from_slice(line) {
        Ok(value) => value,
        Err(e) => return Some(JsonRpcResponse::failure(None, JsonRpcError::parse_error(e))),
    };

    let request = match parse_request(value) {
        Ok(request) => request,
        Err((id, error)) => return Some(JsonRpcResponse::failure(id, error)),
    };

    debug!(method = %request.method, id = ?request.id, "request");
    let result = handle_request(broker, &request).await;
    if request.is_notification() {
        if let Err(e) = result {
            debug!(method = %request.method, error = %e, "notification failed");
        }
        return None;
    }
    Some(JsonRpcResponse::from_result(request.id.flatten(), result))
}

fn parse_request(
    value: Value,
) -> std::result::Result<JsonRpcRequest, (Option<RequestId>, JsonRpcError)> {
    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
    let request: JsonRpcRequest = serde_json::from_value(value)
        .map_err(|e| (id.clone(), JsonRpcError::invalid_request(e)))?;
    if request.jsonrpc != "2.0" {
        return Err((
            id,
            JsonRpcError::invalid_request(format!("unsupported jsonrpc version '{}'", request.jsonrpc)),
        ));
    }
    Ok(request)
}

/// Route a parsed request to the broker.
pub async fn handle_request<H: Host>(
    broker: &Broker<H>,
    request: &JsonRpcRequest,
) -> std::result::Result<Value, JsonRpcError> {
    match request.method.as_str() {
        "capabilities/list" => {
            let params: ListParams = params_or_default(request.params.as_ref())?;
            let endpoints = broker.list_capabilities(params.category.as_deref());
            let endpoints: Vec<&Endpoint> = endpoints.iter().map(|e| e.as_ref()).collect();
            Ok(json!({ "endpoints": endpoints }))
        }
        "health" => to_value(broker.health()),
        "execute" => {
            let params: ExecuteParams = required_params(request.params.as_ref())?;
            match broker.execute(&params.id, params.parameters).await {
                Ok(result) => to_value(result),
                Err(DispatchError::NotFound { id }) => Err(JsonRpcError::new(
                    ENDPOINT_NOT_FOUND,
                    format!("Endpoint not found: {id}"),
                )
                .with_data(json!({ "id": id }))),
                Err(e) => Err(JsonRpcError::new(INTERNAL_ERROR, e.to_string())),
            }
        }
        "refresh" => to_value(broker.refresh().await),
        "discovery/report" => to_value(broker.last_report()),
        other => Err(JsonRpcError::method_not_found(other)),
    }
}

fn params_or_default<T: DeserializeOwned + Default>(
    params: Option<&Value>,
) -> std::result::Result<T, JsonRpcError> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone()).map_err(JsonRpcError::invalid_params),
    }
}

fn required_params<T: DeserializeOwned>(params: Option<&Value>) -> std::result::Result<T, JsonRpcError> {
    let value = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(value.clone()).map_err(JsonRpcError::invalid_params)
}

fn to_value(value: impl Serialize) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}
