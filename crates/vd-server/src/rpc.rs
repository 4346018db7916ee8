//! JSON-RPC 2.0 boundary for the document service.
//!
//! One request (or batch array) per line in, one response (or array) per
//! line out. Notifications (requests without an `id`) are executed but get
//! no response.
//!
//! Methods:
//! - `document.get` with params `{ "id"?: string }` or `[id?]`; the id
//!   defaults to `"main"`.
//! - `document.save` with params `{ id, store, updatedAt? }` or `[doc]`.

use crate::service::DocumentService;
use serde::Serialize;
use serde_json::{Value, json};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use vd_core::{DEFAULT_DOCUMENT_ID, SyncError};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

pub const METHOD_GET: &str = "document.get";
pub const METHOD_SAVE: &str = "document.save";

// ─── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<SyncError> for RpcError {
    fn from(err: SyncError) -> Self {
        match &err {
            SyncError::Validation(v) => RpcError {
                code: INVALID_PARAMS,
                message: err.to_string(),
                data: Some(json!({ "field": v.field })),
            },
            _ => RpcError::new(INTERNAL_ERROR, err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

// ─── Dispatch ────────────────────────────────────────────────────────────

/// Handle one input line. Returns the serialized response line, or `None`
/// when nothing needs answering (only notifications).
pub fn handle_line(service: &DocumentService, line: &str) -> Option<String> {
    let message: Value = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("unparseable request: {e}");
            let response = Response::err(Value::Null, RpcError::new(PARSE_ERROR, e.to_string()));
            return encode(&response);
        }
    };

    match message {
        Value::Array(batch) if batch.is_empty() => encode(&Response::err(
            Value::Null,
            RpcError::new(INVALID_REQUEST, "empty batch"),
        )),
        Value::Array(batch) => {
            let responses: Vec<Response> = batch
                .into_iter()
                .filter_map(|request| handle_request(service, request))
                .collect();
            if responses.is_empty() { None } else { encode(&responses) }
        }
        request => handle_request(service, request).and_then(|r| encode(&r)),
    }
}

fn encode<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(line) => Some(line),
        Err(e) => {
            log::error!("failed to encode response: {e}");
            None
        }
    }
}

/// Handle a single request object.
pub fn handle_request(service: &DocumentService, request: Value) -> Option<Response> {
    let Value::Object(mut request) = request else {
        return Some(Response::err(
            Value::Null,
            RpcError::new(INVALID_REQUEST, "request must be an object"),
        ));
    };

    let id = request.remove("id");
    let reply = |outcome: Result<Value, RpcError>| {
        let id = id.clone()?;
        Some(match outcome {
            Ok(result) => Response::ok(id, result),
            Err(error) => Response::err(id, error),
        })
    };

    if request.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        let error = RpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\"");
        return Some(Response::err(id.clone().unwrap_or(Value::Null), error));
    }
    let Some(Value::String(method)) = request.remove("method") else {
        let error = RpcError::new(INVALID_REQUEST, "method must be a string");
        return Some(Response::err(id.clone().unwrap_or(Value::Null), error));
    };
    let params = request.remove("params");

    log::debug!("{method} (id {})", id.as_ref().unwrap_or(&Value::Null));
    reply(call(service, &method, params))
}

fn call(service: &DocumentService, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
    match method {
        METHOD_GET => {
            let id = get_id(params)?;
            let doc = service.get_document(&id)?;
            to_value(&doc)
        }
        METHOD_SAVE => {
            let payload = match params {
                Some(Value::Array(mut args)) if args.len() == 1 => args.remove(0),
                Some(payload @ Value::Object(_)) => payload,
                _ => return Err(RpcError::new(INVALID_PARAMS, "expected a document")),
            };
            let ack = service.save_json(payload)?;
            to_value(&ack)
        }
        other => Err(RpcError::new(METHOD_NOT_FOUND, format!("unknown method {other}"))),
    }
}

fn get_id(params: Option<Value>) -> Result<String, RpcError> {
    let id = match params {
        None | Some(Value::Null) => None,
        Some(Value::Object(mut map)) => map.remove("id"),
        Some(Value::Array(mut args)) if args.len() <= 1 => args.pop(),
        Some(_) => return Err(RpcError::new(INVALID_PARAMS, "expected { id } or [id]")),
    };
    match id {
        None | Some(Value::Null) => Ok(DEFAULT_DOCUMENT_ID.to_string()),
        Some(Value::String(id)) => Ok(id),
        Some(_) => Err(RpcError::new(INVALID_PARAMS, "id must be a string")),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
}

// ─── Transport ───────────────────────────────────────────────────────────

/// Serve requests from `reader` until EOF, writing responses to `writer`.
///
/// Each line runs on the blocking pool, so a slow store does not hold up
/// reading. Responses to separate lines may arrive out of order; callers
/// match them by id.
pub async fn serve<R, W>(service: Arc<DocumentService>, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let service = service.clone();
                let out_tx = out_tx.clone();
                tasks.spawn_blocking(move || {
                    if let Some(response) = handle_line(&service, &line) {
                        let _ = out_tx.send(response);
                    }
                });
            }
            Some(response) = out_rx.recv() => write_line(&mut writer, &response).await?,
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    log::error!("request task failed: {e}");
                }
            }
        }
    }

    drop(out_tx);
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            log::error!("request task failed: {e}");
        }
    }
    while let Some(response) = out_rx.recv().await {
        write_line(&mut writer, &response).await?;
    }
    writer.flush().await
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
