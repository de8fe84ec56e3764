//! MCP `initialize` handshake over stdio (JSON-RPC 2.0, newline-delimited).
//!
//! The exchange runs as a small state machine nested inside the probe's
//! handshake wait:
//!
//! ```text
//! WaitingForBanner ──first JSON frame──▶ WaitingForInitResponse ──result──▶ Ready
//! ```
//!
//! Anything printed before the first JSON frame (npx install chatter, log
//! lines) is startup noise and is skipped, up to a bound.
//! Reference: <https://spec.modelcontextprotocol.io/>

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

use mcpreg_core::ServerIdentity;

/// Protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Non-JSON lines tolerated before giving up on the server.
const MAX_NOISE_LINES: usize = 50;

const INITIALIZE_ID: u64 = 1;

/// Progress through the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakePhase {
    /// `initialize` sent, no JSON-RPC output seen yet
    WaitingForBanner,
    /// Server is speaking JSON-RPC, waiting for the `initialize` response
    WaitingForInitResponse,
    /// Response received and `notifications/initialized` sent
    Ready,
}

impl std::fmt::Display for HandshakePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::WaitingForBanner => "waiting for banner",
            Self::WaitingForInitResponse => "waiting for initialize response",
            Self::Ready => "ready",
        })
    }
}

/// Errors that end a handshake without a usable response.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("Server closed its output before answering initialize")]
    Closed,

    #[error("Failed to communicate with MCP server: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCP server returned error: code={code}, message={message}")]
    Server { code: i64, message: String },

    #[error("MCP protocol error: {0}")]
    Protocol(String),
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

/// Any JSON-RPC 2.0 frame the server may send.
#[derive(Debug, Deserialize)]
struct JsonRpcFrame {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    protocol_version: String,
    server_info: ServerInfo,
}

#[derive(Debug, Deserialize)]
struct ServerInfo {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

fn initialize_request() -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0",
        id: INITIALIZE_ID,
        method: "initialize",
        params: Some(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": "mcpreg",
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {}
        })),
    }
}

async fn write_line<W: AsyncWrite + Unpin>(stdin: &mut W, value: &impl Serialize) -> Result<(), HandshakeError> {
    let line = serde_json::to_string(value)? + "\n";
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}

fn is_initialize_response(frame: &JsonRpcFrame) -> bool {
    frame.method.is_none()
        && frame.id.as_ref().and_then(Value::as_u64) == Some(INITIALIZE_ID)
        && (frame.result.is_some() || frame.error.is_some())
}

/// Run the `initialize` exchange.
///
/// `phase` is updated as the exchange progresses so a caller racing this
/// future against a timeout can report how far the server got.
pub async fn perform_initialize<W, R>(
    stdin: &mut W,
    stdout: R,
    phase: &watch::Sender<HandshakePhase>,
) -> Result<ServerIdentity, HandshakeError>
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
{
    phase.send_replace(HandshakePhase::WaitingForBanner);
    write_line(stdin, &initialize_request()).await?;

    let mut lines = stdout.lines();
    let mut noise = 0usize;

    let frame = loop {
        let Some(line) = lines.next_line().await? else {
            return Err(HandshakeError::Closed);
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Ok(frame) = serde_json::from_str::<JsonRpcFrame>(trimmed) else {
            noise += 1;
            tracing::debug!(line = trimmed, "Skipping non-JSON-RPC output");
            if noise > MAX_NOISE_LINES {
                return Err(HandshakeError::Protocol(format!(
                    "No JSON-RPC output after {MAX_NOISE_LINES} lines"
                )));
            }
            continue;
        };

        if *phase.borrow() == HandshakePhase::WaitingForBanner {
            phase.send_replace(HandshakePhase::WaitingForInitResponse);
        }

        if is_initialize_response(&frame) {
            break frame;
        }
        tracing::debug!(method = ?frame.method, "Ignoring unrelated JSON-RPC frame");
    };

    if let Some(err) = frame.error {
        return Err(HandshakeError::Server {
            code: err.code,
            message: err.message,
        });
    }

    let result = frame
        .result
        .ok_or_else(|| HandshakeError::Protocol("Missing result in response".to_string()))?;
    let init: InitializeResult = serde_json::from_value(result)?;

    write_line(
        stdin,
        &json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
            "params": {}
        }),
    )
    .await?;
    phase.send_replace(HandshakePhase::Ready);

    Ok(ServerIdentity {
        name: init.server_info.name,
        version: init.server_info.version,
        protocol_version: init.protocol_version,
    })
}
