//! MCP server implementation for Canvas LMS.
//!
//! Implements the JSON-RPC 2.0 methods an MCP client uses to discover and
//! call tools, plus request cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use canvas_lms_client::{CanvasClient, CanvasError, CancellationToken, ConfigError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ToolError, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
use crate::metrics::{record_tool_call, OUTCOME_OK};
use crate::schema::tool_definitions;
use crate::tools::{call_tool, TOOL_NAMES};
use crate::ToolResponse;

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID; absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Build a request with an id.
    #[must_use]
    pub fn new(id: Value, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Build a notification (no id, no response).
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Whether the sender expects no response.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Decode one framed message.
    ///
    /// # Errors
    ///
    /// A ready-to-send parse error (`-32700`) for malformed JSON, or an
    /// invalid request error (`-32600`) for JSON that is not a 2.0 request object.
    pub fn from_slice(raw: &[u8]) -> Result<Self, JsonRpcResponse> {
        let value: Value = serde_json::from_slice(raw).map_err(|e| {
            JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {e}"))
        })?;
        Self::from_value(value)
    }

    /// Interpret an already-parsed JSON value as a request.
    ///
    /// # Errors
    ///
    /// An invalid request error (`-32600`) if `value` is not a 2.0 request object.
    pub fn from_value(value: Value) -> Result<Self, JsonRpcResponse> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: Self = serde_json::from_value(value).map_err(|e| {
            JsonRpcResponse::error(id.clone(), INVALID_REQUEST, format!("Invalid request: {e}"))
        })?;
        if request.jsonrpc != "2.0" {
            return Err(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: unsupported jsonrpc version {:?}", request.jsonrpc),
            ));
        }
        Ok(request)
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request ID (matches request).
    pub id: Value,
    /// Result (on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    /// Create an error response carrying structured data.
    #[must_use]
    pub fn error_with_data(
        id: Value,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Response for a failed tool call.
    #[must_use]
    pub fn tool_error(id: Value, error: &ToolError) -> Self {
        Self::error_with_data(
            id,
            error.json_rpc_code(),
            error.message.clone(),
            serde_json::to_value(error).ok(),
        )
    }
}

/// Session scope for callers that do not name one.
pub const DEFAULT_SCOPE: &str = "";

type CallKey = (String, String);

/// Cancellation tokens of running tool calls.
///
/// Keyed by session scope and request id. Each call holds its own slot so
/// two calls sharing an id never evict each other's token.
#[derive(Default)]
struct InFlight {
    next: AtomicU64,
    calls: Mutex<HashMap<CallKey, Vec<(u64, CancellationToken)>>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashMap<CallKey, Vec<(u64, CancellationToken)>>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(self: &Arc<Self>, key: CallKey, token: CancellationToken) -> InFlightGuard {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        self.lock().entry(key.clone()).or_default().push((seq, token));
        InFlightGuard {
            in_flight: Arc::clone(self),
            key,
            seq,
        }
    }

    fn tokens(&self, key: &CallKey) -> Vec<CancellationToken> {
        self.lock()
            .get(key)
            .map(|slots| slots.iter().map(|(_, token)| token.clone()).collect())
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }
}

/// Removes one call's cancellation token once the call finishes.
struct InFlightGuard {
    in_flight: Arc<InFlight>,
    key: CallKey,
    seq: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut calls = self.in_flight.lock();
        if let Some(slots) = calls.get_mut(&self.key) {
            slots.retain(|(seq, _)| *seq != self.seq);
            if slots.is_empty() {
                calls.remove(&self.key);
            }
        }
    }
}

/// MCP server for Canvas LMS.
///
/// Holds either a ready client or the reason credentials could not be
/// resolved. An unconfigured server still answers `initialize` and
/// `tools/list`; every tool call fails with a configuration error.
pub struct CanvasLmsMcpServer {
    client: Result<CanvasClient, ConfigError>,
    in_flight: Arc<InFlight>,
}

impl CanvasLmsMcpServer {
    /// Create a server backed by `client`.
    #[must_use]
    pub fn new(client: CanvasClient) -> Self {
        Self::from_result(Ok(client))
    }

    /// Create a server whose tool calls all report `error`.
    #[must_use]
    pub fn unconfigured(error: ConfigError) -> Self {
        Self::from_result(Err(error))
    }

    /// Create a server from the outcome of building a client.
    #[must_use]
    pub fn from_result(client: Result<CanvasClient, ConfigError>) -> Self {
        Self {
            client,
            in_flight: Arc::default(),
        }
    }

    /// Whether tool calls can reach Canvas.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client.is_ok()
    }

    /// Why tool calls cannot reach Canvas, if they cannot.
    #[must_use]
    pub fn configuration_error(&self) -> Option<&ConfigError> {
        self.client.as_ref().err()
    }

    /// Number of tool calls currently running.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Handle a JSON-RPC request in the default session scope.
    ///
    /// Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        self.handle_scoped(DEFAULT_SCOPE, request).await
    }

    /// Handle a JSON-RPC request from the session `scope`.
    ///
    /// A `notifications/cancelled` only reaches calls started in the same scope.
    /// Returns `None` for notifications.
    pub async fn handle_scoped(
        &self,
        scope: &str,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, scope, "MCP request");

        let Some(id) = request.id else {
            self.handle_notification(scope, &request.method, &request.params);
            return None;
        };

        let response = match request.method.as_str() {
            // MCP standard methods
            "initialize" => Self::handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => Self::handle_tools_list(id),
            "tools/call" => self.handle_tools_call(scope, id, request.params).await,

            // Unknown method
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_notification(&self, scope: &str, method: &str, params: &Value) {
        match method {
            "notifications/initialized" => tracing::info!("MCP client initialized"),
            "notifications/cancelled" => {
                let Some(request_id) = params.get("requestId") else {
                    tracing::warn!("cancellation without requestId ignored");
                    return;
                };
                self.cancel_in(scope, request_id);
            }
            _ => tracing::debug!(method, "ignoring notification"),
        }
    }

    /// Cancel in-flight tool calls with this request id in the default scope.
    /// Returns whether any was found.
    pub fn cancel(&self, request_id: &Value) -> bool {
        self.cancel_in(DEFAULT_SCOPE, request_id)
    }

    /// Cancel every in-flight tool call with this request id in `scope`.
    /// Returns whether any was found.
    pub fn cancel_in(&self, scope: &str, request_id: &Value) -> bool {
        let tokens = self
            .in_flight
            .tokens(&(scope.to_string(), request_id.to_string()));
        if tokens.is_empty() {
            tracing::debug!(request_id = %request_id, scope, "no in-flight call to cancel");
            return false;
        }
        tracing::info!(request_id = %request_id, scope, calls = tokens.len(), "cancelling tool call");
        for token in tokens {
            token.cancel();
        }
        true
    }

    fn handle_initialize(id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": "canvas-lms-mcp",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        )
    }

    fn handle_tools_list(id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": tool_definitions() }))
    }

    async fn handle_tools_call(&self, scope: &str, id: Value, params: Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "tools/call requires a tool name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let started = Instant::now();
        let result = self.run_tool(scope, &id, name, arguments).await;
        let elapsed = started.elapsed().as_secs_f64();

        let response = ToolResponse::from_result(result);
        let label = if TOOL_NAMES.contains(&name) {
            name
        } else {
            "unknown"
        };

        match response.error {
            None => {
                record_tool_call(label, OUTCOME_OK, elapsed);
                tracing::info!(tool = name, elapsed_secs = elapsed, "tool call succeeded");
                let text = serde_json::to_string_pretty(&response.data.unwrap_or_default())
                    .unwrap_or_default();
                JsonRpcResponse::success(
                    id,
                    json!({
                        "content": [{
                            "type": "text",
                            "text": text
                        }]
                    }),
                )
            }
            Some(error) => {
                record_tool_call(label, error.kind.as_str(), elapsed);
                tracing::warn!(
                    tool = name,
                    kind = error.kind.as_str(),
                    elapsed_secs = elapsed,
                    error = %error.message,
                    "tool call failed"
                );
                JsonRpcResponse::tool_error(id, &error)
            }
        }
    }

    async fn run_tool(
        &self,
        scope: &str,
        id: &Value,
        name: &str,
        arguments: Value,
    ) -> Result<Value, CanvasError> {
        let client = self.client.as_ref().map_err(|e| CanvasError::from(e.clone()))?;

        let cancel = CancellationToken::new();
        let _guard = self
            .in_flight
            .register((scope.to_string(), id.to_string()), cancel.clone());

        call_tool(client, name, arguments, &cancel).await
    }
}
