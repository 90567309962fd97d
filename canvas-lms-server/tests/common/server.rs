//! Test server harness for integration tests.
//!
//! Spins up the real router on a random localhost port, backed by a
//! wiremock Canvas, and talks to it over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use canvas_lms_client::{CanvasClient, Credentials};
use canvas_lms_mcp::CanvasLmsMcpServer;
use canvas_lms_server::{router, AppState, SESSION_HEADER};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wiremock::MockServer;

/// A running server plus the mock Canvas behind it.
pub struct TestServer {
    addr: SocketAddr,
    /// Mock Canvas the server's client points at.
    pub canvas: MockServer,
    http: reqwest::Client,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server on a random available port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or the server fails to bind.
    pub async fn start() -> Self {
        let canvas = MockServer::start().await;
        let credentials = Credentials::new(&format!("{}/api/v1", canvas.uri()), "test-token")
            .expect("mock URL is valid");
        let client = CanvasClient::new(credentials).expect("client builds");
        let app = router(AppState::new(Arc::new(CanvasLmsMcpServer::new(client))));

        let port = portpicker::pick_unused_port().expect("no available port");
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        Self {
            addr,
            canvas,
            http: reqwest::Client::new(),
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// The MCP endpoint URL.
    pub fn mcp_url(&self) -> String {
        format!("http://{}/mcp", self.addr)
    }

    /// Call a tool and return the JSON-RPC response body.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        self.post_in_session(
            None,
            &json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": { "name": name, "arguments": arguments }
            }),
        )
        .await
        .json()
        .await
        .expect("JSON-RPC body")
    }

    /// POST a JSON-RPC message, tagged with `session` when given.
    pub async fn post_in_session(&self, session: Option<&str>, message: &Value) -> reqwest::Response {
        let mut request = self.http.post(self.mcp_url()).json(message);
        if let Some(session) = session {
            request = request.header(SESSION_HEADER, session);
        }
        request.send().await.expect("server reachable")
    }

    /// Decode the text content of a successful tool call.
    pub fn tool_result(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"]
            .as_str()
            .unwrap_or_else(|| panic!("expected a successful result, got {response}"));
        serde_json::from_str(text).expect("result text is JSON")
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), self.handle).await;
    }
}
