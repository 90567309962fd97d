//! Shared harness for tests that talk to a mock Canvas.

#![allow(dead_code)]

use canvas_lms_client::{CanvasClient, CanvasId, Credentials};
use wiremock::MockServer;

/// Token every mock expects in the `Authorization` header.
pub const TOKEN: &str = "integration-token";

/// A mock Canvas plus a client pointed at it.
pub struct MockCanvas {
    pub server: MockServer,
    pub client: CanvasClient,
}

impl MockCanvas {
    /// Start a mock server and build a client for `<server>/api/v1`.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let credentials = Credentials::new(&format!("{}/api/v1", server.uri()), TOKEN)
            .expect("mock server URL is valid");
        let client = CanvasClient::new(credentials).expect("client builds");
        Self { server, client }
    }

    /// Absolute URL of an API path on the mock server.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.server.uri())
    }
}

/// Shorthand for a known-valid id.
pub fn id(raw: u64) -> CanvasId {
    CanvasId::new(raw).expect("positive id")
}
