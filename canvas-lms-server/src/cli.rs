//! Command-line arguments and startup wiring for the `canvas-lms-mcp` binary.

use std::time::Duration;

use canvas_lms_client::{CanvasClient, ClientOptions, CredentialResolver};
use canvas_lms_mcp::CanvasLmsMcpServer;
use clap::{Parser, ValueEnum};

use crate::DEFAULT_PORT;

/// How MCP messages reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Line-delimited JSON-RPC on stdin/stdout.
    Stdio,
    /// `POST /mcp` on 127.0.0.1.
    Http,
}

/// Command-line arguments for canvas-lms-mcp.
#[derive(Debug, Clone, Parser)]
#[command(name = "canvas-lms-mcp")]
#[command(about = "MCP server for managing Canvas LMS courses, sections, modules and pages")]
#[command(version)]
pub struct CliArgs {
    /// Message transport
    #[arg(long, value_enum, default_value = "stdio")]
    pub transport: Transport,

    /// HTTP port (http transport only)
    #[arg(long, env = "CANVAS_MCP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Per-request timeout for Canvas calls, in seconds
    #[arg(
        long,
        env = "CANVAS_TIMEOUT_SECS",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Canvas client options for these arguments.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            ..ClientOptions::default()
        }
    }
}

/// Build the MCP server from whatever credentials `resolver` finds.
///
/// Missing or invalid credentials are logged with setup instructions and the
/// server starts unconfigured: discovery still works, tool calls report the
/// configuration error and HTTP readiness fails.
#[must_use]
pub fn build_server(resolver: &CredentialResolver, options: &ClientOptions) -> CanvasLmsMcpServer {
    let client = resolver
        .resolve()
        .and_then(|credentials| {
            tracing::info!(base_url = %credentials.base_url(), "Canvas credentials resolved");
            CanvasClient::with_options(credentials, options)
        })
        .inspect_err(|err| {
            tracing::error!(
                search_dirs = ?resolver.search_dirs(),
                "Canvas credentials unavailable, tool calls will fail until fixed: {err}"
            );
        });
    CanvasLmsMcpServer::from_result(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["canvas-lms-mcp"]).expect("defaults parse");
        assert_eq!(args.transport, Transport::Stdio);
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.client_options().timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(CliArgs::try_parse_from(["canvas-lms-mcp", "--timeout-secs", "0"]).is_err());

        let args = CliArgs::try_parse_from(["canvas-lms-mcp", "--timeout-secs", "1"])
            .expect("one second is allowed");
        assert_eq!(args.client_options().timeout, Duration::from_secs(1));
    }

    #[test]
    fn http_transport_and_port() {
        let args =
            CliArgs::try_parse_from(["canvas-lms-mcp", "--transport", "http", "--port", "8123"])
                .expect("parse");
        assert_eq!(args.transport, Transport::Http);
        assert_eq!(args.port, 8123);
    }

    #[test]
    fn missing_credentials_start_unconfigured() {
        let server = build_server(&CredentialResolver::new(), &ClientOptions::default());
        assert!(!server.is_configured());
        let message = server.configuration_error().expect("error").to_string();
        assert!(message.contains("CANVAS_API_TOKEN"));
    }

    #[test]
    fn resolved_credentials_start_configured() {
        let resolver = CredentialResolver::new()
            .with_env("CANVAS_API_URL", "https://canvas.example.edu/api/v1")
            .with_env("CANVAS_API_TOKEN", "token");
        let server = build_server(&resolver, &ClientOptions::default());
        assert!(server.is_configured());
    }
}
