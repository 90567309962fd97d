//! # Canvas LMS MCP
//!
//! MCP server exposing Canvas LMS course-structure tools.
//! Speaks JSON-RPC over stdio by default; `--transport http` serves it on localhost.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use canvas_lms_client::CredentialResolver;
use canvas_lms_mcp::CanvasLmsMcpServer;
use canvas_lms_server::cli::{build_server, CliArgs, Transport};
use canvas_lms_server::{metrics, router, stdio, AppState};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing on stderr with optional JSON format.
///
/// `RUST_LOG` overrides the level chosen by `-v`.
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info,tower_http=info",
        1 => "debug,hyper=info,reqwest=info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries protocol frames in stdio mode
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let mcp = Arc::new(build_server(
        &CredentialResolver::from_process(),
        &args.client_options(),
    ));

    match args.transport {
        Transport::Stdio => serve_stdio(mcp).await,
        Transport::Http => serve_http(mcp, args.port).await,
    }
}

async fn serve_stdio(mcp: Arc<CanvasLmsMcpServer>) -> anyhow::Result<()> {
    tracing::info!("Canvas LMS MCP server listening on stdio");
    stdio::serve(mcp, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("stdio transport failed")?;
    tracing::info!("Canvas LMS MCP server stopped");
    Ok(())
}

async fn serve_http(mcp: Arc<CanvasLmsMcpServer>, port: u16) -> anyhow::Result<()> {
    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {e}"))?;
    tracing::info!("Prometheus metrics initialized");

    let app = router(AppState::new(mcp).with_metrics(metrics_handle));

    // Bind to localhost only
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Canvas LMS MCP server listening on http://{addr}/mcp");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => {
            tracing::error!("failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    }
}
