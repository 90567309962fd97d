//! Line-delimited JSON-RPC over a byte stream (normally stdin/stdout).
//!
//! Each incoming line is one message. Requests run on their own tasks so a
//! slow Canvas call never blocks a later `notifications/cancelled`; every
//! response goes through a single writer so frames never interleave.

use std::io;
use std::sync::Arc;

use canvas_lms_mcp::{CanvasLmsMcpServer, JsonRpcRequest, JsonRpcResponse};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

const RESPONSE_QUEUE: usize = 64;

/// Serve until `reader` reaches end of input and every started request has answered.
///
/// # Errors
///
/// Returns the first I/O error from reading or writing.
pub async fn serve<R, W>(server: Arc<CanvasLmsMcpServer>, reader: R, writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_QUEUE);
    let (read, write) = tokio::join!(
        read_requests(server, reader, tx),
        write_responses(rx, writer)
    );
    read.and(write)
}

async fn read_requests<R>(
    server: Arc<CanvasLmsMcpServer>,
    reader: R,
    tx: mpsc::Sender<JsonRpcResponse>,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request = match JsonRpcRequest::from_slice(line.as_bytes()) {
            Ok(request) => request,
            Err(response) => {
                tracing::warn!("rejected malformed message");
                if tx.send(response).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let server = Arc::clone(&server);
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = server.handle_request(request).await {
                // The writer only goes away after an I/O error, which serve reports.
                let _ = tx.send(response).await;
            }
        });
    }
    tracing::info!("input closed");
    Ok(())
}

async fn write_responses<W>(
    mut rx: mpsc::Receiver<JsonRpcResponse>,
    mut writer: W,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut frame = serde_json::to_vec(&response).map_err(io::Error::other)?;
        frame.push(b'\n');
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }
    Ok(())
}
