//! STDIO read loop.
//!
//! Lines are dispatched as soon as they are framed, so a slow call does not
//! hold back parsing of the next one, but responses are written strictly in
//! input order. At end of input, or on a read error, every pending response is
//! still written before the loop returns.

use std::io;

use futures_util::stream::{FuturesOrdered, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::framing::LineFramer;
use super::protocol::RpcResponse;
use super::server::McpServer;

const READ_CHUNK: usize = 8 * 1024;

pub async fn serve<R, W>(server: &McpServer, mut input: R, mut output: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut framer = LineFramer::default();
    let mut pending = FuturesOrdered::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut input_open = true;

    tracing::info!("MCP: stdio transport ready");

    loop {
        tokio::select! {
            read = input.read(&mut chunk), if input_open => {
                let n = match read {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::error!("MCP: stdin read failed: {}", e);
                        drain(&mut pending, &mut output).await?;
                        return Err(e);
                    }
                };
                if n == 0 {
                    input_open = false;
                    if let Some(tail) = framer.finish() {
                        pending.push_back(server.handle_frame(tail));
                    }
                    tracing::debug!(pending = pending.len(), "MCP: end of input");
                } else {
                    for frame in framer.push(&chunk[..n]) {
                        pending.push_back(server.handle_frame(frame));
                    }
                }
            }
            Some(response) = pending.next(), if !pending.is_empty() => {
                if let Some(response) = response {
                    write_frame(&mut output, &response).await?;
                }
            }
            else => break,
        }
    }

    tracing::info!("MCP: input closed, shutting down");
    Ok(())
}

/// Write out whatever is still in flight, in order.
async fn drain<F, W>(pending: &mut FuturesOrdered<F>, output: &mut W) -> io::Result<()>
where
    F: Future<Output = Option<RpcResponse>>,
    W: AsyncWrite + Unpin,
{
    while let Some(response) = pending.next().await {
        if let Some(response) = response {
            write_frame(output, &response).await?;
        }
    }
    Ok(())
}

/// One compact JSON object followed by exactly one `\n`.
pub async fn write_frame<W>(output: &mut W, response: &RpcResponse) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = serde_json::to_vec(response).map_err(io::Error::other)?;
    frame.push(b'\n');
    output.write_all(&frame).await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn frame_is_single_line() {
        let mut out = Vec::new();
        let resp = RpcResponse::success(json!(1), json!({"text": "a\nb"}));
        write_frame(&mut out, &resp).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
    }
}
