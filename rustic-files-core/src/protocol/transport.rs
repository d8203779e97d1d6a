use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinSet;
use tracing::{info, warn};

use serde_json::Value;

use crate::error::Result;
use crate::protocol::jsonrpc::{Response, PARSE_ERROR};
use crate::protocol::server::McpServer;

/// Raw byte lines. Partial reads survive a cancelled `next_line`, so it
/// can sit in a `select!` branch.
struct RawLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> RawLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next line without its terminator, or `None` at end of input.
    async fn next_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }
        let mut line = std::mem::take(&mut self.buf);
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

async fn write_response<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Serves line-delimited JSON-RPC until `reader` hits end of input.
///
/// Every request runs as its own task, so responses are written in
/// completion order. In-flight requests are drained before returning.
pub async fn serve_lines<R, W>(server: McpServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = RawLines::new(reader);
    let mut in_flight: JoinSet<Option<Response>> = JoinSet::new();
    let mut reading = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if reading => {
                match line? {
                    Some(bytes) => {
                        let line = match String::from_utf8(bytes) {
                            Ok(line) => line,
                            Err(err) => {
                                warn!("dropping line that is not UTF-8: {err}");
                                let response = Response::err(
                                    Value::Null,
                                    PARSE_ERROR,
                                    format!("parse error: invalid UTF-8: {err}"),
                                );
                                write_response(&mut writer, &response).await?;
                                continue;
                            }
                        };
                        if line.trim().is_empty() {
                            continue;
                        }
                        let server = server.clone();
                        in_flight.spawn(async move { server.handle_line(&line).await });
                    }
                    None => {
                        reading = false;
                        info!(pending = in_flight.len(), "input closed, draining requests");
                    }
                }
            }
            Some(joined) = in_flight.join_next() => {
                match joined {
                    Ok(Some(response)) => write_response(&mut writer, &response).await?,
                    Ok(None) => {}
                    Err(err) => warn!("request task failed: {err}"),
                }
            }
            else => break,
        }
    }

    writer.flush().await?;
    Ok(())
}

/// Serves on stdin/stdout until end of input or Ctrl-C.
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    info!("serving on stdio");

    tokio::select! {
        result = serve_lines(server, reader, writer) => {
            info!("server stopped");
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping server");
            Ok(())
        }
    }
}
