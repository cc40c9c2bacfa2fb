use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::parser::PROTOCOL;
use crate::http::response::{Response, ResponseBody};

/// Value of the `Server` header.
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Chunk size used when streaming file bodies.
pub const FILE_CHUNK_SIZE: usize = 8192;

/// Serializes the status line and header block, including the blank line.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);

    // Status line
    let status_line = format!("{} {}\r\n", PROTOCOL, resp.status());
    buf.extend_from_slice(status_line.as_bytes());

    let mut push = |name: &str, value: &str| {
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    };

    push("Server", SERVER_NAME);
    push("Content-Type", resp.content_type());
    push("Content-Length", &resp.content_length().to_string());
    push("Connection", "close");

    for (name, value) in resp.cookies() {
        push("Set-Cookie", &format!("{name}={value}"));
    }

    for (name, value) in resp.headers() {
        push(name, value);
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

enum PendingBody {
    None,
    Bytes(Vec<u8>),
    File(PathBuf),
}

pub struct ResponseWriter {
    head: Vec<u8>,
    body: PendingBody,
}

impl ResponseWriter {
    /// Prepares `response` for writing. With `head_only` the body is dropped
    /// while Content-Length still reports its real size (HEAD requests).
    pub fn new(response: &Response, head_only: bool) -> Self {
        let body = match (head_only, response.body()) {
            (true, _) => PendingBody::None,
            (false, ResponseBody::Bytes(bytes)) => PendingBody::Bytes(bytes.clone()),
            (false, ResponseBody::File(path)) => PendingBody::File(path.clone()),
        };

        Self {
            head: serialize_head(response),
            body,
        }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.head).await?;

        match &self.body {
            PendingBody::None => {}
            PendingBody::Bytes(bytes) => stream.write_all(bytes).await?,
            PendingBody::File(path) => stream_file(path, stream).await?,
        }

        stream.flush().await
    }
}

/// Copies a file to `stream` chunk by chunk, flushing after each chunk.
async fn stream_file<W>(path: &Path, stream: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut file = File::open(path).await?;
    let mut chunk = vec![0u8; FILE_CHUNK_SIZE];

    loop {
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        stream.write_all(&chunk[..n]).await?;
        stream.flush().await?;
    }

    Ok(())
}

/// Serializes a response to bytes in one go. Used by tests and tooling.
pub async fn write_response<W>(stream: &mut W, response: &Response, head_only: bool) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    ResponseWriter::new(response, head_only)
        .write_to_stream(stream)
        .await
}
