use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::RequestError;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::routing::Router;

/// Serves exactly one request on an accepted socket, then closes it.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    read_timeout: Duration,
    router: Arc<Router>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Box<Request>),
    Writing(ResponseWriter),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, router: Arc<Router>, read_timeout: Duration) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(4096),
            read_timeout,
            router,
            state: ConnectionState::Reading,
        }
    }

    /// Drives the connection to completion. Every failure is logged and,
    /// where the client is still there, answered with an error response.
    pub async fn run(mut self) {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await {
                    Ok(Some(request)) => {
                        self.state = ConnectionState::Processing(Box::new(request));
                    }
                    Ok(None) => {
                        tracing::debug!(peer = %self.peer, "connection closed before a request was sent");
                    }
                    Err(err) => {
                        tracing::warn!(peer = %self.peer, error = %err, "rejecting request");
                        let response = self.router.translate(&err);
                        self.state = ConnectionState::Writing(ResponseWriter::new(&response, false));
                    }
                },

                ConnectionState::Processing(request) => {
                    let head_only = request.method == Method::HEAD;
                    let response = self.dispatch(*request).await;
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response, head_only));
                }

                ConnectionState::Writing(mut writer) => {
                    if let Err(e) = writer.write_to_stream(&mut self.stream).await {
                        tracing::warn!(peer = %self.peer, error = %e, "failed to write response");
                    }
                }

                ConnectionState::Closed => break,
            }
        }

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(peer = %self.peer, error = %e, "socket shutdown failed");
        }
    }

    /// Runs the router on the blocking pool. Handlers and static file
    /// lookups do synchronous I/O and must not hold a runtime thread.
    async fn dispatch(&self, request: Request) -> Response {
        let router = self.router.clone();
        match tokio::task::spawn_blocking(move || router.dispatch(request)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(peer = %self.peer, error = %e, "dispatch task failed");
                Response::internal_error()
            }
        }
    }

    /// Reads until one full request is buffered. `Ok(None)` means the client
    /// hung up without sending anything.
    pub async fn read_request(&mut self) -> Result<Option<Request>, RequestError> {
        loop {
            // Try parsing whatever we already have
            if !self.buffer.is_empty() {
                match parse_http_request(&self.buffer, self.peer) {
                    Ok((request, consumed)) => {
                        self.buffer.advance(consumed);
                        return Ok(Some(request));
                    }
                    Err(ParseError::Incomplete) => {}
                    Err(e) => return Err(e.into()),
                }
            }

            // each read gets a fresh timeout window
            let n = match timeout(self.read_timeout, self.stream.read_buf(&mut self.buffer)).await {
                Ok(read) => read?,
                Err(_) => return Err(RequestError::Timeout),
            };

            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ParseError::Malformed("connection closed mid-request").into());
            }
        }
    }
}
