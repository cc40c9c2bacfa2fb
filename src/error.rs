//! Error taxonomy.
//!
//! [`RequestError`] covers everything that can go wrong while serving one
//! connection; each one is turned into a response and never reaches the
//! accept loop. [`ServerError`] covers lifecycle failures reported to the
//! caller of `start()`.

use std::net::SocketAddr;

use thiserror::Error;

use crate::http::parser::ParseError;
use crate::http::response::StatusCode;

/// Category of a per-connection failure. Error listeners are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    VersionNotSupported,
    LengthRequired,
    RequestTimeout,
    /// A handler returned an error or panicked.
    Handler,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BadRequest,
            ErrorKind::VersionNotSupported => StatusCode::HttpVersionNotSupported,
            ErrorKind::LengthRequired => StatusCode::LengthRequired,
            ErrorKind::RequestTimeout => StatusCode::RequestTimeout,
            ErrorKind::Handler | ErrorKind::Internal => StatusCode::InternalServerError,
        }
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("timed out waiting for request data")]
    Timeout,
    #[error("handler failed: {0:#}")]
    Handler(anyhow::Error),
    #[error("connection I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Parse(ParseError::UnsupportedVersion(_)) => ErrorKind::VersionNotSupported,
            RequestError::Parse(ParseError::InvalidContentLength | ParseError::LengthRequired(_)) => {
                ErrorKind::LengthRequired
            }
            RequestError::Parse(ParseError::Incomplete) => ErrorKind::Internal,
            RequestError::Parse(_) => ErrorKind::BadRequest,
            RequestError::Timeout => ErrorKind::RequestTimeout,
            RequestError::Handler(_) => ErrorKind::Handler,
            RequestError::Io(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0:#}")]
    Config(anyhow::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
